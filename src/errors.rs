use std::fmt;

use reqwest::StatusCode;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    Reqwest(reqwest::Error),
    /// A non-authorization HTTP failure, passed through to the caller as-is.
    Http(StatusCode, String),
    /// Authentication failed and could not be recovered by a refresh.
    Auth(String),
    /// The server answered but its envelope reported failure or carried no data.
    Api(String),
    Config(String),
    Token(String),
    NotFound(String),
    Forbidden(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Json(err) => write!(f, "json error: {err}"),
            Error::Reqwest(err) => write!(f, "transport error: {err}"),
            Error::Http(status, body) => write!(f, "http error {status}: {body}"),
            Error::Auth(msg) => write!(f, "authentication failed: {msg}"),
            Error::Api(msg) => write!(f, "api error: {msg}"),
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
            Error::Token(msg) => write!(f, "token error: {msg}"),
            Error::NotFound(what) => write!(f, "{what} not found"),
            Error::Forbidden(msg) => write!(f, "forbidden: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Reqwest(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Reqwest(err)
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::Token(err.to_string())
    }
}
