use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::errors::Error;
use crate::token::TokenPair;
use crate::types::ApiResponse;

pub const REFRESH_PATH: &str = "/auth/refresh-token";

/// Everything needed to (re)submit an API call.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// True once this request has been replayed after a refresh.
    pub fn is_retry(&self) -> bool {
        self.retried
    }

    pub fn into_retry(mut self) -> Self {
        self.retried = true;
        self
    }

    pub fn url(&self, base: &str) -> String {
        let mut url = format!("{base}{}", self.path);
        for (i, (key, value)) in self.query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    access_token: &'a str,
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RefreshResponse {
    Envelope(ApiResponse<TokenPair>),
    Bare(TokenPair),
}

/// Attaches the bearer credential and submits a single request. Never retries.
#[derive(Clone)]
pub struct Dispatcher {
    http_client: Client,
    base_url: String,
    user_agent: String,
}

impl Dispatcher {
    pub fn new(http_client: Client, base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            user_agent: user_agent.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, Error> {
        let url = request.url(&self.base_url);
        let mut builder = self
            .http_client
            .request(request.method.clone(), &url)
            .header("User-Agent", self.user_agent.as_str());
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        debug!(
            method = %request.method,
            path = %request.path,
            status = resp.status().as_u16(),
            retry = request.is_retry(),
            "dispatch"
        );
        Ok(resp)
    }

    /// Exchanges the pair for a new one. Goes straight to the network so a
    /// failing refresh can never trigger another refresh.
    pub async fn refresh(&self, pair: &TokenPair) -> Result<TokenPair, Error> {
        let url = format!("{}{}", self.base_url, REFRESH_PATH);
        let resp = self
            .http_client
            .post(&url)
            .header("User-Agent", self.user_agent.as_str())
            .json(&RefreshRequest {
                access_token: pair.access_token(),
                refresh_token: pair.refresh_token(),
            })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            error!("refresh rejected: status={} body='{}'", status, body);
            return Err(Error::Http(status, body));
        }
        match serde_json::from_str::<RefreshResponse>(&body)? {
            RefreshResponse::Bare(pair) => Ok(pair),
            RefreshResponse::Envelope(envelope) => {
                let message = envelope.message.clone();
                let pair = envelope.into_data()?;
                info!("refresh accepted: message='{}'", message);
                Ok(pair)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_query_values() {
        let request = ApiRequest::get("/problems")
            .query("searchTerm", "x^2 + y^2")
            .query("page", 2);
        assert_eq!(
            request.url("http://localhost/api"),
            "http://localhost/api/problems?searchTerm=x%5E2%20%2B%20y%5E2&page=2"
        );
    }

    #[tokio::test]
    async fn refresh_surfaces_transport_errors() {
        let dispatcher = Dispatcher::new(Client::new(), "http://127.0.0.1:1/api", "test-agent");
        let now = jiff::Timestamp::now();
        let pair = TokenPair::try_new("a1", "r1", now, now + jiff::SignedDuration::from_hours(1)).unwrap();
        assert!(matches!(dispatcher.refresh(&pair).await, Err(Error::Reqwest(_))));
    }

        #[test]
    fn retry_marker_survives_clone() {
        let request = ApiRequest::delete("/solutions/1").into_retry();
        assert!(request.clone().is_retry());
        assert!(!ApiRequest::delete("/solutions/1").is_retry());
    }
}
