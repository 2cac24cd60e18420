use jiff::Timestamp;
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::Error;

const SUBJECT_CLAIMS: &[&str] = &[
    "sub",
    "nameid",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
];
const NAME_CLAIMS: &[&str] = &[
    "unique_name",
    "name",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name",
];

/// Wire form of a token pair as issued by login, register and refresh.
///
/// Accepts both `accessExpiry` and the server's `accessTokenExpiry` spelling.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSnapshot {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(alias = "accessTokenExpiry", with = "crate::types::server_time")]
    pub access_expiry: Timestamp,
    #[serde(alias = "refreshTokenExpiry", with = "crate::types::server_time")]
    pub refresh_expiry: Timestamp,
}

/// Access and refresh credentials that always change together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TokenSnapshot", into = "TokenSnapshot")]
pub struct TokenPair {
    access_token: String,
    refresh_token: String,
    access_expiry: Timestamp,
    refresh_expiry: Timestamp,
}

impl TokenPair {
    pub fn try_new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        access_expiry: Timestamp,
        refresh_expiry: Timestamp,
    ) -> Result<Self, Error> {
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();
        if access_token.trim().is_empty() {
            return Err(Error::Token("access token is empty".into()));
        }
        if refresh_token.trim().is_empty() {
            return Err(Error::Token("refresh token is empty".into()));
        }
        Ok(Self {
            access_token,
            refresh_token,
            access_expiry,
            refresh_expiry,
        })
    }

    pub fn from_snapshot(snapshot: TokenSnapshot) -> Result<Self, Error> {
        let TokenSnapshot {
            access_token,
            refresh_token,
            access_expiry,
            refresh_expiry,
        } = snapshot;
        Self::try_new(access_token, refresh_token, access_expiry, refresh_expiry)
    }

    pub fn to_snapshot(&self) -> TokenSnapshot {
        TokenSnapshot {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            access_expiry: self.access_expiry,
            refresh_expiry: self.refresh_expiry,
        }
    }

    /// Returns the raw access token suitable for Authorization headers.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn access_expiry(&self) -> Timestamp {
        self.access_expiry
    }

    pub fn refresh_expiry(&self) -> Timestamp {
        self.refresh_expiry
    }

    pub fn access_expired(&self, now: Timestamp) -> bool {
        now >= self.access_expiry
    }

    pub fn refresh_expired(&self, now: Timestamp) -> bool {
        now >= self.refresh_expiry
    }

    /// Reads the access token's claims without verifying its signature.
    ///
    /// The client never holds the signing key, so this is only suitable for
    /// display purposes such as knowing which user is signed in.
    pub fn claims(&self) -> Result<AccessClaims, Error> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        let data = jsonwebtoken::decode::<Map<String, Value>>(
            &self.access_token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )?;
        Ok(AccessClaims::from_map(&data.claims))
    }
}

impl TryFrom<TokenSnapshot> for TokenPair {
    type Error = Error;

    fn try_from(snapshot: TokenSnapshot) -> Result<Self, Self::Error> {
        Self::from_snapshot(snapshot)
    }
}

impl From<TokenPair> for TokenSnapshot {
    fn from(pair: TokenPair) -> Self {
        TokenSnapshot {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            access_expiry: pair.access_expiry,
            refresh_expiry: pair.refresh_expiry,
        }
    }
}

/// Identity fields carried in an access token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessClaims {
    pub subject: Option<String>,
    pub username: Option<String>,
    pub expires_at: Option<Timestamp>,
}

impl AccessClaims {
    fn from_map(claims: &Map<String, Value>) -> Self {
        let pick = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| claims.get(*key).and_then(Value::as_str))
                .map(str::to_string)
        };
        Self {
            subject: pick(SUBJECT_CLAIMS),
            username: pick(NAME_CLAIMS),
            expires_at: claims
                .get("exp")
                .and_then(Value::as_i64)
                .and_then(|secs| Timestamp::from_second(secs).ok()),
        }
    }
}
