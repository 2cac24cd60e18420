#![allow(dead_code)]

use std::sync::Once;

use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};
use wiremock::MockServer;

use mathboard::{Config, ForumClient, TokenPair};

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Signs a token the way the forum server does; the client never checks the signature.
pub fn mint_jwt(user_id: &str, username: &str) -> String {
    let claims = json!({
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier": user_id,
        "unique_name": username,
        "exp": (Timestamp::now() + SignedDuration::from_mins(15)).as_second(),
    });
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"forum-signing-key"),
    )
    .unwrap()
}

pub fn pair(access: &str, refresh: &str) -> TokenPair {
    let now = Timestamp::now();
    TokenPair::try_new(
        access,
        refresh,
        now + SignedDuration::from_mins(15),
        now + SignedDuration::from_hours(24 * 7),
    )
    .unwrap()
}

pub fn token_json(access: &str, refresh: &str) -> Value {
    let issued = pair(access, refresh);
    json!({
        "accessToken": access,
        "refreshToken": refresh,
        "accessTokenExpiry": issued.access_expiry().to_string(),
        "refreshTokenExpiry": issued.refresh_expiry().to_string(),
    })
}

pub fn ok(data: Value) -> Value {
    json!({ "success": true, "message": "", "data": data })
}

pub fn client_for(server: &MockServer, tokens: Option<TokenPair>) -> ForumClient {
    init_logging();
    let mut config = Config::from_values(format!("{}/api", server.uri()), Some(10));
    if let Some(tokens) = tokens {
        config = config.with_tokens(tokens);
    }
    ForumClient::new(config).expect("client builds")
}
