use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    ForumClient,
    config::Config,
    dispatcher::ApiRequest,
    errors::Error,
    request_context::RequestDispatchContext,
    token::{SessionStatus, TokenPair, TokenStore},
    types::{AuthResponse, LoginRequest, RegisterRequest, UserProfile},
};

impl ForumClient {
    /// Create a new ForumClient
    /// # Arguments
    /// * `config` - Explicit configuration (`Config`), typically loaded via `Config::from_file` or `Config::from_env`.
    ///
    /// Tokens present in the config are installed into the token store, so a
    /// previous session resumes without logging in again.
    pub fn new(config: Config) -> Result<Self, Error> {
        let context = RequestDispatchContext::from_config(&config)?;
        Ok(Self { context })
    }

    pub fn from_context(context: RequestDispatchContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &RequestDispatchContext {
        &self.context
    }

    pub fn store(&self) -> Arc<TokenStore> {
        self.context.store()
    }

    /// Watch this to send the user back to the login screen once the session expires.
    pub fn session(&self) -> watch::Receiver<SessionStatus> {
        self.context.store().subscribe()
    }

    pub async fn tokens(&self) -> Option<TokenPair> {
        self.context.store().get().await
    }

    /// Installs tokens obtained elsewhere, e.g. restored from disk.
    pub async fn install_tokens(&self, tokens: TokenPair) {
        self.context.store().replace(tokens).await;
    }

    /// User id from the current access token, if signed in and the token is a JWT.
    pub async fn current_user_id(&self) -> Option<String> {
        let pair = self.tokens().await?;
        pair.claims().ok().and_then(|claims| claims.subject)
    }

    pub async fn login(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<AuthResponse, Error> {
        let request = ApiRequest::post("/auth/login").json(&LoginRequest {
            username: username.into(),
            password: password.into(),
        })?;
        let auth: AuthResponse = self.context.execute_anonymous_json(request).await?;
        self.context.store().replace(auth.tokens.clone()).await;
        info!("logged in: user='{}'", auth.username);
        Ok(auth)
    }

    pub async fn register(&self, registration: &RegisterRequest) -> Result<AuthResponse, Error> {
        let request = ApiRequest::post("/auth/register").json(registration)?;
        let auth: AuthResponse = self.context.execute_anonymous_json(request).await?;
        self.context.store().replace(auth.tokens.clone()).await;
        info!("registered: user='{}'", auth.username);
        Ok(auth)
    }

    /// Revokes the refresh token server-side when possible, then always clears local tokens.
    pub async fn logout(&self) {
        if self.context.store().get().await.is_some()
            && let Err(err) = self.context.execute_unit(ApiRequest::post("/auth/logout")).await
        {
            warn!("server logout failed, clearing local session anyway: {}", err);
        }
        self.context.store().clear().await;
        info!("logged out");
    }

    pub async fn current_user(&self) -> Result<UserProfile, Error> {
        self.context.execute_json(ApiRequest::get("/auth/me")).await
    }

    pub async fn profile(&self, user_id: &str) -> Result<UserProfile, Error> {
        let path = format!("/auth/profile/{}", urlencoding::encode(user_id));
        self.context.execute_json(ApiRequest::get(path)).await
    }
}
