use std::sync::Arc;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::Config;
use crate::dispatcher::{ApiRequest, Dispatcher};
use crate::errors::Error;
use crate::token::{RefreshCoordinator, SessionPolicy, TokenStore, Verdict};
use crate::types::ApiResponse;

/// Shared context for outbound requests ensuring consistent token handling.
#[derive(Clone)]
pub struct RequestDispatchContext {
    dispatcher: Dispatcher,
    coordinator: Arc<RefreshCoordinator>,
    store: Arc<TokenStore>,
}

impl RequestDispatchContext {
    pub fn build(
        http_client: Client,
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        store: Arc<TokenStore>,
        policy: SessionPolicy,
    ) -> Self {
        let dispatcher = Dispatcher::new(http_client, base_url, user_agent);
        let coordinator = RefreshCoordinator::new(dispatcher.clone(), Arc::clone(&store), policy);
        Self {
            dispatcher,
            coordinator: Arc::new(coordinator),
            store,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let base_url = config.base_url()?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;
        let store = Arc::new(TokenStore::new(config.tokens.clone()));
        Ok(Self::build(
            http_client,
            base_url,
            config.user_agent.clone(),
            store,
            SessionPolicy::default(),
        ))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn coordinator(&self) -> Arc<RefreshCoordinator> {
        Arc::clone(&self.coordinator)
    }

    pub fn store(&self) -> Arc<TokenStore> {
        Arc::clone(&self.store)
    }

    /// Sends a request with the current access token, recovering once from an
    /// authorization failure. Any other status is returned untouched.
    pub async fn execute(&self, request: ApiRequest) -> Result<Response, Error> {
        let token = self.store.access_token().await;
        let resp = self.dispatcher.send(&request, token.as_deref()).await?;
        let status = resp.status();
        match self.coordinator.policy().classify(status, request.is_retry()) {
            Verdict::Pass => Ok(resp),
            Verdict::Recover => {
                warn!(
                    "authorization failure: status={} path='{}'; recovering",
                    status, request.path
                );
                self.coordinator.recover(request, token).await
            }
            Verdict::Reject => {
                warn!(
                    "authorization failure on retried request: status={} path='{}'",
                    status, request.path
                );
                Err(Error::Auth(format!(
                    "{} unauthorized (status {})",
                    request.path, status
                )))
            }
        }
    }

    /// Executes and unwraps the `data` field of the response envelope.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, Error> {
        let body = checked_body(self.execute(request).await?).await?;
        serde_json::from_str::<ApiResponse<T>>(&body)?.into_data()
    }

    /// Sends without credentials and without refresh handling, for login and
    /// registration where a 401 means bad credentials rather than an expired token.
    pub async fn execute_anonymous_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, Error> {
        let body = checked_body(self.dispatcher.send(&request, None).await?).await?;
        serde_json::from_str::<ApiResponse<T>>(&body)?.into_data()
    }

    /// Executes a call whose envelope carries no meaningful data.
    pub async fn execute_unit(&self, request: ApiRequest) -> Result<(), Error> {
        let body = checked_body(self.execute(request).await?).await?;
        if body.trim().is_empty() {
            return Ok(());
        }
        let envelope: ApiResponse<serde_json::Value> = serde_json::from_str(&body)?;
        if envelope.success {
            Ok(())
        } else {
            Err(Error::Api(envelope.describe()))
        }
    }
}

/// Reads the body, turning non-success statuses into [`Error::Http`] with the server's message.
async fn checked_body(resp: Response) -> Result<String, Error> {
    let status = resp.status();
    let body = resp.text().await?;
    if status.is_success() {
        return Ok(body);
    }
    let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
        .map(|envelope| envelope.describe())
        .unwrap_or(body);
    Err(Error::Http(status, message))
}
