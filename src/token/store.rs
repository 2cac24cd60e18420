use tokio::sync::{RwLock, watch};
use tracing::debug;

use super::TokenPair;

/// What the rest of the application should show for the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated,
    /// The session ended because tokens could not be refreshed; the user has to log in again.
    Expired,
}

/// Holds the current token pair.
///
/// Writes replace or clear the whole pair under one lock and publish the
/// matching [`SessionStatus`].
pub struct TokenStore {
    pair: RwLock<Option<TokenPair>>,
    status: watch::Sender<SessionStatus>,
}

impl TokenStore {
    pub fn new(initial: Option<TokenPair>) -> Self {
        let status = if initial.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        };
        let (tx, _rx) = watch::channel(status);
        Self {
            pair: RwLock::new(initial),
            status: tx,
        }
    }

    pub async fn get(&self) -> Option<TokenPair> {
        self.pair.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.pair
            .read()
            .await
            .as_ref()
            .map(|pair| pair.access_token().to_string())
    }

    pub async fn replace(&self, pair: TokenPair) {
        let mut guard = self.pair.write().await;
        *guard = Some(pair);
        self.status.send_replace(SessionStatus::Authenticated);
        debug!("token store replaced");
    }

    /// Clears tokens after a deliberate logout.
    pub async fn clear(&self) {
        self.clear_with(SessionStatus::Anonymous).await;
    }

    /// Clears tokens because the session could not be recovered.
    pub async fn expire(&self) {
        self.clear_with(SessionStatus::Expired).await;
    }

    async fn clear_with(&self, status: SessionStatus) {
        let mut guard = self.pair.write().await;
        *guard = None;
        self.status.send_replace(status);
        debug!(status = ?status, "token store cleared");
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(None)
    }
}
