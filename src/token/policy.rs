use jiff::Timestamp;
use reqwest::StatusCode;

use crate::errors::Error;

use super::TokenPair;

/// How a response should be handled once it comes back from the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Not an authorization failure; hand the response to the caller unchanged.
    Pass,
    /// First authorization failure for this request; refresh and retry once.
    Recover,
    /// Authorization failure on a request that was already retried.
    Reject,
}

/// Whether the stored tokens can be used to attempt a refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eligibility {
    Ready,
    MissingToken,
    RefreshExpired,
}

/// Business rules deciding when an authorization failure is recoverable.
#[derive(Clone, Debug)]
pub struct SessionPolicy {
    auth_failures: Vec<StatusCode>,
}

impl SessionPolicy {
    pub fn new(auth_failures: Vec<StatusCode>) -> Result<Self, Error> {
        if auth_failures.is_empty() {
            return Err(Error::Config(
                "At least one authorization failure status is required".into(),
            ));
        }
        if let Some(status) = auth_failures.iter().find(|s| s.is_success()) {
            return Err(Error::Config(format!(
                "Status {status} cannot be treated as an authorization failure"
            )));
        }
        Ok(Self { auth_failures })
    }

    pub fn is_auth_failure(&self, status: StatusCode) -> bool {
        self.auth_failures.contains(&status)
    }

    pub fn classify(&self, status: StatusCode, retried: bool) -> Verdict {
        match (self.is_auth_failure(status), retried) {
            (false, _) => Verdict::Pass,
            (true, false) => Verdict::Recover,
            (true, true) => Verdict::Reject,
        }
    }

    pub fn eligibility(&self, pair: Option<&TokenPair>, now: Timestamp) -> Eligibility {
        match pair {
            None => Eligibility::MissingToken,
            Some(pair) if pair.refresh_expired(now) => Eligibility::RefreshExpired,
            Some(_) => Eligibility::Ready,
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            auth_failures: vec![StatusCode::UNAUTHORIZED],
        }
    }
}
