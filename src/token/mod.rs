mod coordinator;
mod pair;
mod policy;
mod store;

pub use coordinator::{Completion, RefreshCoordinator};
pub use pair::{AccessClaims, TokenPair, TokenSnapshot};
pub use policy::{Eligibility, SessionPolicy, Verdict};
pub use store::{SessionStatus, TokenStore};
