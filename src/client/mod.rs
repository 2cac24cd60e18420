mod impls;
mod problems;
mod solutions;

use crate::request_context::RequestDispatchContext;

/// Typed access to the forum API.
///
/// Every authorized call shares one token store and refresh coordinator, so
/// clones of a client never refresh independently.
#[derive(Clone)]
pub struct ForumClient {
    context: RequestDispatchContext,
}
