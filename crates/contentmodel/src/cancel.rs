//! Cooperative cancellation for request handlers.

use tokio_util::sync::CancellationToken;

/// The request was cancelled by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("request cancelled")]
pub struct Cancelled;

/// Read side of a request's cancellation token.
///
/// Long operations call [`CancelChecker::check`] between units of work and
/// return early with [`Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelChecker {
	token: Option<CancellationToken>,
}

impl CancelChecker {
	/// Observes `token`.
	pub fn new(token: CancellationToken) -> Self {
		Self { token: Some(token) }
	}

	/// A checker that is never cancelled.
	pub fn never() -> Self {
		Self::default()
	}

	/// Whether cancellation was requested.
	pub fn is_cancelled(&self) -> bool {
		self.token.as_ref().is_some_and(CancellationToken::is_cancelled)
	}

	/// Returns `Err(Cancelled)` once cancellation was requested.
	pub fn check(&self) -> Result<(), Cancelled> {
		if self.is_cancelled() { Err(Cancelled) } else { Ok(()) }
	}
}

impl From<CancellationToken> for CancelChecker {
	fn from(token: CancellationToken) -> Self {
		Self::new(token)
	}
}
