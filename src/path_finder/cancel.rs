use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lets the caller abort a running search.
///
/// Clones share the same flag. The search checks it once per iteration and returns
/// [`NoPath::Cancelled`](crate::NoPath::Cancelled).
///
/// ## Examples
/// ```
/// # use region_pathing::CancelToken;
/// let token = CancelToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
	/// Creates a token that is not cancelled
	pub fn new() -> CancelToken {
		CancelToken::default()
	}

	/// Requests the search to stop
	pub fn cancel(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	/// `true` once [`cancel`](CancelToken::cancel) was called on any clone
	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}
