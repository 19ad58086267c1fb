/// Resilience helpers for calls to external dependencies
///
/// The photo backend talks to exactly one third-party service (reverse
/// geocoding), so this crate only carries the timeout guard. Every outbound
/// call must go through it so a slow upstream cannot hold a request open.
///
/// # Example
///
/// ```rust,no_run
/// use resilience::with_timeout_result;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let result = with_timeout_result(Duration::from_millis(500), async {
///         Ok::<_, String>("address")
///     })
///     .await;
///     assert!(result.is_ok());
/// }
/// ```
pub mod timeout;

pub use timeout::{with_timeout_result, TimeoutError};
