//! Task spawning.
//!
//! ```rust
//! use core_async::task;
//!
//! async fn example() {
//!     let handle = task::spawn(async { 7 });
//!     assert_eq!(handle.await.unwrap(), 7);
//! }
//! ```

pub use tokio::task::{yield_now, JoinError, JoinHandle};

/// Spawn a future onto the current runtime.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

pub type Result<T> = std::result::Result<T, JoinError>;
