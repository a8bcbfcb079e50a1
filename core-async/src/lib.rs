//! Executor abstraction layer for the steplay core.
//!
//! Every `core-*` and `bridge-*` crate goes through this crate instead of
//! naming Tokio directly, so the executor can be swapped in one place.
//!
//! # Modules
//!
//! - `task`: task spawning
//! - `time`: sleep, timeout, instants
//! - `sync`: async-aware locks, channels and cancellation
//! - `runtime`: blocking entry point used by the `main`/`test` macros
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(5)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

// Entry-point/test macros, so downstream crates never need `#[tokio::test]`.
pub use core_async_macros::{main, test};

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
