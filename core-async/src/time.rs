//! Time-related abstractions.
//!
//! ```rust
//! use core_async::time::{sleep, timeout, Duration, Instant};
//!
//! async fn example() {
//!     let start = Instant::now();
//!     sleep(Duration::from_millis(10)).await;
//!     assert!(start.elapsed() >= Duration::from_millis(10));
//!
//!     let late = timeout(Duration::from_millis(1), sleep(Duration::from_secs(1))).await;
//!     assert!(late.is_err());
//! }
//! ```

pub use tokio::time::{error::Elapsed, sleep, timeout, Sleep, Timeout};

pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
