//! Vow Host Driver
//!
//! The core runtime leaves one primitive to its host: a "turn boundary"
//! at which the microtask queue is drained. This crate supplies it:
//! - **Driver**: owns a scheduler and a timer queue; `turn()` fires due
//!   timers then drains microtasks, `block_on()` runs turns until a chosen
//!   future settles (`driver` module)
//! - **TimerQueue**: deadline-ordered jobs with FIFO tie-break
//!   (`timer` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use vow_driver::Driver;
//! use vow_core::Future;
//!
//! let driver = Driver::new();
//! let future: Future<i32, &str> = driver.delay(Duration::from_millis(10), 42);
//! let outcome = driver.block_on(&future, Duration::from_secs(1)).unwrap();
//! assert_eq!(outcome, Ok(42));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod driver;
mod timer;

pub use driver::{Driver, DriverError, TurnStats};
