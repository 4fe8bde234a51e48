//! Vow Deferred-Value Runtime
//!
//! This crate provides a single-threaded cooperative future runtime:
//! - **Future**: a value cell that settles exactly once (`future` module)
//! - **Scheduler**: a FIFO microtask queue decoupling settlement from
//!   reaction execution (`scheduler` module)
//! - **Combinators**: `all` and `race` aggregation over futures
//!   (`combinator` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use vow_core::{Future, Scheduler, Step};
//!
//! let scheduler = Scheduler::new();
//! let (future, completer) = Future::<i32, String>::pending(&scheduler);
//!
//! let doubled = future.then(|n| Step::Done(n * 2));
//!
//! completer.resolve(21);
//! scheduler.drain();
//!
//! assert_eq!(doubled.result(), Some(Ok(42)));
//! ```
//!
//! Settlement may happen from any thread, but reactions only run when the
//! host drains the scheduler at a turn boundary. The `vow-driver` crate
//! provides a ready-made turn loop with timers.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod error;
mod future;
mod reaction;
mod scheduler;
mod state;

/// Combinators building derived futures from collections of inputs
pub mod combinator;

pub use combinator::{all, race};
pub use error::UnhandledRejection;
pub use future::{Completer, Future, FutureId, Step};
pub use scheduler::{Scheduler, SchedulerStats};
pub use state::FutureState;
