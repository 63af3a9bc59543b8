//! # Behaviour Testing
//!
//! Given/When/Then lifecycle template for tests over an asynchronously
//! constructed subject under test.
//!
//! ## Architecture Overview
//!
//! - **lifecycle**: the `AsyncBehaviour` trait, its `execute` controller and
//!   the `Throw`/`Record` exception mode
//! - **fixture**: seeded test-data generator used to build the subject
//! - **logging**: per-instance logger handles over one process-wide `log` dispatch
//! - **config**: process-wide defaults, from YAML and environment variables
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use behaviour_testing::prelude::*;
//!
//! #[derive(Default)]
//! struct AddingTwoNumbers {
//!     state: BehaviourState<Calculator>,
//!     result: Option<u64>,
//! }
//!
//! #[async_trait]
//! impl AsyncBehaviour for AddingTwoNumbers {
//!     type Subject = Calculator;
//!
//!     fn state(&self) -> &BehaviourState<Calculator> { &self.state }
//!     fn state_mut(&mut self) -> &mut BehaviourState<Calculator> { &mut self.state }
//!
//!     async fn given(&mut self) -> Result<()> { Ok(()) }
//!
//!     async fn when(&mut self) -> Result<()> {
//!         let calculator = self.state.subject().context("no subject")?;
//!         self.result = Some(calculator.add(2, 3).await?);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::test]
//! async fn adds() {
//!     let mut test = AddingTwoNumbers::default();
//!     test.execute().await.unwrap();
//!     assert_eq!(test.result, Some(5));
//! }
//! ```
//!
//! ## Replaying a failure
//!
//! A failure propagated from `execute` logs the fixture seed:
//!
//! ```text
//! Replay with: BEHAVE_TEST_SEED=0xa3f5c8e1b2d94706 cargo test ...
//! ```

#![warn(clippy::all)]

/// Process-wide configuration
pub mod config;

/// Error types
pub mod error;

/// Seeded test-data generation
pub mod fixture;

/// Lifecycle controller, state and exception mode
pub mod lifecycle;

/// Logger handles and targets
pub mod logging;

// Convenient re-exports for common usage
pub mod prelude;

// Re-export commonly used types at crate root
pub use error::{BehaviourError, FixtureError, LoggingError};
pub use fixture::{Fixture, Synthesize, TestRng};
pub use lifecycle::{AsyncBehaviour, BehaviourState, ExceptionMode, Thrown};
pub use logging::{Layout, LoggingTarget, MemoryLog, TestLogger};

/// Framework version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
