// File: behaviour-testing/src/lifecycle/mod.rs
//
// Given / construct / When / Teardown.
//
// The controller runs every phase to completion before starting the next.
// Given runs outside the teardown guard: a failing Given skips teardown.
// Failures from construction and When are handled once, according to the
// instance's ExceptionMode, and teardown runs on every path after Given.
// Every hook is polled inside the instance's logging scope, so the subject's
// own `log` records reach the instance's target.

/// Exception mode switch
pub mod mode;
/// Per-instance lifecycle state
pub mod state;
/// Captured failures
pub mod thrown;

pub use mode::ExceptionMode;
pub use state::BehaviourState;
pub use thrown::Thrown;

use crate::config::{self, LogLevel};
use crate::error::{BehaviourError, LoggingError};
use crate::fixture::{Fixture, Synthesize};
use crate::logging::{self, Layout, LoggingTarget};
use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use log::Level;
use std::panic::AssertUnwindSafe;

/// A behaviour-style test over an asynchronously constructed subject
///
/// Implementors embed a [`BehaviourState`] and provide `given` and `when`;
/// everything else has a default. The runner (for instance `#[tokio::test]`)
/// calls [`execute`](AsyncBehaviour::execute), then asserts on the state.
///
/// # Lifecycle
///
/// 1. `initialize` (once): configuration hooks, fixture customization, logger
/// 2. `given`: not guarded, its failure is returned as-is and teardown is skipped
/// 3. `create_subject`: stored as the subject under test
/// 4. `when`: never runs if construction failed
/// 5. failure from 3 or 4: captured in `Record` mode, returned after teardown in `Throw` mode
/// 6. `teardown`: always, once, after steps 3 to 5
///
/// # Example
///
/// ```rust,ignore
/// use behaviour_testing::prelude::*;
///
/// struct WithdrawingTooMuch {
///     state: BehaviourState<Account>,
/// }
///
/// #[async_trait]
/// impl AsyncBehaviour for WithdrawingTooMuch {
///     type Subject = Account;
///
///     fn state(&self) -> &BehaviourState<Account> { &self.state }
///     fn state_mut(&mut self) -> &mut BehaviourState<Account> { &mut self.state }
///
///     async fn given(&mut self) -> Result<()> {
///         self.state.record_any_exceptions_thrown();
///         Ok(())
///     }
///
///     async fn when(&mut self) -> Result<()> {
///         let account = self.state.subject_mut().context("no subject")?;
///         account.withdraw(u64::MAX).await
///     }
/// }
///
/// #[tokio::test]
/// async fn withdrawing_too_much_is_rejected() {
///     let mut test = WithdrawingTooMuch { state: BehaviourState::new() };
///     test.execute().await.unwrap();
///     assert!(test.state().thrown().unwrap().is::<InsufficientFunds>());
/// }
/// ```
#[async_trait]
pub trait AsyncBehaviour: Send {
    type Subject: Synthesize + Send + 'static;

    fn state(&self) -> &BehaviourState<Self::Subject>;

    fn state_mut(&mut self) -> &mut BehaviourState<Self::Subject>;

    /// Establish preconditions; may opt into recording failures
    async fn given(&mut self) -> Result<()>;

    /// Exercise the subject under test
    async fn when(&mut self) -> Result<()>;

    fn log_level(&self) -> LogLevel {
        config::global().log_level
    }

    fn logging_target(&self) -> LoggingTarget {
        LoggingTarget::ColoredConsole
    }

    fn log_layout(&self) -> Result<Layout, LoggingError> {
        Layout::parse(&config::global().log_layout)
    }

    /// Register factories, injected values or settings before first use
    fn customize_fixture(&self, fixture: &mut Fixture) {
        let _ = fixture;
    }

    /// Build the subject under test, by default through the fixture
    async fn create_subject(&mut self) -> Result<Self::Subject> {
        let subject = self.state_mut().fixture_mut().create::<Self::Subject>()?;
        Ok(subject)
    }

    /// Runs after every construction attempt, whatever its outcome
    ///
    /// An error returned here propagates from `execute` and supersedes a
    /// pending failure, which is logged at warn level.
    fn teardown(&mut self) -> Result<()> {
        Ok(())
    }

    /// Runs from [`conclude`](AsyncBehaviour::conclude), after assertions
    async fn post_assert_teardown(&mut self) -> Result<()> {
        Ok(())
    }

    /// Run the configuration hooks
    ///
    /// Idempotent. `execute` calls it first, so calling it directly is only
    /// needed to use the fixture or logger before `execute`.
    fn initialize(&mut self) -> Result<(), BehaviourError> {
        if self.state().is_initialized() {
            return Ok(());
        }

        let log = logging::configure(
            std::any::type_name::<Self>(),
            self.logging_target(),
            self.log_level(),
            self.log_layout()?,
        )?;
        let mut fixture = self.state_mut().take_fixture();
        self.customize_fixture(&mut fixture);

        log.trace(format_args!("Fixture seed: 0x{:016x}", fixture.seed()));
        self.state_mut().complete_initialization(fixture, log);
        Ok(())
    }

    /// Run the lifecycle once
    ///
    /// # Errors
    ///
    /// - the error from `given`, unchanged (teardown skipped)
    /// - in `Throw` mode, the error from `create_subject` or `when`, unchanged (after teardown)
    /// - the error from `teardown`
    /// - `BehaviourError::AlreadyExecuted` if this instance already ran
    ///
    /// # Panics
    ///
    /// In `Throw` mode, a panic from `create_subject` or `when` resumes after
    /// teardown. A panic from `given` or `teardown` unwinds directly.
    async fn execute(&mut self) -> Result<()> {
        self.initialize()?;
        if self.state().has_executed() {
            return Err(BehaviourError::AlreadyExecuted.into());
        }
        self.state_mut().mark_executed();

        let sink = self.state().log().sink();
        self.state().log().debug(format_args!("Given"));
        logging::in_scope(sink.clone(), self.given()).await?;

        let phases = async {
            self.state().log().debug(format_args!("Creating subject"));
            let subject = self.create_subject().await?;
            self.state_mut().set_subject(subject);

            self.state().log().debug(format_args!("When"));
            self.when().await?;
            Ok::<(), anyhow::Error>(())
        };
        let failure = match AssertUnwindSafe(logging::in_scope(sink.clone(), phases))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => None,
            Ok(Err(error)) => Some(Thrown::Error(error)),
            Err(payload) => Some(Thrown::Panic(payload)),
        };

        let pending = match failure {
            Some(thrown) if self.state().exception_mode() == ExceptionMode::Record => {
                self.state()
                    .log()
                    .debug(format_args!("Recorded failure: {}", thrown));
                self.state_mut().record(thrown);
                None
            }
            other => other,
        };

        self.state().log().debug(format_args!("Teardown"));
        let teardown = {
            let _scope = logging::Scope::enter(sink);
            self.teardown()
        };
        if let Err(error) = teardown {
            if let Some(thrown) = pending {
                self.state()
                    .log()
                    .warn(format_args!("Teardown failed, discarding: {}", thrown));
            }
            return Err(error);
        }

        match pending {
            None => Ok(()),
            Some(thrown) => {
                let log = self.state().log();
                if log.enabled(Level::Warn) {
                    log.warn(format_args!(
                        "Replay with: {}",
                        self.state().fixture().rng().replay_hint()
                    ));
                }
                match thrown {
                    Thrown::Error(error) => Err(error),
                    Thrown::Panic(payload) => std::panic::resume_unwind(payload),
                }
            }
        }
    }

    /// Run `post_assert_teardown`, then release the logger
    async fn conclude(&mut self) -> Result<()> {
        let sink = self.state().log().sink();
        let result = logging::in_scope(sink, self.post_assert_teardown()).await;
        self.state_mut().release_log();
        result
    }
}
