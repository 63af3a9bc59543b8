use super::{ExceptionMode, Thrown};
use crate::fixture::Fixture;
use crate::logging::TestLogger;

/// Per-instance lifecycle state, embedded in every behaviour test
///
/// Built from plain data: the fixture is not customized and the logger is
/// detached until [`AsyncBehaviour::initialize`](super::AsyncBehaviour::initialize)
/// runs the configuration hooks.
#[derive(Debug)]
pub struct BehaviourState<S> {
    subject: Option<S>,
    thrown: Option<Thrown>,
    mode: ExceptionMode,
    fixture: Fixture,
    log: TestLogger,
    initialized: bool,
    executed: bool,
}

impl<S> BehaviourState<S> {
    pub fn new() -> Self {
        Self::with_fixture(Fixture::new())
    }

    /// Start from a specific fixture, e.g. one with a fixed seed
    pub fn with_fixture(fixture: Fixture) -> Self {
        Self {
            subject: None,
            thrown: None,
            mode: ExceptionMode::Throw,
            fixture,
            log: TestLogger::detached(),
            initialized: false,
            executed: false,
        }
    }

    /// The subject under test, present once construction succeeded
    pub fn subject(&self) -> Option<&S> {
        self.subject.as_ref()
    }

    pub fn subject_mut(&mut self) -> Option<&mut S> {
        self.subject.as_mut()
    }

    /// The failure captured in [`ExceptionMode::Record`]
    pub fn thrown(&self) -> Option<&Thrown> {
        self.thrown.as_ref()
    }

    pub fn exception_mode(&self) -> ExceptionMode {
        self.mode
    }

    /// Capture failures from construction and `when` instead of re-raising them
    ///
    /// Usually called from `given`. There is no way back to `Throw`.
    pub fn record_any_exceptions_thrown(&mut self) {
        self.mode = ExceptionMode::Record;
    }

    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    pub fn fixture_mut(&mut self) -> &mut Fixture {
        &mut self.fixture
    }

    pub fn log(&self) -> &TestLogger {
        &self.log
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn has_executed(&self) -> bool {
        self.executed
    }

    pub(crate) fn take_fixture(&mut self) -> Fixture {
        let placeholder = Fixture::with_seed(self.fixture.seed());
        std::mem::replace(&mut self.fixture, placeholder)
    }

    pub(crate) fn complete_initialization(&mut self, fixture: Fixture, log: TestLogger) {
        self.fixture = fixture;
        self.log = log;
        self.initialized = true;
    }

    pub(crate) fn mark_executed(&mut self) {
        self.executed = true;
    }

    pub(crate) fn set_subject(&mut self, subject: S) {
        self.subject = Some(subject);
    }

    pub(crate) fn record(&mut self, thrown: Thrown) {
        if self.thrown.is_none() {
            self.thrown = Some(thrown);
        }
    }

    /// Replace the logger with a detached one, removing its route
    pub(crate) fn release_log(&mut self) {
        self.log = TestLogger::detached();
    }
}

impl<S> Default for BehaviourState<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state: BehaviourState<u32> = BehaviourState::with_fixture(Fixture::with_seed(1));
        assert!(state.subject().is_none());
        assert!(state.thrown().is_none());
        assert_eq!(state.exception_mode(), ExceptionMode::Throw);
        assert!(state.log().is_detached());
        assert!(!state.is_initialized());
        assert!(!state.has_executed());
        assert_eq!(state.fixture().seed(), 1);
    }

    #[test]
    fn test_record_switch_is_idempotent() {
        let mut state: BehaviourState<u32> = BehaviourState::default();
        state.record_any_exceptions_thrown();
        state.record_any_exceptions_thrown();
        assert_eq!(state.exception_mode(), ExceptionMode::Record);
    }

    #[test]
    fn test_captured_failure_is_write_once() {
        let mut state: BehaviourState<u32> = BehaviourState::default();
        state.record(Thrown::Error(anyhow::anyhow!("first")));
        state.record(Thrown::Error(anyhow::anyhow!("second")));
        assert_eq!(state.thrown().map(Thrown::message).as_deref(), Some("first"));
    }

    #[test]
    fn test_take_fixture_keeps_seed() {
        let mut state: BehaviourState<u32> = BehaviourState::with_fixture(Fixture::with_seed(8));
        let fixture = state.take_fixture();
        assert_eq!(fixture.seed(), 8);
        assert_eq!(state.fixture().seed(), 8);
    }
}
