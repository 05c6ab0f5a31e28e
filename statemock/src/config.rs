// vim: tw=80
/// What a [`Method`](struct.Method.html) does with a call that no expectation
/// matches.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FailureMode {
    /// Panic at the call site.
    #[default]
    Fatal,
    /// Record the violation and continue, so that
    /// [`verify_all`](struct.Controller.html#method.verify_all) can list
    /// every violation of a test at once.
    Record,
}

/// Per-mock configuration, fixed when the
/// [`Controller`](struct.Controller.html) is created.
///
/// # Examples
/// ```
/// # use statemock::*;
/// let ctrl = Controller::with_config(Config::new()
///     .failure_mode(FailureMode::Record)
///     .synchronized(true));
/// assert!(ctrl.state().is_synchronized());
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Config {
    pub(crate) failure_mode: FailureMode,
    pub(crate) synchronized: bool,
    pub(crate) verify_on_drop: bool,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Serialize `call`, `expect` and `transition` on a lock owned by the
    /// mock's state.
    pub fn synchronized(mut self, synchronized: bool) -> Self {
        self.synchronized = synchronized;
        self
    }

    /// Panic with the collective report if the controller is dropped with
    /// outstanding violations.
    ///
    /// Nothing happens if the thread is already panicking.
    pub fn verify_on_drop(mut self, verify: bool) -> Self {
        self.verify_on_drop = verify;
        self
    }

    pub fn get_failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    pub fn verifies_on_drop(&self) -> bool {
        self.verify_on_drop
    }
}
