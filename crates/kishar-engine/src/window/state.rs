/// Application loop lifecycle.
///
/// Transitions:
/// - `Uninitialized → Running` once window, context, chain and pipeline all
///   construct
/// - `Uninitialized → Stopped` when any of those fails (fatal startup error)
/// - `Running → Terminating` on a close request or a fatal frame error
/// - `Terminating → Stopped` after teardown; irreversible
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Uninitialized,
    Running,
    Terminating,
    Stopped,
}

impl LoopState {
    /// Returns `Some(to)` when `to` is a legal transition from `self`.
    pub fn try_transition(self, to: LoopState) -> Option<LoopState> {
        use LoopState::*;

        let legal = matches!(
            (self, to),
            (Uninitialized, Running)
                | (Uninitialized, Stopped)
                | (Running, Terminating)
                | (Terminating, Stopped)
        );

        legal.then_some(to)
    }
}
