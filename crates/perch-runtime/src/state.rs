//! Event loop states.

use std::fmt;

/// Where the event loop is in its lifecycle.
///
/// ```text
/// Disconnected --connected--> Connected --message--> Processing
///       |                         |                      |
///       +---- invalid credentials or termination --------+--> Terminated
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopState {
    /// The self identity is not known yet.
    #[default]
    Disconnected,
    /// Connected, no message handled yet.
    Connected,
    /// Handling messages.
    Processing,
    /// Stopped. No further event is handled.
    Terminated,
}

impl LoopState {
    /// State after the self identity was resolved.
    pub fn connected(self) -> Self {
        match self {
            Self::Disconnected => Self::Connected,
            other => other,
        }
    }

    /// State after a message was routed to the dispatcher.
    pub fn processing(self) -> Self {
        match self {
            Self::Connected | Self::Processing => Self::Processing,
            other => other,
        }
    }

    /// Returns `true` if messages can be dispatched.
    pub fn accepts_messages(self) -> bool {
        matches!(self, Self::Connected | Self::Processing)
    }

    /// Returns `true` once the loop has stopped.
    pub fn is_terminated(self) -> bool {
        self == Self::Terminated
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connected => f.write_str("connected"),
            Self::Processing => f.write_str("processing"),
            Self::Terminated => f.write_str("terminated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let state = LoopState::default();
        assert!(!state.accepts_messages());
        assert_eq!(state.processing(), LoopState::Disconnected);

        let state = state.connected();
        assert_eq!(state, LoopState::Connected);
        assert!(state.accepts_messages());

        let state = state.processing();
        assert_eq!(state, LoopState::Processing);
        assert_eq!(state.connected(), LoopState::Processing);

        assert!(LoopState::Terminated.is_terminated());
        assert_eq!(LoopState::Terminated.connected(), LoopState::Terminated);
    }
}
