//! Scanner lifecycle states

use std::fmt;

/// Scanner lifecycle
///
/// `NotStarted -> Running -> Stopping -> Stopped`. A failed startup (no head
/// block could be fetched) returns to `NotStarted`; a coordinating task that
/// exits on its own cancellation goes straight to `Stopped`. Both idle states
/// accept a new `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScannerState {
    /// No tasks spawned yet (or startup aborted before the cursor existed)
    #[default]
    NotStarted,

    /// Coordinating task (and possibly the backward scan) alive
    Running,

    /// `stop()` in progress, tasks may still be draining
    Stopping,

    /// Idle after a run
    Stopped,
}

impl ScannerState {
    /// Whether a `start` request may spawn tasks from this state
    #[inline]
    pub fn can_start(&self) -> bool {
        matches!(self, ScannerState::NotStarted | ScannerState::Stopped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScannerState::NotStarted => "NOT_STARTED",
            ScannerState::Running => "RUNNING",
            ScannerState::Stopping => "STOPPING",
            ScannerState::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for ScannerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_states_can_start() {
        assert!(ScannerState::NotStarted.can_start());
        assert!(ScannerState::Stopped.can_start());
        assert!(!ScannerState::Running.can_start());
        assert!(!ScannerState::Stopping.can_start());
    }

    #[test]
    fn test_display() {
        assert_eq!(ScannerState::default().to_string(), "NOT_STARTED");
        assert_eq!(ScannerState::Stopping.to_string(), "STOPPING");
    }
}
