/// Engine lifecycle states
///
/// This module defines the states a crawl run moves through.
use std::fmt;

/// Represents the lifecycle state of a crawl engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Engine built, nothing started
    Idle,

    /// Polling the SOCKS proxy until it accepts connections
    WaitingForProxy,

    /// Traversing seeds
    Running,

    /// All seeds exhausted
    Finished,

    /// Proxy never became reachable; no page was fetched
    Failed,
}

impl EngineState {
    /// Checks whether moving to `next` is a legal transition
    ///
    /// `Idle → WaitingForProxy → Running → Finished`, with
    /// `WaitingForProxy → Failed` on proxy timeout.
    pub fn can_transition_to(&self, next: EngineState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::WaitingForProxy)
                | (Self::WaitingForProxy, Self::Running)
                | (Self::WaitingForProxy, Self::Failed)
                | (Self::Running, Self::Finished)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::WaitingForProxy => "waiting_for_proxy",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
