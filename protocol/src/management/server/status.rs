use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    NotStarted,
    Starting,
    Running,
    Stopping,
    Stopped,
    /// 可执行文件缺失, 终态
    Failed,
}

impl LifecycleState {
    /// Whether the lifecycle controller accepts a move from `self` to `next`.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        match (self, next) {
            (Failed, _) => false,
            (NotStarted | Stopped, Starting) => true,
            (Starting, Running | Failed) => true,
            (Running, Stopping) => true,
            (Stopping, Stopped) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Failed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::NotStarted => "not_started",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::LifecycleState::*;
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        assert!(NotStarted.can_transition_to(Starting));
        assert!(Starting.can_transition_to(Running));
        assert!(Starting.can_transition_to(Failed));
        assert!(Running.can_transition_to(Stopping));
        assert!(Stopping.can_transition_to(Stopped));
        assert!(Stopped.can_transition_to(Starting));

        assert!(!NotStarted.can_transition_to(Running));
        assert!(!Running.can_transition_to(Starting));
        assert!(!Failed.can_transition_to(Starting));
    }

    #[test]
    fn test_lifecycle_serialize() {
        assert_eq!(serde_json::to_string(&NotStarted).unwrap(), "\"not_started\"");
        assert_eq!(
            serde_json::from_str::<LifecycleState>("\"failed\"").unwrap(),
            Failed
        );
        assert_eq!(Stopping.to_string(), "stopping");
    }
}
