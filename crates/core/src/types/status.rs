//! Status enums for checkout entities.

use serde::{Deserialize, Serialize};

/// Completion state of a single checkout step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Completed,
}

impl StepStatus {
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_status_default_is_pending() {
        assert_eq!(StepStatus::default(), StepStatus::Pending);
        assert!(!StepStatus::Pending.is_completed());
        assert!(StepStatus::Completed.is_completed());
    }

    #[test]
    fn test_step_status_display() {
        assert_eq!(StepStatus::Completed.to_string(), "completed");
    }
}
