use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;

/// Production stage of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkStatus {
    #[default]
    NotStarted,
    Editing,
    Review,
    Delivered,
    Archived,
}

impl WorkStatus {
    pub const ALL: [WorkStatus; 5] = [
        WorkStatus::NotStarted,
        WorkStatus::Editing,
        WorkStatus::Review,
        WorkStatus::Delivered,
        WorkStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::NotStarted => "not_started",
            WorkStatus::Editing => "editing",
            WorkStatus::Review => "review",
            WorkStatus::Delivered => "delivered",
            WorkStatus::Archived => "archived",
        }
    }

    /// Human label, e.g. "not started".
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkStatus {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DashboardError::Validation(format!("Unknown work status '{}'", s)))
    }
}

/// Billing state of a project. Drives the received/pending split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Unpaid,
        PaymentStatus::Partial,
        PaymentStatus::Paid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DashboardError::Validation(format!("Unknown payment status '{}'", s)))
    }
}
