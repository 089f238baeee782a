//! Restock lifecycle: Submitted → InProgress → Completed | Failed

use std::fmt;

use rust_decimal::Decimal;
use shared::RestockRecord;

use crate::poll::{StatusClass, classify_status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestockStatus {
    Submitted,
    InProgress,
    Completed,
    Failed,
}

impl RestockStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RestockStatus::Completed | RestockStatus::Failed)
    }
}

impl fmt::Display for RestockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RestockStatus::Submitted => "SUBMITTED",
            RestockStatus::InProgress => "IN_PROGRESS",
            RestockStatus::Completed => "COMPLETED",
            RestockStatus::Failed => "FAILED",
        })
    }
}

/// A submitted restock as last seen by the truck
#[derive(Debug, Clone, PartialEq)]
pub enum RestockState {
    Submitted {
        order_id: String,
    },
    InProgress {
        order_id: String,
        status: String,
    },
    Completed {
        order_id: String,
        total_cost: Decimal,
    },
    Failed {
        order_id: String,
        status: String,
    },
}

/// Terminal restock result
#[derive(Debug, Clone, PartialEq)]
pub enum RestockOutcome {
    Completed { order_id: String, total_cost: Decimal },
    Failed { order_id: String, status: String },
}

impl RestockState {
    pub fn submitted(order_id: impl Into<String>) -> Self {
        RestockState::Submitted {
            order_id: order_id.into(),
        }
    }

    pub fn order_id(&self) -> &str {
        match self {
            RestockState::Submitted { order_id }
            | RestockState::InProgress { order_id, .. }
            | RestockState::Completed { order_id, .. }
            | RestockState::Failed { order_id, .. } => order_id,
        }
    }

    pub fn status(&self) -> RestockStatus {
        match self {
            RestockState::Submitted { .. } => RestockStatus::Submitted,
            RestockState::InProgress { .. } => RestockStatus::InProgress,
            RestockState::Completed { .. } => RestockStatus::Completed,
            RestockState::Failed { .. } => RestockStatus::Failed,
        }
    }

    pub fn outcome(&self) -> Option<RestockOutcome> {
        match self {
            RestockState::Completed {
                order_id,
                total_cost,
            } => Some(RestockOutcome::Completed {
                order_id: order_id.clone(),
                total_cost: *total_cost,
            }),
            RestockState::Failed { order_id, status } => Some(RestockOutcome::Failed {
                order_id: order_id.clone(),
                status: status.clone(),
            }),
            _ => None,
        }
    }

    /// Apply one polled record. Terminal states never change again; a
    /// polled `CANCELLED` counts as a failure.
    pub fn apply_poll(&mut self, record: &RestockRecord) -> RestockStatus {
        if self.status().is_terminal() {
            return self.status();
        }
        let order_id = self.order_id().to_string();
        *self = match classify_status(&record.status) {
            StatusClass::Completed => RestockState::Completed {
                order_id,
                total_cost: record.total_cost,
            },
            StatusClass::Failed | StatusClass::Cancelled => RestockState::Failed {
                order_id,
                status: record.status.clone(),
            },
            StatusClass::Pending => RestockState::InProgress {
                order_id,
                status: record.status.clone(),
            },
        };
        self.status()
    }
}
