use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, ValidationFailure};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportId(pub String);

impl ReportId {
    pub fn generate() -> Self {
        Self(format!("RMB-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum ReportStatus {
    Submitted,
    Approved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Submitted)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = ValidationFailure;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "submitted" => Ok(Self::Submitted),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ValidationFailure::UnknownStatus { value: value.to_string() }),
        }
    }
}

impl TryFrom<String> for ReportStatus {
    type Error = ValidationFailure;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Outcome of a review. Only terminal statuses are representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn status(&self) -> ReportStatus {
        match self {
            Self::Approved => ReportStatus::Approved,
            Self::Rejected => ReportStatus::Rejected,
        }
    }
}

impl From<Decision> for ReportStatus {
    fn from(decision: Decision) -> Self {
        decision.status()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status().as_str())
    }
}

impl FromStr for Decision {
    type Err = ValidationFailure;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approved" | "approve" => Ok(Self::Approved),
            "rejected" | "reject" => Ok(Self::Rejected),
            _ => Err(ValidationFailure::UnknownDecision { value: value.to_string() }),
        }
    }
}

impl TryFrom<String> for Decision {
    type Error = ValidationFailure;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub status: ReportStatus,
    pub actor: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReimbursementReport {
    pub id: ReportId,
    pub submitter: String,
    pub amount: Decimal,
    pub description: String,
    pub status: ReportStatus,
    pub submitted_at: DateTime<Utc>,
    pub history: Vec<HistoryEntry>,
}

impl ReimbursementReport {
    /// Builds a freshly submitted report whose history holds the submission entry.
    pub fn submitted(
        id: ReportId,
        submitter: String,
        amount: Decimal,
        description: String,
        at: DateTime<Utc>,
    ) -> Self {
        let history =
            vec![HistoryEntry { at, status: ReportStatus::Submitted, actor: submitter.clone() }];
        Self {
            id,
            submitter,
            amount,
            description,
            status: ReportStatus::Submitted,
            submitted_at: at,
            history,
        }
    }

    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        matches!(
            (self.status, next),
            (ReportStatus::Submitted, ReportStatus::Approved)
                | (ReportStatus::Submitted, ReportStatus::Rejected)
        )
    }

    /// Applies a decision. Status and history change together or not at all.
    pub fn apply_decision(
        &mut self,
        decision: Decision,
        actor: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let next = decision.status();
        if !self.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        self.history.push(HistoryEntry { at, status: next, actor: actor.into() });
        Ok(())
    }

    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        if self.status.is_terminal() {
            return self.history.last().map(|entry| entry.at);
        }
        None
    }

    pub fn decided_by(&self) -> Option<&str> {
        if self.status.is_terminal() {
            return self.history.last().map(|entry| entry.actor.as_str());
        }
        None
    }
}
