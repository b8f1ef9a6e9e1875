use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::report::{ReportId, ReportStatus};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
    #[error("amount must not be negative (got {amount})")]
    NegativeAmount { amount: Decimal },
    #[error("amount {amount} exceeds the per-report ceiling of {max}")]
    AmountTooLarge { amount: Decimal, max: Decimal },
    #[error("amount {amount} carries more than {max_scale} fractional digits")]
    AmountPrecision { amount: Decimal, max_scale: u32 },
    #[error("description exceeds {max_chars} characters")]
    DescriptionTooLong { max_chars: usize },
    #[error("unknown report status `{value}` (expected SUBMITTED|APPROVED|REJECTED)")]
    UnknownStatus { value: String },
    #[error("unknown decision `{value}` (expected APPROVED|REJECTED)")]
    UnknownDecision { value: String },
}

impl ValidationFailure {
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyField { field } => *field,
            Self::NegativeAmount { .. }
            | Self::AmountTooLarge { .. }
            | Self::AmountPrecision { .. } => "amount",
            Self::DescriptionTooLong { .. } => "description",
            Self::UnknownStatus { .. } => "status",
            Self::UnknownDecision { .. } => "decision",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationFailure),
    #[error("report `{id}` was not found")]
    NotFound { id: ReportId },
    #[error("report `{id}` cannot move from {from} to {to}")]
    InvalidTransition { id: ReportId, from: ReportStatus, to: ReportStatus },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<ConfigError> for ApplicationError {
    fn from(error: ConfigError) -> Self {
        Self::Configuration(error.to_string())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NotFound { .. } => "The requested reimbursement report does not exist.",
            Self::Conflict { .. } => "The reimbursement report has already been decided.",
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Internal { .. } => "internal",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::Conflict { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error @ DomainError::Validation(_)) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::Domain(error @ DomainError::NotFound { .. }) => {
                Self::NotFound { message: error.to_string(), correlation_id }
            }
            ApplicationError::Domain(error @ DomainError::InvalidTransition { .. }) => {
                Self::Conflict { message: error.to_string(), correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}
