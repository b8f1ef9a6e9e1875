//! In-memory reimbursement report workflow: submit, decide, query.
//!
//! [`store::ReportStore`] holds every report for the lifetime of the process and enforces the
//! `SUBMITTED -> APPROVED | REJECTED` lifecycle. [`service::ReimbursementService`] wraps it with
//! the collaborator seams an orchestration layer needs: decision notices and an audit trail.

pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod notify;
pub mod reporting;
pub mod service;
pub mod store;

pub use audit::{
    AuditCategory, AuditEvent, AuditEventKind, AuditOutcome, AuditSink, InMemoryAuditSink,
};
pub use domain::report::{Decision, HistoryEntry, ReimbursementReport, ReportId, ReportStatus};
pub use errors::{ApplicationError, DomainError, InterfaceError, ValidationFailure};
pub use notify::{
    DecisionNotice, DisabledNotificationSender, LogNotificationSender, NotificationError,
    NotificationSender, RecordingNotificationSender,
};
pub use reporting::{
    AmountTally, ReportStatistics, ReportSummary, ReportTimeSeries, ReportingPeriod,
};
pub use service::{ReimbursementService, RequestContext};
pub use store::{ReportFilter, ReportListing, ReportStore, SubmissionRules, MAX_REPORT_AMOUNT};
