//! Audit trail of report mutations and notification attempts.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::report::ReportId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    Ingress,
    Lifecycle,
    Notification,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Rejected,
    Failed,
}

/// Every event the service records. Category and outcome follow from the kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AuditEventKind {
    #[serde(rename = "report.submitted")]
    ReportSubmitted,
    #[serde(rename = "report.submit_rejected")]
    SubmitRejected,
    #[serde(rename = "report.decided")]
    ReportDecided,
    #[serde(rename = "report.decide_rejected")]
    DecideRejected,
    #[serde(rename = "notification.sent")]
    NotificationSent,
    #[serde(rename = "notification.failed")]
    NotificationFailed,
}

impl AuditEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReportSubmitted => "report.submitted",
            Self::SubmitRejected => "report.submit_rejected",
            Self::ReportDecided => "report.decided",
            Self::DecideRejected => "report.decide_rejected",
            Self::NotificationSent => "notification.sent",
            Self::NotificationFailed => "notification.failed",
        }
    }

    pub fn category(&self) -> AuditCategory {
        match self {
            Self::ReportSubmitted | Self::SubmitRejected => AuditCategory::Ingress,
            Self::ReportDecided | Self::DecideRejected => AuditCategory::Lifecycle,
            Self::NotificationSent | Self::NotificationFailed => AuditCategory::Notification,
        }
    }

    pub fn outcome(&self) -> AuditOutcome {
        match self {
            Self::ReportSubmitted | Self::ReportDecided | Self::NotificationSent => {
                AuditOutcome::Success
            }
            Self::SubmitRejected | Self::DecideRejected => AuditOutcome::Rejected,
            Self::NotificationFailed => AuditOutcome::Failed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub event_type: AuditEventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<ReportId>,
    pub correlation_id: String,
    pub actor: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<&'static str, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(kind: AuditEventKind, correlation_id: &str, actor: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: kind,
            report_id: None,
            correlation_id: correlation_id.to_string(),
            actor: actor.into(),
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn for_report(mut self, report_id: &ReportId) -> Self {
        self.report_id = Some(report_id.clone());
        self
    }

    pub fn with_metadata(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.metadata.insert(key, value.into());
        self
    }

    pub fn category(&self) -> AuditCategory {
        self.event_type.category()
    }

    pub fn outcome(&self) -> AuditOutcome {
        self.event_type.outcome()
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

/// Shared event log; clones append to and read from the same trail.
#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AuditEvent>> {
        match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        self.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AuditCategory, AuditEvent, AuditEventKind, AuditOutcome, AuditSink, InMemoryAuditSink,
    };
    use crate::domain::report::ReportId;

    #[test]
    fn kinds_imply_category_and_outcome() {
        assert_eq!(AuditEventKind::SubmitRejected.category(), AuditCategory::Ingress);
        assert_eq!(AuditEventKind::SubmitRejected.outcome(), AuditOutcome::Rejected);
        assert_eq!(AuditEventKind::ReportDecided.category(), AuditCategory::Lifecycle);
        assert_eq!(AuditEventKind::NotificationFailed.outcome(), AuditOutcome::Failed);
    }

    #[test]
    fn events_serialize_with_dotted_type_and_sparse_fields() {
        let event = AuditEvent::new(AuditEventKind::ReportDecided, "req-123", "bob@example.com")
            .for_report(&ReportId("RMB-0042".to_owned()))
            .with_metadata("decision", "APPROVED");

        let json = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(json["event_type"], AuditEventKind::ReportDecided.as_str());
        assert_eq!(json["report_id"], "RMB-0042");
        assert_eq!(json["metadata"]["decision"], "APPROVED");

        let bare = serde_json::to_value(AuditEvent::new(
            AuditEventKind::SubmitRejected,
            "req-9",
            "alice@example.com",
        ))
        .expect("serialize event");
        assert!(bare.get("report_id").is_none());
        assert!(bare.get("metadata").is_none());
    }

    #[test]
    fn clones_share_one_event_log() {
        let sink = InMemoryAuditSink::default();
        sink.clone().emit(AuditEvent::new(AuditEventKind::ReportSubmitted, "req-1", "alice"));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].correlation_id, "req-1");
    }
}
