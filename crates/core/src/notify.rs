use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::NotificationConfig;
use crate::domain::report::{Decision, ReportId};

/// Sent to the submitter once a decision has been applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNotice {
    pub submitter: String,
    pub report_id: ReportId,
    pub decision: Decision,
}

impl DecisionNotice {
    pub fn subject(&self) -> String {
        let outcome = match self.decision {
            Decision::Approved => "Approved",
            Decision::Rejected => "Rejected",
        };
        format!("Reimbursement Report {outcome} - {}", self.report_id)
    }

    pub fn body(&self, review_base_url: Option<&str>) -> String {
        let mut body = format!("Report ID: {}\nDecision: {}\n", self.report_id, self.decision);
        if let Some(base_url) = review_base_url {
            body.push_str(&format!(
                "\nView the report at: {}/{}\n",
                base_url.trim_end_matches('/'),
                self.report_id
            ));
        }
        body
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("notification to `{recipient}` could not be delivered: {reason}")]
    Delivery { recipient: String, reason: String },
}

pub trait NotificationSender: Send + Sync {
    fn name(&self) -> &'static str;
    fn send(&self, notice: &DecisionNotice) -> Result<(), NotificationError>;
}

/// Emits the rendered notice as a structured log event.
#[derive(Clone, Debug, Default)]
pub struct LogNotificationSender {
    review_base_url: Option<String>,
}

impl LogNotificationSender {
    pub fn new(review_base_url: Option<String>) -> Self {
        Self { review_base_url }
    }
}

impl NotificationSender for LogNotificationSender {
    fn name(&self) -> &'static str {
        "log"
    }

    fn send(&self, notice: &DecisionNotice) -> Result<(), NotificationError> {
        tracing::info!(
            event_name = "notification.decision.sent",
            recipient = %notice.submitter,
            report_id = %notice.report_id,
            decision = %notice.decision,
            subject = %notice.subject(),
            body = %notice.body(self.review_base_url.as_deref()),
            "decision notice delivered"
        );
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct RecordingNotificationSender {
    notices: Arc<Mutex<Vec<DecisionNotice>>>,
}

impl RecordingNotificationSender {
    pub fn notices(&self) -> Vec<DecisionNotice> {
        match self.notices.lock() {
            Ok(notices) => notices.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NotificationSender for RecordingNotificationSender {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn send(&self, notice: &DecisionNotice) -> Result<(), NotificationError> {
        match self.notices.lock() {
            Ok(mut notices) => notices.push(notice.clone()),
            Err(poisoned) => poisoned.into_inner().push(notice.clone()),
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledNotificationSender;

impl NotificationSender for DisabledNotificationSender {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn send(&self, notice: &DecisionNotice) -> Result<(), NotificationError> {
        tracing::debug!(
            event_name = "notification.decision.skipped",
            report_id = %notice.report_id,
            "notifications are disabled"
        );
        Ok(())
    }
}

pub fn sender_from_config(config: &NotificationConfig) -> Arc<dyn NotificationSender> {
    if config.enabled {
        Arc::new(LogNotificationSender::new(config.review_base_url.clone()))
    } else {
        Arc::new(DisabledNotificationSender)
    }
}
