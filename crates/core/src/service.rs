//! Operations exposed to orchestration layers: submit, decide and query reports.
//!
//! The service owns the collaborator wiring around [`ReportStore`]. Decisions are committed before
//! the submitter is notified, and a failed notification is logged and audited without undoing or
//! failing the decision.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::audit::{AuditEvent, AuditEventKind, AuditSink};
use crate::config::AppConfig;
use crate::domain::report::{Decision, ReimbursementReport, ReportId};
use crate::errors::DomainError;
use crate::notify::{sender_from_config, DecisionNotice, NotificationSender};
use crate::reporting::{ReportStatistics, ReportSummary, ReportTimeSeries, ReportingPeriod};
use crate::store::{ReportFilter, ReportStore, SubmissionRules};

/// Per-call correlation carried into logs and audit events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub correlation_id: String,
}

impl RequestContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self { correlation_id: correlation_id.into() }
    }

    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}

pub struct ReimbursementService {
    store: Arc<ReportStore>,
    notifier: Arc<dyn NotificationSender>,
    audit: Arc<dyn AuditSink>,
}

impl ReimbursementService {
    pub fn new(
        store: Arc<ReportStore>,
        notifier: Arc<dyn NotificationSender>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { store, notifier, audit }
    }

    /// Wires a fresh store and the configured notification sender.
    pub fn from_config(config: &AppConfig, audit: Arc<dyn AuditSink>) -> Self {
        let store = Arc::new(ReportStore::new(SubmissionRules::from(&config.reports)));
        Self::new(store, sender_from_config(&config.notifications), audit)
    }

    pub fn store(&self) -> &Arc<ReportStore> {
        &self.store
    }

    pub fn submit_report(
        &self,
        ctx: &RequestContext,
        submitter: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<ReportId, DomainError> {
        match self.store.submit(submitter, amount, description) {
            Ok(id) => {
                tracing::info!(
                    event_name = "report.submitted",
                    correlation_id = %ctx.correlation_id,
                    report_id = %id,
                    "reimbursement report submitted"
                );
                self.audit.emit(
                    AuditEvent::new(
                        AuditEventKind::ReportSubmitted,
                        &ctx.correlation_id,
                        submitter.trim(),
                    )
                    .for_report(&id)
                    .with_metadata("amount", amount.to_string()),
                );
                Ok(id)
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "report.submit_rejected",
                    correlation_id = %ctx.correlation_id,
                    error = %error,
                    "reimbursement report submission rejected"
                );
                self.audit.emit(
                    AuditEvent::new(
                        AuditEventKind::SubmitRejected,
                        &ctx.correlation_id,
                        submitter.trim(),
                    )
                    .with_metadata("error", error.to_string()),
                );
                Err(error)
            }
        }
    }

    pub fn decide_report(
        &self,
        ctx: &RequestContext,
        report_id: &ReportId,
        decision: Decision,
        actor: &str,
    ) -> Result<(), DomainError> {
        if let Err(error) = self.store.decide(report_id, decision, actor) {
            tracing::warn!(
                event_name = "report.decide_rejected",
                correlation_id = %ctx.correlation_id,
                report_id = %report_id,
                decision = %decision,
                error = %error,
                "reimbursement decision rejected"
            );
            self.audit.emit(
                AuditEvent::new(AuditEventKind::DecideRejected, &ctx.correlation_id, actor.trim())
                    .for_report(report_id)
                    .with_metadata("decision", decision.to_string())
                    .with_metadata("error", error.to_string()),
            );
            return Err(error);
        }

        tracing::info!(
            event_name = "report.decided",
            correlation_id = %ctx.correlation_id,
            report_id = %report_id,
            decision = %decision,
            "reimbursement report decided"
        );
        self.audit.emit(
            AuditEvent::new(AuditEventKind::ReportDecided, &ctx.correlation_id, actor.trim())
                .for_report(report_id)
                .with_metadata("decision", decision.to_string()),
        );

        // Reports are never removed and their submitter is immutable.
        let report = self.store.get(report_id)?;
        self.notify(ctx, DecisionNotice { submitter: report.submitter, report_id: report.id, decision });
        Ok(())
    }

    pub fn query_reports(&self, filter: &ReportFilter) -> Vec<ReportSummary> {
        self.store.list(filter.clone()).iter().map(ReportSummary::from).collect()
    }

    pub fn report(&self, report_id: &ReportId) -> Result<ReimbursementReport, DomainError> {
        self.store.get(report_id)
    }

    pub fn summarize(&self, filter: &ReportFilter) -> ReportStatistics {
        let listing = self.store.list(filter.clone());
        ReportStatistics::from_reports(&listing, self.store.rules().amount_scale)
    }

    pub fn time_series(&self, filter: &ReportFilter, period: ReportingPeriod) -> ReportTimeSeries {
        ReportTimeSeries::from_reports(&self.store.list(filter.clone()), period)
    }

    fn notify(&self, ctx: &RequestContext, notice: DecisionNotice) {
        let outcome = self.notifier.send(&notice);
        let kind = match &outcome {
            Ok(()) => AuditEventKind::NotificationSent,
            Err(_) => AuditEventKind::NotificationFailed,
        };

        let mut event = AuditEvent::new(kind, &ctx.correlation_id, self.notifier.name())
            .for_report(&notice.report_id)
            .with_metadata("recipient", notice.submitter.clone());

        if let Err(error) = outcome {
            tracing::warn!(
                event_name = "notification.failed",
                correlation_id = %ctx.correlation_id,
                report_id = %notice.report_id,
                sender = self.notifier.name(),
                error = %error,
                "decision notice could not be delivered; decision stands"
            );
            event = event.with_metadata("error", error.to_string());
        }

        self.audit.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::{ReimbursementService, RequestContext};
    use crate::audit::{AuditCategory, AuditEventKind, AuditOutcome, InMemoryAuditSink};
    use crate::config::AppConfig;
    use crate::domain::report::{Decision, ReportStatus};
    use crate::errors::DomainError;
    use crate::notify::{
        DecisionNotice, NotificationError, NotificationSender, RecordingNotificationSender,
    };
    use crate::reporting::ReportingPeriod;
    use crate::store::{ReportFilter, ReportStore, SubmissionRules};

    struct FailingSender;

    impl NotificationSender for FailingSender {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn send(&self, notice: &DecisionNotice) -> Result<(), NotificationError> {
            Err(NotificationError::Delivery {
                recipient: notice.submitter.clone(),
                reason: "smtp relay refused connection".to_string(),
            })
        }
    }

    fn service_with(
        notifier: Arc<dyn NotificationSender>,
    ) -> (ReimbursementService, InMemoryAuditSink) {
        let audit = InMemoryAuditSink::default();
        let service = ReimbursementService::new(
            Arc::new(ReportStore::new(SubmissionRules::default())),
            notifier,
            Arc::new(audit.clone()),
        );
        (service, audit)
    }

    #[test]
    fn decision_notifies_submitter_after_commit() {
        let sender = RecordingNotificationSender::default();
        let (service, _audit) = service_with(Arc::new(sender.clone()));
        let ctx = RequestContext::new("req-1");

        let id = service
            .submit_report(&ctx, "alice@example.com", Decimal::new(4250, 2), "taxi")
            .expect("submit");
        assert!(sender.notices().is_empty(), "submission does not notify");

        service.decide_report(&ctx, &id, Decision::Approved, "bob@example.com").expect("decide");

        assert_eq!(
            sender.notices(),
            vec![DecisionNotice {
                submitter: "alice@example.com".to_string(),
                report_id: id,
                decision: Decision::Approved,
            }]
        );
    }

    #[test]
    fn failed_decision_sends_no_notice() {
        let sender = RecordingNotificationSender::default();
        let (service, _audit) = service_with(Arc::new(sender.clone()));
        let ctx = RequestContext::generate();

        let id = service
            .submit_report(&ctx, "alice@example.com", Decimal::ONE, "taxi")
            .expect("submit");
        service.decide_report(&ctx, &id, Decision::Rejected, "bob@example.com").expect("reject");
        let error = service
            .decide_report(&ctx, &id, Decision::Approved, "bob@example.com")
            .expect_err("second decision");

        assert!(matches!(error, DomainError::InvalidTransition { .. }));
        assert_eq!(sender.notices().len(), 1);
    }

    #[test]
    fn notification_failure_does_not_fail_the_decision() {
        let (service, audit) = service_with(Arc::new(FailingSender));
        let ctx = RequestContext::new("req-7");

        let id = service
            .submit_report(&ctx, "alice@example.com", Decimal::ONE, "taxi")
            .expect("submit");
        service
            .decide_report(&ctx, &id, Decision::Approved, "bob@example.com")
            .expect("decision stands despite notifier failure");

        assert_eq!(service.report(&id).expect("report").status, ReportStatus::Approved);

        let failure = audit
            .events()
            .into_iter()
            .find(|event| event.category() == AuditCategory::Notification)
            .expect("notification audit event");
        assert_eq!(failure.event_type, AuditEventKind::NotificationFailed);
        assert_eq!(failure.outcome(), AuditOutcome::Failed);
        assert_eq!(failure.actor, "failing");
        assert_eq!(failure.correlation_id, "req-7");
        assert!(failure.metadata["error"].contains("smtp relay refused"));
    }

    #[test]
    fn audit_trail_follows_the_lifecycle() {
        let (service, audit) = service_with(Arc::new(RecordingNotificationSender::default()));
        let ctx = RequestContext::new("req-2");

        assert!(service.submit_report(&ctx, "", Decimal::ONE, "taxi").is_err());
        let id = service
            .submit_report(&ctx, "alice@example.com", Decimal::ONE, "taxi")
            .expect("submit");
        service.decide_report(&ctx, &id, Decision::Approved, "bob@example.com").expect("decide");

        let trail: Vec<AuditEventKind> =
            audit.events().into_iter().map(|event| event.event_type).collect();
        assert_eq!(
            trail,
            vec![
                AuditEventKind::SubmitRejected,
                AuditEventKind::ReportSubmitted,
                AuditEventKind::ReportDecided,
                AuditEventKind::NotificationSent,
            ]
        );
        assert!(audit.events().iter().all(|event| event.correlation_id == "req-2"));
    }

    #[test]
    fn queries_and_statistics_share_the_filter() {
        let (service, _audit) = service_with(Arc::new(RecordingNotificationSender::default()));
        let ctx = RequestContext::generate();

        let first = service
            .submit_report(&ctx, "alice@example.com", Decimal::new(1000, 2), "taxi")
            .expect("submit");
        service
            .submit_report(&ctx, "bob@example.com", Decimal::new(500, 2), "lunch")
            .expect("submit");
        service
            .submit_report(&ctx, "alice@example.com", Decimal::new(2000, 2), "hotel")
            .expect("submit");
        service.decide_report(&ctx, &first, Decision::Approved, "carol@example.com").expect("ok");

        let alice = ReportFilter::all().by_submitter("alice@example.com");
        let summaries = service.query_reports(&alice);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, first);
        assert_eq!(summaries[0].status, ReportStatus::Approved);
        assert!(summaries[0].decided_at.is_some());

        let stats = service.summarize(&alice);
        assert_eq!(stats.total_reports, 2);
        assert_eq!(stats.total_amount.to_string(), "30.00");
        assert_eq!(stats.average_amount.to_string(), "15.00");
    }

    #[test]
    fn time_series_buckets_the_filtered_reports() {
        let (service, _audit) = service_with(Arc::new(RecordingNotificationSender::default()));
        let ctx = RequestContext::generate();

        service.submit_report(&ctx, "alice@example.com", Decimal::new(1200, 2), "taxi").expect("ok");
        service.submit_report(&ctx, "alice@example.com", Decimal::new(300, 2), "bus").expect("ok");
        service.submit_report(&ctx, "bob@example.com", Decimal::new(9900, 2), "hotel").expect("ok");

        let filter = ReportFilter::all().amount_between(None, Some(Decimal::new(5000, 2)));
        let series = service.time_series(&filter, ReportingPeriod::Monthly);

        assert_eq!(series.period, ReportingPeriod::Monthly);
        let totals: Vec<(usize, Decimal)> =
            series.buckets.values().map(|bucket| (bucket.count, bucket.amount)).collect();
        // Submissions made around midnight at month end may straddle two buckets.
        assert_eq!(totals.iter().map(|(count, _)| count).sum::<usize>(), 2);
        assert_eq!(
            totals.iter().map(|(_, amount)| *amount).sum::<Decimal>(),
            Decimal::new(1500, 2)
        );
    }

    #[test]
    fn from_config_applies_report_rules() {
        let mut config = AppConfig::default();
        config.reports.amount_scale = 0;
        config.notifications.enabled = false;

        let service = ReimbursementService::from_config(&config, Arc::new(InMemoryAuditSink::default()));
        let ctx = RequestContext::generate();

        assert!(service.submit_report(&ctx, "alice@example.com", Decimal::new(15, 1), "taxi").is_err());
        let id = service
            .submit_report(&ctx, "alice@example.com", Decimal::new(2, 0), "taxi")
            .expect("whole amount");
        service.decide_report(&ctx, &id, Decision::Approved, "bob@example.com").expect("decide");
        assert_eq!(service.store().len(), 1);
    }
}
