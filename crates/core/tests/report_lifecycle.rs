use std::sync::Arc;

use rust_decimal::Decimal;

use reimbly_core::{
    AuditEventKind, AuditOutcome, Decision, DomainError, InMemoryAuditSink, RecordingNotificationSender,
    ReimbursementService, ReportFilter, ReportStatus, ReportStore, RequestContext,
    SubmissionRules,
};

fn service() -> (ReimbursementService, RecordingNotificationSender, InMemoryAuditSink) {
    let notifier = RecordingNotificationSender::default();
    let audit = InMemoryAuditSink::default();
    let service = ReimbursementService::new(
        Arc::new(ReportStore::new(SubmissionRules::default())),
        Arc::new(notifier.clone()),
        Arc::new(audit.clone()),
    );
    (service, notifier, audit)
}

#[test]
fn taxi_claim_is_approved_with_full_history() {
    let (service, notifier, _audit) = service();
    let ctx = RequestContext::new("scenario-taxi");

    let id = service
        .submit_report(&ctx, "alice@example.com", "42.50".parse().expect("decimal"), "taxi")
        .expect("submit");
    service.decide_report(&ctx, &id, Decision::Approved, "bob@example.com").expect("approve");

    let report = service.report(&id).expect("report exists");
    assert_eq!(report.status, ReportStatus::Approved);
    assert_eq!(report.amount, Decimal::new(4250, 2));

    let history: Vec<(ReportStatus, &str)> =
        report.history.iter().map(|entry| (entry.status, entry.actor.as_str())).collect();
    assert_eq!(
        history,
        vec![
            (ReportStatus::Submitted, "alice@example.com"),
            (ReportStatus::Approved, "bob@example.com"),
        ]
    );
    assert!(report.history[0].at <= report.history[1].at);

    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].submitter, "alice@example.com");
    assert_eq!(notices[0].report_id, id);
}

#[test]
fn second_decision_fails_and_first_outcome_stands() {
    let (service, _notifier, audit) = service();
    let ctx = RequestContext::generate();

    let id = service
        .submit_report(&ctx, "alice@example.com", Decimal::new(1999, 2), "hotel night")
        .expect("submit");
    service.decide_report(&ctx, &id, Decision::Rejected, "bob@example.com").expect("reject");

    let error = service
        .decide_report(&ctx, &id, Decision::Approved, "carol@example.com")
        .expect_err("terminal report");
    assert_eq!(
        error,
        DomainError::InvalidTransition {
            id: id.clone(),
            from: ReportStatus::Rejected,
            to: ReportStatus::Approved,
        }
    );

    let report = service.report(&id).expect("report");
    assert_eq!(report.status, ReportStatus::Rejected);
    assert_eq!(report.history.len(), 2);
    assert!(audit
        .events()
        .iter()
        .any(|event| event.event_type == AuditEventKind::DecideRejected
            && event.outcome() == AuditOutcome::Rejected));
}

#[test]
fn each_decision_grows_history_by_one() {
    let (service, _notifier, _audit) = service();
    let ctx = RequestContext::generate();

    for (n, decision) in [Decision::Approved, Decision::Rejected].into_iter().enumerate() {
        let id = service
            .submit_report(&ctx, "dana@example.com", Decimal::from(n as u64 + 1), "supplies")
            .expect("submit");
        let before = service.report(&id).expect("before").history.len();
        service.decide_report(&ctx, &id, decision, "erin@example.com").expect("decide");
        let after = service.report(&id).expect("after");

        assert_eq!(after.status, decision.status());
        assert_eq!(after.history.len(), before + 1);
    }
}

#[test]
fn submitter_query_returns_exact_subset_in_order() {
    let (service, _notifier, _audit) = service();
    let ctx = RequestContext::generate();
    let submitters = [
        "alice@example.com",
        "bob@example.com",
        "alice@example.com",
        "carol@example.com",
        "alice@example.com",
    ];

    let ids: Vec<_> = submitters
        .iter()
        .map(|submitter| {
            service.submit_report(&ctx, submitter, Decimal::ONE, "expense").expect("submit")
        })
        .collect();

    let alice: Vec<_> = service
        .query_reports(&ReportFilter::all().by_submitter("alice@example.com"))
        .into_iter()
        .map(|summary| summary.id)
        .collect();
    assert_eq!(alice, vec![ids[0].clone(), ids[2].clone(), ids[4].clone()]);

    assert_eq!(service.query_reports(&ReportFilter::all()).len(), submitters.len());
    assert!(service
        .query_reports(&ReportFilter::all().by_submitter("zed@example.com"))
        .is_empty());
}
