use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::report::{ReimbursementReport, ReportId, ReportStatus};

/// Row returned by report queries; the full history stays behind `ReimbursementService::report`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: ReportId,
    pub submitter: String,
    pub amount: Decimal,
    pub status: ReportStatus,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl From<&ReimbursementReport> for ReportSummary {
    fn from(report: &ReimbursementReport) -> Self {
        Self {
            id: report.id.clone(),
            submitter: report.submitter.clone(),
            amount: report.amount,
            status: report.status,
            submitted_at: report.submitted_at,
            decided_at: report.decided_at(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountTally {
    pub count: usize,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStatistics {
    pub total_reports: usize,
    pub total_amount: Decimal,
    pub average_amount: Decimal,
    pub by_status: BTreeMap<ReportStatus, AmountTally>,
    pub by_submitter: BTreeMap<String, Decimal>,
}

impl ReportStatistics {
    pub fn from_reports<'a>(
        reports: impl IntoIterator<Item = &'a ReimbursementReport>,
        amount_scale: u32,
    ) -> Self {
        let mut total_reports = 0usize;
        let mut total_amount = Decimal::ZERO;
        let mut by_status: BTreeMap<ReportStatus, AmountTally> = BTreeMap::new();
        let mut by_submitter: BTreeMap<String, Decimal> = BTreeMap::new();

        for report in reports {
            total_reports += 1;
            total_amount += report.amount;

            let breakdown = by_status.entry(report.status).or_default();
            breakdown.count += 1;
            breakdown.amount += report.amount;

            *by_submitter.entry(report.submitter.clone()).or_insert(Decimal::ZERO) +=
                report.amount;
        }

        let mut average_amount = if total_reports == 0 {
            Decimal::ZERO
        } else {
            (total_amount / Decimal::from(total_reports)).round_dp(amount_scale)
        };
        average_amount.rescale(amount_scale);
        total_amount.rescale(amount_scale);

        Self { total_reports, total_amount, average_amount, by_status, by_submitter }
    }
}

/// Bucket width for [`ReportTimeSeries`]. Weeks start on Monday; buckets follow UTC dates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingPeriod {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl ReportingPeriod {
    /// `YYYY-MM-DD` for daily and weekly buckets (the Monday of the week), `YYYY-MM` for months.
    pub fn bucket_key(&self, at: DateTime<Utc>) -> String {
        let date = at.date_naive();
        match self {
            Self::Daily => date.format("%Y-%m-%d").to_string(),
            Self::Weekly => {
                let offset = u64::from(date.weekday().num_days_from_monday());
                let monday = date.checked_sub_days(Days::new(offset)).unwrap_or(date);
                monday.format("%Y-%m-%d").to_string()
            }
            Self::Monthly => date.format("%Y-%m").to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTimeSeries {
    pub period: ReportingPeriod,
    pub buckets: BTreeMap<String, AmountTally>,
}

impl ReportTimeSeries {
    /// Groups reports by the bucket of their submission time. Empty buckets are omitted.
    pub fn from_reports<'a>(
        reports: impl IntoIterator<Item = &'a ReimbursementReport>,
        period: ReportingPeriod,
    ) -> Self {
        let mut buckets: BTreeMap<String, AmountTally> = BTreeMap::new();
        for report in reports {
            let bucket = buckets.entry(period.bucket_key(report.submitted_at)).or_default();
            bucket.count += 1;
            bucket.amount += report.amount;
        }

        Self { period, buckets }
    }
}
