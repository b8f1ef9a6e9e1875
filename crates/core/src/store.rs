//! Process-lifetime, in-memory store of reimbursement reports.
//!
//! A single exclusive lock covers the whole store, so every `submit` and `decide` is one
//! atomic critical section and transitions on a given report are linearizable. Reports are kept
//! behind `Arc` so listings can snapshot cheaply; a decision copies the report on write when a
//! snapshot still references it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ReportsConfig;
use crate::domain::report::{Decision, ReimbursementReport, ReportId, ReportStatus};
use crate::errors::{DomainError, ValidationFailure};

/// Largest amount a single report may claim.
///
/// Summed over every report the process could hold, totals stay inside `Decimal`'s range.
pub const MAX_REPORT_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Input rules applied to every submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmissionRules {
    pub amount_scale: u32,
    pub max_description_chars: usize,
}

impl Default for SubmissionRules {
    fn default() -> Self {
        Self { amount_scale: 2, max_description_chars: 2_000 }
    }
}

impl From<&ReportsConfig> for SubmissionRules {
    fn from(config: &ReportsConfig) -> Self {
        Self {
            amount_scale: config.amount_scale,
            max_description_chars: config.max_description_chars,
        }
    }
}

/// Conjunction of optional criteria; bounds are inclusive and an empty filter matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub submitter: Option<String>,
    pub status: Option<ReportStatus>,
    pub submitted_from: Option<DateTime<Utc>>,
    pub submitted_to: Option<DateTime<Utc>>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

impl ReportFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_submitter(mut self, submitter: impl Into<String>) -> Self {
        self.submitter = Some(submitter.into());
        self
    }

    pub fn with_status(mut self, status: ReportStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn submitted_between(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.submitted_from = from;
        self.submitted_to = to;
        self
    }

    pub fn amount_between(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_amount = min;
        self.max_amount = max;
        self
    }

    pub fn matches(&self, report: &ReimbursementReport) -> bool {
        let submitter_matches =
            self.submitter.as_deref().map_or(true, |submitter| report.submitter == submitter);
        let status_matches = self.status.map_or(true, |status| report.status == status);
        let submitted = report.submitted_at;
        let window_matches = self.submitted_from.map_or(true, |from| submitted >= from)
            && self.submitted_to.map_or(true, |to| submitted <= to);
        let amount_matches = self.min_amount.map_or(true, |min| report.amount >= min)
            && self.max_amount.map_or(true, |max| report.amount <= max);

        submitter_matches && status_matches && window_matches && amount_matches
    }
}

/// Snapshot of the store taken by [`ReportStore::list`].
///
/// Filtering happens lazily while iterating, and `iter` may be called any number of times.
#[derive(Clone, Debug)]
pub struct ReportListing {
    snapshot: Vec<Arc<ReimbursementReport>>,
    filter: ReportFilter,
}

impl ReportListing {
    pub fn iter(&self) -> impl Iterator<Item = &ReimbursementReport> + '_ {
        self.snapshot
            .iter()
            .map(|report| report.as_ref())
            .filter(move |report| self.filter.matches(report))
    }

    pub fn filter(&self) -> &ReportFilter {
        &self.filter
    }

    pub fn to_vec(&self) -> Vec<ReimbursementReport> {
        self.iter().cloned().collect()
    }
}

impl<'a> IntoIterator for &'a ReportListing {
    type Item = &'a ReimbursementReport;
    type IntoIter = Box<dyn Iterator<Item = &'a ReimbursementReport> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[derive(Default)]
struct StoreState {
    reports: Vec<Arc<ReimbursementReport>>,
    index: HashMap<ReportId, usize>,
}

#[derive(Default)]
pub struct ReportStore {
    rules: SubmissionRules,
    state: Mutex<StoreState>,
}

impl ReportStore {
    pub fn new(rules: SubmissionRules) -> Self {
        Self { rules, state: Mutex::new(StoreState::default()) }
    }

    pub fn rules(&self) -> SubmissionRules {
        self.rules
    }

    pub fn submit(
        &self,
        submitter: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<ReportId, DomainError> {
        let submitter = required("submitter", submitter)?;
        let description = required("description", description)?;
        if description.chars().count() > self.rules.max_description_chars {
            return Err(ValidationFailure::DescriptionTooLong {
                max_chars: self.rules.max_description_chars,
            }
            .into());
        }
        let amount = self.normalize_amount(amount)?;

        let mut state = self.lock();
        let mut id = ReportId::generate();
        while state.index.contains_key(&id) {
            id = ReportId::generate();
        }

        let report = ReimbursementReport::submitted(
            id.clone(),
            submitter.to_string(),
            amount,
            description.to_string(),
            Utc::now(),
        );
        let position = state.reports.len();
        state.index.insert(id.clone(), position);
        state.reports.push(Arc::new(report));

        tracing::debug!(
            event_name = "store.report.submitted",
            report_id = %id,
            submitter,
            amount = %amount,
            "reimbursement report recorded"
        );
        Ok(id)
    }

    pub fn decide(&self, id: &ReportId, decision: Decision, actor: &str) -> Result<(), DomainError> {
        let actor = required("actor", actor)?;

        let mut state = self.lock();
        let Some(&position) = state.index.get(id) else {
            return Err(DomainError::NotFound { id: id.clone() });
        };

        let current = &state.reports[position];
        if !current.can_transition_to(decision.status()) {
            return Err(DomainError::InvalidTransition {
                id: id.clone(),
                from: current.status,
                to: decision.status(),
            });
        }

        Arc::make_mut(&mut state.reports[position]).apply_decision(decision, actor, Utc::now())?;

        tracing::debug!(
            event_name = "store.report.decided",
            report_id = %id,
            decision = %decision,
            actor,
            "reimbursement report decided"
        );
        Ok(())
    }

    pub fn get(&self, id: &ReportId) -> Result<ReimbursementReport, DomainError> {
        let state = self.lock();
        state
            .index
            .get(id)
            .map(|&position| state.reports[position].as_ref().clone())
            .ok_or_else(|| DomainError::NotFound { id: id.clone() })
    }

    pub fn list(&self, filter: ReportFilter) -> ReportListing {
        let snapshot = self.lock().reports.clone();
        ReportListing { snapshot, filter }
    }

    pub fn len(&self) -> usize {
        self.lock().reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn normalize_amount(&self, amount: Decimal) -> Result<Decimal, ValidationFailure> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ValidationFailure::NegativeAmount { amount });
        }
        if amount > MAX_REPORT_AMOUNT {
            return Err(ValidationFailure::AmountTooLarge { amount, max: MAX_REPORT_AMOUNT });
        }
        if amount.normalize().scale() > self.rules.amount_scale {
            return Err(ValidationFailure::AmountPrecision {
                amount,
                max_scale: self.rules.amount_scale,
            });
        }

        // -0 is folded into 0 before rescaling.
        let mut normalized = if amount.is_zero() { Decimal::ZERO } else { amount };
        normalized.rescale(self.rules.amount_scale);
        Ok(normalized)
    }

    // Mutations validate before touching state, so a poisoned lock still guards a consistent store.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationFailure> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationFailure::EmptyField { field });
    }
    Ok(trimmed)
}
