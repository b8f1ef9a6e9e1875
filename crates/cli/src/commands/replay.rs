//! Replays a JSON-lines operation log against a fresh in-memory service.
//!
//! Each non-blank line not starting with `#` holds one operation tagged by `op`:
//!
//! ```text
//! {"op":"submit","submitter":"alice@example.com","amount":"42.50","description":"taxi"}
//! {"op":"decide","report":"#0","decision":"APPROVED","actor":"bob@example.com"}
//! {"op":"get","report":"#0"}
//! {"op":"query","submitter":"alice@example.com","min_amount":"10.00"}
//! {"op":"summarize","status":"approved","submitted_from":"2026-03-01T00:00:00Z"}
//! {"op":"time_series","period":"weekly","max_amount":"500"}
//! ```
//!
//! `#N` refers to the id returned by the N-th successful submission of this replay; any other
//! value is taken as a literal report id.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use reimbly_core::config::{AppConfig, LoadOptions};
use reimbly_core::{
    ApplicationError, AuditEvent, Decision, InMemoryAuditSink, ReimbursementService,
    ReportFilter, ReportId, ReportingPeriod, RequestContext,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{to_json_line, CommandResult};

const COMMAND: &str = "replay";

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Operation {
    Submit { submitter: String, amount: Decimal, description: String },
    Decide { report: String, decision: Decision, actor: String },
    Get { report: String },
    Query(ReportFilter),
    Summarize(ReportFilter),
    TimeSeries {
        #[serde(default)]
        period: ReportingPeriod,
        #[serde(flatten)]
        filter: ReportFilter,
    },
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::Decide { .. } => "decide",
            Self::Get { .. } => "get",
            Self::Query(_) => "query",
            Self::Summarize(_) => "summarize",
            Self::TimeSeries { .. } => "time_series",
        }
    }
}

#[derive(Debug, Serialize)]
struct OperationRecord {
    line: usize,
    op: &'static str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct AuditLine<'a> {
    audit: &'a AuditEvent,
}

pub fn run(path: &Path, include_audit: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };
    crate::init_logging(&config);

    run_with_config(&config, path, include_audit)
}

pub fn run_with_config(config: &AppConfig, path: &Path, include_audit: bool) -> CommandResult {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "operation_log_unreadable",
                format!("could not read `{}`: {error}", path.display()),
                3,
            )
        }
    };

    let operations = match parse_log(&raw) {
        Ok(operations) => operations,
        Err(message) => {
            return CommandResult::failure(COMMAND, "invalid_operation_log", message, 3)
        }
    };

    let audit = InMemoryAuditSink::default();
    let mut replay = Replay {
        service: ReimbursementService::from_config(config, Arc::new(audit.clone())),
        submitted: Vec::new(),
    };

    let total = operations.len();
    let mut failed = 0usize;
    let mut lines = Vec::with_capacity(total + 1);

    for (line, operation) in operations {
        let ctx = RequestContext::new(format!("replay-line-{line}"));
        let op = operation.name();
        let record = match replay.apply(&ctx, operation) {
            Ok(result) => OperationRecord {
                line,
                op,
                status: "ok",
                result: Some(result),
                error_class: None,
                message: None,
            },
            Err(error) => {
                failed += 1;
                let interface = error.into_interface(ctx.correlation_id.clone());
                OperationRecord {
                    line,
                    op,
                    status: "error",
                    result: None,
                    error_class: Some(interface.error_class()),
                    message: Some(interface.to_string()),
                }
            }
        };
        lines.push(to_json_line(&record));
    }

    if include_audit {
        lines.extend(audit.events().iter().map(|event| to_json_line(&AuditLine { audit: event })));
    }

    tracing::info!(
        event_name = "cli.replay.completed",
        correlation_id = "replay",
        operations = total,
        failed,
        "operation log replayed"
    );

    CommandResult::success(COMMAND, format!("replayed {total} operations ({failed} failed)"))
        .after_lines(lines)
}

fn parse_log(raw: &str) -> Result<Vec<(usize, Operation)>, String> {
    raw.lines()
        .enumerate()
        .map(|(index, text)| (index + 1, text.trim()))
        .filter(|(_, text)| !text.is_empty() && !text.starts_with('#'))
        .map(|(line, text)| {
            serde_json::from_str::<Operation>(text)
                .map(|operation| (line, operation))
                .map_err(|error| format!("line {line}: {error}"))
        })
        .collect()
}

struct Replay {
    service: ReimbursementService,
    submitted: Vec<ReportId>,
}

impl Replay {
    fn apply(
        &mut self,
        ctx: &RequestContext,
        operation: Operation,
    ) -> Result<Value, ApplicationError> {
        match operation {
            Operation::Submit { submitter, amount, description } => {
                let id = self.service.submit_report(ctx, &submitter, amount, &description)?;
                self.submitted.push(id.clone());
                Ok(json!({ "report_id": id.to_string() }))
            }
            Operation::Decide { report, decision, actor } => {
                let id = self.resolve(&report);
                self.service.decide_report(ctx, &id, decision, &actor)?;
                Ok(json!({ "report_id": id.to_string(), "status": decision.status().as_str() }))
            }
            Operation::Get { report } => {
                let report = self.service.report(&self.resolve(&report))?;
                Ok(encode(&report))
            }
            Operation::Query(filter) => Ok(encode(&self.service.query_reports(&filter))),
            Operation::Summarize(filter) => Ok(encode(&self.service.summarize(&filter))),
            Operation::TimeSeries { period, filter } => {
                Ok(encode(&self.service.time_series(&filter, period)))
            }
        }
    }

    fn resolve(&self, reference: &str) -> ReportId {
        reference
            .strip_prefix('#')
            .and_then(|index| index.parse::<usize>().ok())
            .and_then(|index| self.submitted.get(index).cloned())
            .unwrap_or_else(|| ReportId(reference.to_string()))
    }
}

fn encode<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|error| json!({ "encode_error": error.to_string() }))
}
