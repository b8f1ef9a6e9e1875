pub mod config;
pub mod replay;

use serde::Serialize;

/// Text printed to stdout and the process exit code for one CLI invocation.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum OutcomeStatus {
    Ok,
    Error,
}

/// Final JSON line of a command: what ran, whether it worked, and a stable error class if not.
#[derive(Debug, Serialize)]
struct CommandOutcome<'a> {
    command: &'a str,
    status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'a str>,
    message: String,
}

impl CommandResult {
    /// Plain-text output that exits successfully.
    pub fn text(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let outcome = CommandOutcome {
            command,
            status: OutcomeStatus::Ok,
            error_class: None,
            message: message.into(),
        };
        Self::text(to_json_line(&outcome))
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let outcome = CommandOutcome {
            command,
            status: OutcomeStatus::Error,
            error_class: Some(error_class),
            message: message.into(),
        };
        Self { exit_code, output: to_json_line(&outcome) }
    }

    /// Prepends per-item lines to this result, keeping its exit code.
    pub fn after_lines(self, mut lines: Vec<String>) -> Self {
        lines.push(self.output);
        Self { exit_code: self.exit_code, output: lines.join("\n") }
    }
}

pub(crate) fn to_json_line<T: Serialize>(payload: &T) -> String {
    match serde_json::to_string(payload) {
        Ok(line) => line,
        Err(error) => serde_json::json!({
            "command": "unknown",
            "status": "error",
            "error_class": "serialization",
            "message": error.to_string(),
        })
        .to_string(),
    }
}
