use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info};
use uuid::Uuid;

const TELEMETRY_TARGET: &str = "netscope::events::telemetry";

pub const CMD_LOAD_GRAPH: &str = "LoadGraph";
pub const CMD_SET_DIRECTION: &str = "SetDirection";
pub const CMD_TOGGLE_LABELS: &str = "ToggleEdgeLabels";
pub const CMD_FIT_VIEW: &str = "FitView";
pub const CMD_SELECT_NODE: &str = "SelectNode";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandLifecycle {
    Start,
    Success,
    Failure,
}

impl fmt::Display for CommandLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "command_start"),
            Self::Success => write!(f, "command_success"),
            Self::Failure => write!(f, "command_failure"),
        }
    }
}

/// One lifecycle record for a viewer command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandTelemetry {
    pub correlation_id: String,
    pub command: String,
    pub lifecycle: CommandLifecycle,
    pub error_reason: Option<String>,
    pub duration_ms: Option<u128>,
}

impl CommandTelemetry {
    fn record(
        command: &str,
        correlation_id: &str,
        lifecycle: CommandLifecycle,
        error_reason: Option<String>,
        duration_ms: Option<u128>,
    ) -> Self {
        Self {
            correlation_id: correlation_id.to_string(),
            command: command.to_string(),
            lifecycle,
            error_reason,
            duration_ms,
        }
    }

    fn now_unix_ms() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
    }
}

pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn command_start(command: &str, correlation_id: &str) -> CommandTelemetry {
    let telemetry =
        CommandTelemetry::record(command, correlation_id, CommandLifecycle::Start, None, None);
    info!(
        target: TELEMETRY_TARGET,
        command = %telemetry.command,
        correlation_id = %telemetry.correlation_id,
        lifecycle = %telemetry.lifecycle,
        timestamp_ms = CommandTelemetry::now_unix_ms(),
        "command_start"
    );
    telemetry
}

pub fn command_success(
    command: &str,
    correlation_id: &str,
    duration_ms: Option<u128>,
) -> CommandTelemetry {
    let telemetry = CommandTelemetry::record(
        command,
        correlation_id,
        CommandLifecycle::Success,
        None,
        duration_ms,
    );
    info!(
        target: TELEMETRY_TARGET,
        command = %telemetry.command,
        correlation_id = %telemetry.correlation_id,
        lifecycle = %telemetry.lifecycle,
        duration_ms = ?telemetry.duration_ms,
        timestamp_ms = CommandTelemetry::now_unix_ms(),
        "command_success"
    );
    telemetry
}

pub fn command_failure(command: &str, correlation_id: &str, reason: String) -> CommandTelemetry {
    let telemetry = CommandTelemetry::record(
        command,
        correlation_id,
        CommandLifecycle::Failure,
        Some(reason),
        None,
    );
    error!(
        target: TELEMETRY_TARGET,
        command = %telemetry.command,
        correlation_id = %telemetry.correlation_id,
        lifecycle = %telemetry.lifecycle,
        error = telemetry.error_reason.as_deref().unwrap_or("unclassified"),
        timestamp_ms = CommandTelemetry::now_unix_ms(),
        "command_failure"
    );
    telemetry
}

/// Tracks one command from start to outcome under a single correlation id.
pub struct CommandSpan {
    command: &'static str,
    correlation_id: String,
    started: Instant,
}

impl CommandSpan {
    pub fn begin(command: &'static str) -> Self {
        let correlation_id = new_correlation_id();
        command_start(command, &correlation_id);
        Self {
            command,
            correlation_id,
            started: Instant::now(),
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn context(&self, context: &str) {
        debug!(
            target: TELEMETRY_TARGET,
            command = %self.command,
            correlation_id = %self.correlation_id,
            context = %context,
            "command_context"
        );
    }

    pub fn succeed(self) -> CommandTelemetry {
        let elapsed = self.started.elapsed().as_millis();
        command_success(self.command, &self.correlation_id, Some(elapsed))
    }

    pub fn fail(self, reason: impl fmt::Display) -> CommandTelemetry {
        command_failure(self.command, &self.correlation_id, reason.to_string())
    }
}
