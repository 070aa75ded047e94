//! Current time tool

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{HandlerResult, ParamSpec, ParamType, ToolHandler, ToolSchema};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Reports the current time as an RFC 3339 timestamp
pub struct CurrentTimeTool {
    clock: Clock,
}

impl CurrentTimeTool {
    /// Use a fixed clock instead of the system time
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self {
            clock: Arc::new(clock),
        }
    }
}

impl Default for CurrentTimeTool {
    fn default() -> Self {
        Self::with_clock(Utc::now)
    }
}

#[async_trait]
impl ToolHandler for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time. Accepts UTC, local, or an offset like +05:30."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().param(ParamSpec::optional(
            "timezone",
            ParamType::String,
            "Time zone: \"UTC\" (default), \"local\", or a UTC offset such as \"-08:00\"",
        ))
    }

    async fn call(&self, input: &Map<String, Value>) -> HandlerResult {
        let now = (self.clock)();
        let zone = input
            .get("timezone")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("UTC");

        let formatted = match zone.to_ascii_lowercase().as_str() {
            "" | "utc" | "z" | "gmt" => now.to_rfc3339_opts(SecondsFormat::Secs, true),
            "local" => now
                .with_timezone(&Local)
                .to_rfc3339_opts(SecondsFormat::Secs, false),
            _ => {
                let offset = parse_offset(zone)
                    .ok_or_else(|| format!("unsupported timezone '{}'", zone))?;
                now.with_timezone(&offset)
                    .to_rfc3339_opts(SecondsFormat::Secs, false)
            }
        };

        Ok(json!(formatted))
    }
}

/// Parses `+05:30`, `-0800`, `+9`, optionally prefixed by `UTC` or `GMT`
fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let upper = zone.to_ascii_uppercase();
    let rest = upper
        .strip_prefix("UTC")
        .or_else(|| upper.strip_prefix("GMT"))
        .unwrap_or(&upper);

    let (sign, digits) = match rest.chars().next()? {
        '+' => (1, &rest[1..]),
        '-' => (-1, &rest[1..]),
        _ => return None,
    };

    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h, m),
        None if digits.len() == 4 => digits.split_at(2),
        None => (digits, "0"),
    };
    if hours.is_empty() || !hours.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !minutes.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
