//! Report rendering

use serde::Serialize;
use serde_json::json;
use shotgun_core::ExecutionReport;
use shotgun_dispatch::{DispatchPlan, SessionError};
use std::sync::Arc;

use crate::cli::OutputFormat;

/// One line per outcome, then a summary line
pub fn render_report(report: &ExecutionReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut lines = report.lines();
            lines.push(format!(
                "Summary: {} ({}ms)",
                report.summary(),
                report.elapsed_ms
            ));
            lines.join("\n")
        }
        OutputFormat::Json => to_json(&json!({
            "report": report,
            "summary": report.summary(),
        })),
    }
}

pub fn render_plan(plan: &DispatchPlan, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut lines = plan.lines();
            lines.push(format!(
                "Summary: {} unit(s) would be dispatched, {} outcome(s) reported",
                plan.dispatched_units(),
                plan.report_len()
            ));
            lines.join("\n")
        }
        OutputFormat::Json => to_json(plan),
    }
}

/// Warm-up result per target, as returned by the session registry
pub type HealthEntry = (
    String,
    Result<Option<Arc<shotgun_core::Session>>, SessionError>,
);

#[derive(Serialize)]
struct HealthLine<'a> {
    target: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

pub fn render_health(results: &[HealthEntry], format: OutputFormat) -> String {
    let lines: Vec<HealthLine<'_>> = results
        .iter()
        .map(|(target, result)| {
            let (status, detail) = match result {
                Ok(Some(session)) => ("ACTIVE", Some(format!("{} account(s)", session.accounts.len()))),
                Ok(None) => ("ABSENT", Some("credentials not configured".to_string())),
                Err(e) => ("FAILED", Some(e.to_string())),
            };
            HealthLine {
                target,
                status,
                detail,
            }
        })
        .collect();

    match format {
        OutputFormat::Text => {
            let active = lines.iter().filter(|l| l.status == "ACTIVE").count();
            let mut text: Vec<String> = lines
                .iter()
                .map(|l| match &l.detail {
                    Some(detail) => format!("{} {}: {}", l.status, l.target, detail),
                    None => format!("{} {}", l.status, l.target),
                })
                .collect();
            text.push(format!("Summary: {} of {} session(s) active", active, lines.len()));
            text.join("\n")
        }
        OutputFormat::Json => to_json(&lines),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to render report: {}\"}}", e))
}
