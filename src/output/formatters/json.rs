//! JSON output formatter

use crate::aggregate::Report;
use crate::output::OutputFormatter;

/// Pretty-printed JSON document of the whole report
#[derive(Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &Report) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|e| {
            log::error!("Failed to serialize report: {e}");
            "{}".to_string()
        })
    }
}
