//! Output writers.
//!
//! The planner produces ordered records; these writers turn them into
//! document markup or a machine-readable JSON document. Scheduling logic
//! never reaches in here.

mod html;

use std::str::FromStr;

use crate::error::{ModschedError, Result};
use crate::plan::EmissionPlan;

pub use html::{DEFAULT_DATA_ID_PREFIX, DEFAULT_IMPORTMAP_ID, HtmlWriter};

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ModschedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            other => Err(ModschedError::UnknownFormat(other.to_string())),
        }
    }
}

/// Serialize the whole plan as pretty-printed JSON.
pub fn render_json(plan: &EmissionPlan) -> Result<String> {
    Ok(serde_json::to_string_pretty(plan)?)
}

/// Render `plan` in `format`.
pub fn render(plan: &EmissionPlan, format: OutputFormat, html: &HtmlWriter) -> Result<String> {
    match format {
        OutputFormat::Html => html.document(plan),
        OutputFormat::Json => render_json(plan),
    }
}
