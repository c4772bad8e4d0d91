//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use sleuth_core::QaAnswer;

/// Format answers for printing on stdout
pub fn format_answers(answers: &[QaAnswer], format: OutputFormat, show_sources: bool) -> String {
    match format {
        OutputFormat::Json => json::format_answers(answers, show_sources),
        OutputFormat::Cli => terminal::format_answers(answers, show_sources),
    }
}
