//! Topic analysis and research reports

use crate::error::{Result, SleuthError};
use crate::llm::{ChatMessage, GenerationParams, LLMClient};
use std::path::{Path, PathBuf};

/// Characters of gathered text sent to the model
pub const ANALYSIS_INPUT_CHARS: usize = 4000;

const RULE_WIDTH: usize = 50;

/// Summarize and analyze `text` with the chat model
pub async fn analyze_text(client: &dyn LLMClient, text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Err(SleuthError::InvalidInput("No text to analyze.".to_string()));
    }

    let messages = vec![ChatMessage::user(build_analysis_prompt(text))];
    let analysis = client
        .chat_completion(messages, &GenerationParams::creative())
        .await?;
    Ok(analysis.trim().to_string())
}

fn build_analysis_prompt(text: &str) -> String {
    let excerpt: String = text.chars().take(ANALYSIS_INPUT_CHARS).collect();
    format!(
        "Please provide a comprehensive summary and analysis of the following text:\n\n\
         {}\n\n\
         Provide:\n\
         1. A concise summary (2-3 sentences)\n\
         2. Key points and main topics\n\
         3. Any interesting insights\n",
        excerpt
    )
}

/// Result of researching a single topic
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResearchReport {
    pub topic: String,
    pub gathered_chars: usize,
    pub analysis: String,
}

impl ResearchReport {
    pub fn new(topic: impl Into<String>, gathered: &str, analysis: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            gathered_chars: gathered.chars().count(),
            analysis: analysis.into(),
        }
    }

    /// Report file name, `<topic>_analysis.txt`
    pub fn file_name(&self) -> String {
        format!("{}_analysis.txt", self.topic)
    }

    /// Report body as written to disk
    pub fn render(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        format!(
            "Topic: {}\n{}\nGathered {} characters of text.\n\nANALYSIS RESULTS:\n{}\n\n{}",
            self.topic, rule, self.gathered_chars, rule, self.analysis
        )
    }

    /// Write the report into `dir`, returning the file path
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.render())?;
        Ok(path)
    }
}
