//! JSON output formatter

use sleuth_core::QaAnswer;

pub fn format_answers(answers: &[QaAnswer], show_sources: bool) -> String {
    let output: Vec<serde_json::Value> = answers
        .iter()
        .map(|a| {
            let mut value = serde_json::json!({
                "question": a.question,
                "answer": a.answer,
            });
            if show_sources {
                value["sources"] = serde_json::json!(a.sources);
            }
            value
        })
        .collect();

    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "[]".to_string()) + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleuth_core::SearchHit;

    fn answer() -> QaAnswer {
        QaAnswer {
            question: "Q?".into(),
            answer: "A.".into(),
            sources: vec![SearchHit {
                id: 0,
                text: "context".into(),
                source: Some("https://example.com".into()),
                score: 0.5,
            }],
        }
    }

    #[test]
    fn test_sources_only_when_requested() {
        let plain: serde_json::Value = serde_json::from_str(&format_answers(&[answer()], false)).unwrap();
        assert_eq!(plain[0]["answer"], "A.");
        assert!(plain[0].get("sources").is_none());

        let full: serde_json::Value = serde_json::from_str(&format_answers(&[answer()], true)).unwrap();
        assert_eq!(full[0]["sources"][0]["source"], "https://example.com");
    }
}
