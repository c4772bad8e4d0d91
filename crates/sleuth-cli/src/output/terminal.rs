//! Terminal output formatter

use sleuth_core::QaAnswer;

/// Longest excerpt of a source chunk shown under an answer
const EXCERPT_CHARS: usize = 80;

pub fn format_answers(answers: &[QaAnswer], show_sources: bool) -> String {
    let mut output = String::new();

    for answer in answers {
        output.push_str(&format!("\nQ: {}\n", answer.question));
        output.push_str(&format!("A: {}\n", answer.answer));

        if show_sources {
            for (i, hit) in answer.sources.iter().enumerate() {
                output.push_str(&format!(
                    "  [{}] {} ({:.2}): {}\n",
                    i + 1,
                    hit.source.as_deref().unwrap_or("-"),
                    hit.score,
                    excerpt(&hit.text)
                ));
            }
        }
    }

    output
}

fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleuth_core::SearchHit;

    #[test]
    fn test_question_and_answer_lines() {
        let answers = vec![QaAnswer {
            question: "What is the main topic discussed?".into(),
            answer: "Rust.".into(),
            sources: vec![SearchHit {
                id: 3,
                text: "Rust is\na language".into(),
                source: Some("a.md".into()),
                score: 0.91,
            }],
        }];

        assert_eq!(
            format_answers(&answers, false),
            "\nQ: What is the main topic discussed?\nA: Rust.\n"
        );
        assert!(format_answers(&answers, true).contains("  [1] a.md (0.91): Rust is a language\n"));
    }

    #[test]
    fn test_excerpt_truncates() {
        let long = "word ".repeat(40);
        let short = excerpt(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), EXCERPT_CHARS + 3);
    }
}
