// Report Generator
// Tallies offense categories and renders the text summary

use crate::models::ModerationOutcome;
use chrono::Local;
use std::collections::HashMap;

/// Offensive comments with no category from the model are tallied
/// under this label.
const UNSPECIFIED_TYPE: &str = "unspecified";

/// Ranked excerpts keep this many comments.
const TOP_OFFENSIVE_LIMIT: usize = 5;

/// Long comment texts are cut to this many characters in the rendered
/// report.
const MAX_EXCERPT_CHARS: usize = 200;

/// One entry in the ranked list of most offensive comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffensiveExcerpt {
    pub comment_text: String,
    pub offense_type: String,
    pub explanation: String,
}

/// Aggregate view over all moderation outcomes, recomputed each run.
#[derive(Debug, Clone)]
pub struct ModerationReport {
    pub total: usize,
    pub offensive: usize,
    pub unresolved: usize,
    /// Per-category counts, highest first, name as tiebreak.
    pub type_counts: Vec<(String, usize)>,
    /// Offensive comments ranked by explanation length, longest first.
    /// The ranking is a documented heuristic, not a severity score.
    pub top_offensive: Vec<OffensiveExcerpt>,
}

impl ModerationReport {
    pub fn build(outcomes: &[ModerationOutcome]) -> Self {
        let total = outcomes.len();
        let unresolved = outcomes.iter().filter(|o| !o.is_resolved()).count();

        let offensive: Vec<&ModerationOutcome> =
            outcomes.iter().filter(|o| o.is_offensive()).collect();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for outcome in &offensive {
            let label = outcome
                .classification
                .as_ref()
                .and_then(|c| c.offense_type.clone())
                .unwrap_or_else(|| UNSPECIFIED_TYPE.to_string());
            *counts.entry(label).or_insert(0) += 1;
        }
        let mut type_counts: Vec<(String, usize)> = counts.into_iter().collect();
        type_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut ranked = offensive.clone();
        ranked.sort_by_key(|o| {
            std::cmp::Reverse(
                o.classification
                    .as_ref()
                    .map(|c| c.explanation.len())
                    .unwrap_or(0),
            )
        });
        let top_offensive = ranked
            .into_iter()
            .take(TOP_OFFENSIVE_LIMIT)
            .filter_map(|outcome| {
                let classification = outcome.classification.as_ref()?;
                Some(OffensiveExcerpt {
                    comment_text: outcome.record.comment_text.clone(),
                    offense_type: classification
                        .offense_type
                        .clone()
                        .unwrap_or_else(|| UNSPECIFIED_TYPE.to_string()),
                    explanation: classification.explanation.clone(),
                })
            })
            .collect();

        Self {
            total,
            offensive: offensive.len(),
            unresolved,
            type_counts,
            top_offensive,
        }
    }

    /// Render the report in its text file layout.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Moderation Report ===\n\n");
        out.push_str(&format!("Total Comments: {}\n", self.total));
        out.push_str(&format!("Offensive Comments: {}\n", self.offensive));
        out.push_str(&format!("Unresolved Comments: {}\n\n", self.unresolved));

        out.push_str("Offense Type Breakdown:\n");
        for (label, count) in &self.type_counts {
            out.push_str(&format!("  - {}: {}\n", label, count));
        }

        out.push_str("\nTop 5 Most Offensive Comments:\n");
        for (i, entry) in self.top_offensive.iter().enumerate() {
            out.push_str(&format!(
                "{}. {}\n",
                i + 1,
                excerpt(&entry.comment_text, MAX_EXCERPT_CHARS)
            ));
            out.push_str(&format!("   → Type: {}\n", entry.offense_type));
            out.push_str(&format!("   → Explanation: {}\n\n", entry.explanation));
        }

        out.push_str(&format!(
            "\nGenerated: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        out
    }
}

/// Truncate to a character budget, marking the cut with an ellipsis.
fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut)
}
