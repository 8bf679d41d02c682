// Prompt Builder
// Serializes a batch into a single classification instruction

use crate::models::CommentRecord;

const MODERATION_INSTRUCTION: &str = r#"You are a content moderation AI.
For each of the following comments, return a JSON array with one object per comment:
- comment_id (integer, copied from the input marker)
- is_offensive (JSON boolean true/false)
- offense_type (short category string, or null when not offensive)
- explanation (one sentence)

Comments:
"#;

const MODERATION_FOOTER: &str =
    "\nOnly return the JSON array. No markdown, no code fences, no commentary.";

/// Build the prompt for one batch.
///
/// Each record is rendered as a numbered line carrying its id marker and
/// its text as a JSON string literal, so embedded quotes and newlines
/// cannot break the line structure the model is asked to follow.
pub fn build_prompt(batch: &[CommentRecord]) -> String {
    let mut prompt = String::from(MODERATION_INSTRUCTION);
    for (i, record) in batch.iter().enumerate() {
        let quoted = serde_json::Value::String(record.comment_text.clone()).to_string();
        prompt.push_str(&format!(
            "{}. [comment_id: {}] {}\n",
            i + 1,
            record.comment_id,
            quoted
        ));
    }
    prompt.push_str(MODERATION_FOOTER);
    prompt
}
