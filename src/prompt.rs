//! Prompt text sent to the model.

/// System instruction sent alongside every evaluation request.
pub const SYSTEM_PROMPT: &str = "You distinguish objective facts from subjective opinions in text. \
Answer with a single JSON object and nothing else. Do not use Markdown formatting \
and do not wrap the answer in a code block.";

const EXAMPLE_REPLY: &str = r#"{
  "facts": [
    { "text": "The sky is blue.", "confidence": 0.95 },
    { "text": "2 plus 2 equals 4.", "confidence": 0.98 }
  ],
  "opinions": [
    { "text": "I think the sky is beautiful.", "confidence": 0.90 },
    { "text": "In my opinion, chocolate is the best flavor.", "confidence": 0.85 }
  ]
}"#;

/// Builds the user prompt asking the model to classify `text`.
pub fn evaluation_prompt(text: &str) -> String {
    format!(
        "Evaluate the following text to determine if it contains objective facts \
or subjective opinions.\n\n\
{text}\n\n\
Provide a JSON response with a confidence score between 0 and 1 for each \
identified fact and opinion, in the following format:\n\
{EXAMPLE_REPLY}\n\n\
Use empty arrays when there are no facts or no opinions."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::Evaluation;

    #[test]
    fn prompt_embeds_text() {
        let prompt = evaluation_prompt("Rust is fun.");
        assert!(prompt.contains("\n\nRust is fun.\n\n"));
        assert!(prompt.contains("\"facts\""));
    }

    #[test]
    fn example_reply_is_itself_valid() {
        let example: Evaluation = EXAMPLE_REPLY.parse().unwrap();
        assert_eq!(example.facts().len(), 2);
        assert_eq!(example.opinions()[1].confidence(), 0.85);
    }
}
