//! The validated result of a fact/opinion classification.

use std::str::FromStr;

use serde::Serialize;

use crate::error::NormalizationError;

/// One classified sentence or clause together with the model's confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    text: String,
    confidence: f64,
}

impl Statement {
    /// Builds a statement, enforcing the same rules the response parser does:
    /// `text` must not be blank and `confidence` must be a finite value in
    /// `[0.0, 1.0]`.
    pub fn new(text: impl Into<String>, confidence: f64) -> Result<Self, NormalizationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(NormalizationError::SchemaViolation {
                path: "text".to_string(),
                expected: "non-empty string".to_string(),
                found: "empty string".to_string(),
            });
        }
        if !is_valid_confidence(confidence) {
            return Err(NormalizationError::RangeViolation {
                path: "confidence".to_string(),
                value: confidence,
            });
        }
        Ok(Self { text, confidence })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

pub(crate) fn is_valid_confidence(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Facts and opinions found in a piece of text, in the order the model
/// listed them.
///
/// Serializes to the wire shape sent back to users:
///
/// ```json
/// { "facts": [ { "text": "...", "confidence": 0.9 } ], "opinions": [] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    facts: Vec<Statement>,
    opinions: Vec<Statement>,
}

impl Evaluation {
    pub fn new(facts: Vec<Statement>, opinions: Vec<Statement>) -> Self {
        Self { facts, opinions }
    }

    pub fn facts(&self) -> &[Statement] {
        &self.facts
    }

    pub fn opinions(&self) -> &[Statement] {
        &self.opinions
    }

    /// True when the model found neither facts nor opinions.
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.opinions.is_empty()
    }

    /// Compact JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Indented JSON form, used for chat replies and CLI output.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Parses raw model output: fences and whitespace are stripped first, then
/// the payload is validated.
impl FromStr for Evaluation {
    type Err = NormalizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parse::parse_evaluation(&crate::text::normalize(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_rejects_blank_text() {
        let err = Statement::new("   ", 0.5).unwrap_err();
        assert!(matches!(err, NormalizationError::SchemaViolation { .. }));
    }

    #[test]
    fn statement_rejects_out_of_range_confidence() {
        for bad in [-0.01, 1.0001, f64::NAN, f64::INFINITY] {
            let err = Statement::new("x", bad).unwrap_err();
            assert!(
                matches!(err, NormalizationError::RangeViolation { .. }),
                "{bad} should be rejected"
            );
        }
        assert!(Statement::new("x", 0.0).is_ok());
        assert!(Statement::new("x", 1.0).is_ok());
    }

    #[test]
    fn serializes_to_wire_shape() {
        let eval = Evaluation::new(
            vec![Statement::new("The sky is blue.", 0.95).unwrap()],
            vec![],
        );
        assert_eq!(
            eval.to_json().unwrap(),
            r#"{"facts":[{"text":"The sky is blue.","confidence":0.95}],"opinions":[]}"#
        );
    }

    #[test]
    fn from_str_accepts_fenced_reply() {
        let raw = "```json\n{\"facts\":[],\"opinions\":[{\"text\":\"Cats rule.\",\"confidence\":0.8}]}\n```\n";
        let eval: Evaluation = raw.parse().unwrap();
        assert!(eval.facts().is_empty());
        assert_eq!(eval.opinions()[0].text(), "Cats rule.");
        assert_eq!(eval.opinions()[0].confidence(), 0.8);
    }

    #[test]
    fn round_trips_through_json() {
        let eval = Evaluation::new(
            vec![
                Statement::new("2 plus 2 equals 4.", 0.98).unwrap(),
                Statement::new("Water boils at 100 C at sea level.", 1.0).unwrap(),
            ],
            vec![
                Statement::new("I think the sky is beautiful.", 0.9).unwrap(),
                Statement::new("Chocolate is the best \"flavor\".", 0.0).unwrap(),
            ],
        );
        let compact: Evaluation = eval.to_json().unwrap().parse().unwrap();
        let pretty: Evaluation = eval.to_json_pretty().unwrap().parse().unwrap();
        assert_eq!(compact, eval);
        assert_eq!(pretty, eval);
        assert!(Evaluation::default().is_empty());
    }
}
