//! Schema-checked parsing of a normalised model reply.
//!
//! The reply is first parsed into a generic JSON tree, then walked field by
//! field. Nothing from the tree is trusted until it has been checked, and
//! the first problem found is returned as a [`NormalizationError`].

use serde_json::{Map, Value};

use crate::error::NormalizationError;
use crate::evaluation::{is_valid_confidence, Evaluation, Statement};

/// Turns normalised text (see [`crate::text::normalize`]) into an
/// [`Evaluation`].
///
/// A missing `facts` or `opinions` key counts as an empty list, and unknown
/// keys are ignored. Shape checks over both lists run before any confidence
/// range check.
///
/// ```
/// use fact_or_opinion::parse::parse_evaluation;
///
/// let eval = parse_evaluation(
///     r#"{"facts":[{"text":"The sky is blue.","confidence":0.95}],"opinions":[]}"#,
/// )
/// .unwrap();
/// assert_eq!(eval.facts()[0].confidence(), 0.95);
/// ```
pub fn parse_evaluation(text: &str) -> Result<Evaluation, NormalizationError> {
    let document: Value = serde_json::from_str(text).map_err(|e| malformed(text, &e))?;

    let root = document
        .as_object()
        .ok_or_else(|| wrong_type("$", "object", &document))?;

    // Shape pass over both categories, then the range pass.
    let facts = category(root, "facts")?;
    let opinions = category(root, "opinions")?;

    Ok(Evaluation::new(
        range_checked(facts)?,
        range_checked(opinions)?,
    ))
}

/// A statement with the right shape whose confidence has not been range
/// checked yet.
struct Unchecked {
    confidence_path: String,
    text: String,
    confidence: f64,
}

fn category(root: &Map<String, Value>, key: &str) -> Result<Vec<Unchecked>, NormalizationError> {
    let items = match root.get(key) {
        None => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => return Err(wrong_type(key, "array", other)),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| statement_shape(&format!("{key}[{index}]"), item))
        .collect()
}

fn statement_shape(path: &str, item: &Value) -> Result<Unchecked, NormalizationError> {
    let fields = item
        .as_object()
        .ok_or_else(|| wrong_type(path, "object", item))?;

    let text_path = format!("{path}.text");
    let text = match fields.get("text") {
        None => return Err(missing(&text_path, "string")),
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(NormalizationError::SchemaViolation {
                path: text_path,
                expected: "non-empty string".to_string(),
                found: "empty string".to_string(),
            })
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => return Err(wrong_type(&text_path, "string", other)),
    };

    let confidence_path = format!("{path}.confidence");
    let confidence = match fields.get("confidence") {
        None => return Err(missing(&confidence_path, "number")),
        // Numbers too large for an f64 are kept as infinities so the range
        // pass reports them.
        Some(Value::Number(n)) => n.as_f64().unwrap_or_else(|| {
            if n.to_string().starts_with('-') {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            }
        }),
        Some(other) => return Err(wrong_type(&confidence_path, "number", other)),
    };

    Ok(Unchecked {
        confidence_path,
        text,
        confidence,
    })
}

fn range_checked(items: Vec<Unchecked>) -> Result<Vec<Statement>, NormalizationError> {
    items
        .into_iter()
        .map(|item| {
            if !is_valid_confidence(item.confidence) {
                return Err(NormalizationError::RangeViolation {
                    path: item.confidence_path,
                    value: item.confidence,
                });
            }
            Statement::new(item.text, item.confidence)
        })
        .collect()
}

fn wrong_type(path: &str, expected: &str, found: &Value) -> NormalizationError {
    NormalizationError::SchemaViolation {
        path: path.to_string(),
        expected: expected.to_string(),
        found: json_kind(found).to_string(),
    }
}

fn missing(path: &str, expected: &str) -> NormalizationError {
    NormalizationError::SchemaViolation {
        path: path.to_string(),
        expected: expected.to_string(),
        found: "missing".to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// serde_json reports 1-based line/column positions; map them back to a
/// byte offset in `text`.
fn malformed(text: &str, err: &serde_json::Error) -> NormalizationError {
    let line = err.line();
    let column = err.column();
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let offset = (line_start + column.saturating_sub(1)).min(text.len());

    let message = err.to_string();
    let suffix = format!(" at line {line} column {column}");
    let reason = message
        .strip_suffix(suffix.as_str())
        .unwrap_or(&message)
        .to_string();

    NormalizationError::MalformedPayload {
        offset,
        line,
        column,
        reason,
    }
}
