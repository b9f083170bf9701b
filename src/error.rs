use std::fmt;

/// Error types that can occur when talking to an LLM provider or
/// interpreting what it sent back.
#[derive(Debug)]
pub enum LLMError {
    /// HTTP request/response errors
    HttpError(String),
    /// Authentication and authorization errors
    AuthError(String),
    /// Invalid request parameters or format
    InvalidRequest(String),
    /// Errors returned by the LLM provider
    ProviderError(String),
    /// API response parsing or format error
    ResponseFormatError {
        message: String,
        raw_response: String,
    },
    /// The provider rate limited the request
    TooManyRequests(String),
    /// Generic error
    Generic(String),
    /// JSON serialization/deserialization errors
    JsonError(String),
    /// The model answered, but the answer is not a valid evaluation
    InvalidEvaluation(NormalizationError),
}

impl fmt::Display for LLMError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LLMError::HttpError(e) => write!(f, "HTTP Error: {e}"),
            LLMError::AuthError(e) => write!(f, "Auth Error: {e}"),
            LLMError::InvalidRequest(e) => write!(f, "Invalid Request: {e}"),
            LLMError::ProviderError(e) => write!(f, "Provider Error: {e}"),
            LLMError::ResponseFormatError {
                message,
                raw_response,
            } => write!(f, "Response Format Error: {message}. Raw response: {raw_response}"),
            LLMError::TooManyRequests(e) => write!(f, "Too Many Requests: {e}"),
            LLMError::Generic(e) => write!(f, "Generic Error : {e}"),
            LLMError::JsonError(e) => write!(f, "JSON Parse Error: {e}"),
            LLMError::InvalidEvaluation(e) => write!(f, "Invalid Evaluation: {e}"),
        }
    }
}

impl std::error::Error for LLMError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LLMError::InvalidEvaluation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        LLMError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for LLMError {
    fn from(err: serde_json::Error) -> Self {
        LLMError::JsonError(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

impl From<NormalizationError> for LLMError {
    fn from(err: NormalizationError) -> Self {
        LLMError::InvalidEvaluation(err)
    }
}

/// Why a piece of model output could not be turned into an
/// [`Evaluation`](crate::evaluation::Evaluation).
///
/// Validation stops at the first problem, so exactly one violation is
/// reported per call.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizationError {
    /// The text is not syntactically valid JSON.
    MalformedPayload {
        /// Byte offset into the normalised text where parsing stopped
        offset: usize,
        /// 1-based line reported by the parser
        line: usize,
        /// 1-based column reported by the parser
        column: usize,
        reason: String,
    },
    /// Valid JSON, but not shaped like a facts/opinions document.
    SchemaViolation {
        /// Location of the offending value, e.g. `facts[1].text`
        path: String,
        expected: String,
        found: String,
    },
    /// A confidence score outside `[0.0, 1.0]`, or not finite.
    RangeViolation { path: String, value: f64 },
}

impl fmt::Display for NormalizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationError::MalformedPayload {
                offset,
                line,
                column,
                reason,
            } => write!(
                f,
                "malformed payload at offset {offset} (line {line}, column {column}): {reason}"
            ),
            NormalizationError::SchemaViolation {
                path,
                expected,
                found,
            } => write!(f, "schema violation at {path}: expected {expected}, found {found}"),
            NormalizationError::RangeViolation { path, value } => write!(
                f,
                "range violation at {path}: {value} is outside [0.0, 1.0]"
            ),
        }
    }
}

impl std::error::Error for NormalizationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_error_wraps_into_llm_error() {
        let err: LLMError = NormalizationError::RangeViolation {
            path: "facts[0].confidence".into(),
            value: 1.5,
        }
        .into();

        assert!(matches!(err, LLMError::InvalidEvaluation(_)));
        assert_eq!(
            err.to_string(),
            "Invalid Evaluation: range violation at facts[0].confidence: 1.5 is outside [0.0, 1.0]"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn schema_violation_display_names_path() {
        let err = NormalizationError::SchemaViolation {
            path: "opinions[2].text".into(),
            expected: "string".into(),
            found: "missing".into(),
        };
        assert_eq!(
            err.to_string(),
            "schema violation at opinions[2].text: expected string, found missing"
        );
    }
}
