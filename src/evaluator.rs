//! Asks a model to classify text and validates what comes back.

use crate::{
    chat::ChatProvider,
    error::LLMError,
    evaluation::Evaluation,
    parse::parse_evaluation,
    prompt::evaluation_prompt,
    text::normalize,
};

/// Runs the classify-normalise-validate pipeline against one provider.
///
/// Holds no per-request state, so one instance can serve many concurrent
/// requests behind an `Arc`.
pub struct Evaluator {
    provider: Box<dyn ChatProvider>,
}

impl Evaluator {
    pub fn new(provider: Box<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// Classifies the sentences of `text` as facts or opinions.
    ///
    /// Failures are never retried here. A model that produced a bad answer
    /// once will usually do so again without a prompt change, so whether to
    /// try again is up to the caller.
    pub async fn evaluate(&self, text: &str) -> Result<Evaluation, LLMError> {
        if text.trim().is_empty() {
            return Err(LLMError::InvalidRequest("Nothing to evaluate".to_string()));
        }

        let raw = self.provider.complete(&evaluation_prompt(text)).await?;
        log::trace!("raw model reply: {raw}");

        let evaluation = parse_evaluation(&normalize(&raw)).map_err(|e| {
            log::warn!("model reply failed validation: {e}");
            LLMError::from(e)
        })?;

        log::debug!(
            "evaluated text: {} facts, {} opinions",
            evaluation.facts().len(),
            evaluation.opinions().len()
        );
        Ok(evaluation)
    }
}
