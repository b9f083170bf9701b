//! Fact-or-opinion classification on top of hosted LLMs.
//!
//! The model is asked to sort the sentences of a text into facts and
//! opinions with a confidence score each. Its reply is cleaned up
//! ([`text::normalize`]) and validated ([`parse::parse_evaluation`]) into an
//! [`Evaluation`] before anyone sees it.
//!
//! ```
//! use fact_or_opinion::Evaluation;
//!
//! let reply = "```json\n{\"facts\":[{\"text\":\"Water is wet.\",\"confidence\":0.97}]}\n```";
//! let evaluation: Evaluation = reply.parse().unwrap();
//! assert_eq!(evaluation.facts()[0].text(), "Water is wet.");
//! assert!(evaluation.opinions().is_empty());
//! ```

pub mod backends;
pub mod builder;
pub mod chat;
pub mod error;
pub mod evaluation;
pub mod evaluator;
pub mod handler;
pub mod parse;
pub mod prompt;
pub mod secret_store;
pub mod text;

#[cfg(feature = "api")]
pub mod api;

pub use error::{LLMError, NormalizationError};
pub use evaluation::{Evaluation, Statement};
pub use evaluator::Evaluator;

/// Initialises `env_logger` from `RUST_LOG`. Without it, `verbose` selects
/// `debug` and otherwise only warnings are shown. Calling it twice is
/// harmless.
#[cfg(feature = "logging")]
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .try_init();
}

#[cfg(all(test, feature = "logging"))]
mod tests {
    #[test]
    fn init_logging_twice_is_harmless() {
        super::init_logging(true);
        super::init_logging(false);
        log::debug!("logger installed");
    }
}
