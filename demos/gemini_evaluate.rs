// Evaluate a text with Gemini and print the validated result
use fact_or_opinion::{
    builder::{LLMBackend, LLMBuilder},
    prompt::SYSTEM_PROMPT,
    Evaluator,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Get Google API key from environment variable or use test key as fallback
    let api_key = std::env::var("GOOGLE_API_KEY").unwrap_or("TESTKEY".into());

    let llm = LLMBuilder::new()
        .backend(LLMBackend::Google)
        .api_key(api_key)
        .model("gemini-2.0-flash")
        .temperature(0.0)
        .system(SYSTEM_PROMPT)
        .json_mode(true)
        .build()?;

    let evaluator = Evaluator::new(llm);
    let text = "The Eiffel Tower is in Paris. It is the most beautiful building in the world.";

    match evaluator.evaluate(text).await {
        Ok(evaluation) => println!("{}", evaluation.to_json_pretty()?),
        Err(e) => eprintln!("Evaluation error: {e}"),
    }

    Ok(())
}
