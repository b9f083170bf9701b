// Evaluate a text against a local OpenAI-compatible server (llama.cpp, Ollama, vLLM)
use fact_or_opinion::{
    builder::{LLMBackend, LLMBuilder},
    Evaluator,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_url =
        std::env::var("OPENAI_BASE_URL").unwrap_or("http://localhost:11434/v1".into());

    let llm = LLMBuilder::new()
        .backend(LLMBackend::OpenAICompatible)
        .base_url(base_url)
        .model("llama3.1")
        .max_tokens(512)
        .build()?;

    let evaluation = Evaluator::new(llm)
        .evaluate("Water freezes at 0 degrees Celsius. Winter is the worst season.")
        .await?;

    for fact in evaluation.facts() {
        println!("fact    {:.2}  {}", fact.confidence(), fact.text());
    }
    for opinion in evaluation.opinions() {
        println!("opinion {:.2}  {}", opinion.confidence(), opinion.text());
    }

    Ok(())
}
