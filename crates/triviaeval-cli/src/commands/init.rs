//! The `triviaeval init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("triviaeval.toml").exists() {
        println!("triviaeval.toml already exists, skipping.");
    } else {
        std::fs::write("triviaeval.toml", SAMPLE_CONFIG)?;
        println!("Created triviaeval.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: triviaeval token   (and paste the token into triviaeval.toml)");
    println!("  2. Run: triviaeval collect --max-cycles 100");
    println!("  3. Run: ollama pull llama3.2 && triviaeval evaluate");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# triviaeval configuration

api_url = "https://opentdb.com/api.php"
api_token = "${TRIVIAEVAL_API_TOKEN}"
poll_delay_ms = 10000
dataset = "trivia_data.csv"

model_endpoint = "http://localhost:11434/api/generate"
model_name = "llama3.2"
request_delay_ms = 1000
# row_cap = 50

[evaluator]
# default | reference | full-file
profile = "default"
# match_mode = "exact"            # exact | case-insensitive
# parse_fallback = "lowercased-raw" # empty | lowercased-raw
# retry_policy = "await"          # await | discard
# max_attempts = 5
"#;
