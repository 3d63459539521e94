//! The `triviaeval token` command.

use std::path::PathBuf;

use anyhow::Result;

use triviaeval_providers::config::{create_opentdb, load_config_from};

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let source = create_opentdb(&config)?;

    let token = source.request_token().await?;
    println!("{token}");
    eprintln!("Add it to triviaeval.toml as `api_token = \"{token}\"` or export TRIVIAEVAL_API_TOKEN.");

    Ok(())
}
