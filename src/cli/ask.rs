use anyhow::Result;
use answer_oracle::AnswerOracle;
use clap::Args;
use easyapply_core_types::{AnswerItem, ValueKind};

use super::output::OutputFormat;
use super::runtime::build_oracle;
use crate::app_settings::Config;

#[derive(Args, Clone)]
pub struct AskArgs {
    /// Question text as it appears on the form
    pub question: String,

    /// Allowed answers, comma separated
    #[arg(long, value_delimiter = ',')]
    pub choices: Vec<String>,

    /// Value kind (text, number, email, phone, url, select, radio, checkbox)
    #[arg(long, default_value = "text")]
    pub kind: ValueKind,
}

pub async fn cmd_ask(args: AskArgs, config: &Config, output: OutputFormat) -> Result<()> {
    let oracle = build_oracle(config).await?;
    let choices: Vec<String> = args
        .choices
        .iter()
        .map(|choice| choice.trim().to_string())
        .filter(|choice| !choice.is_empty())
        .collect();
    let item = AnswerItem::new(args.question, args.kind).with_choices(choices);

    let answer = oracle.ask(&item).await;

    match output {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "question": item.question,
                "kind": item.kind,
                "choices": item.choices,
                "answer": answer,
                "configured": oracle.is_configured(),
            })
        ),
        OutputFormat::Human => println!("{answer}"),
    }
    Ok(())
}
