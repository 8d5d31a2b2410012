use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;

use campus_chatbot::chat::ChatService;
use campus_chatbot::config::AppConfig;
use campus_chatbot::dataset::load_dataset_or_warn;
use campus_chatbot::llm::OpenAiClient;
use campus_chatbot::matcher::match_question;
use campus_chatbot::parser::SENTINEL_TITLE;

#[derive(Parser, Debug)]
#[command(name = "eval")]
#[command(about = "Run a campus question set against the live chat pipeline")]
struct Cli {
    #[arg(long, default_value = "eval/questions.jsonl")]
    file: String,
    #[arg(long)]
    data: Option<String>,
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

#[derive(Debug, Deserialize)]
struct EvalQuestion {
    id: String,
    question: String,
    #[serde(default)]
    expect_building: Option<String>,
    #[serde(default)]
    expect_title_contains: Vec<String>,
    #[serde(default)]
    expect_extra_contains: Vec<String>,
    #[serde(default)]
    expect_image: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(data) = cli.data {
        config.data_path = data.into();
    }

    let dataset = load_dataset_or_warn(&config.data_path);
    let client = OpenAiClient::new(&config.model)?;
    let chat = ChatService::new(
        config.clone(),
        Arc::new(client),
        dataset,
        Arc::new(Semaphore::new(1)),
    );

    let questions = load_questions(&cli.file)?;
    if questions.is_empty() {
        anyhow::bail!("no questions found in {}", cli.file);
    }

    let mut total = 0usize;
    let mut passed = 0usize;
    let mut matched = 0usize;
    let mut sentinel_titles = 0usize;
    let mut with_image = 0usize;

    for item in questions {
        total += 1;

        let building = match_question(&item.question, chat.dataset())
            .building
            .map(|b| b.name.clone());
        if building.is_some() {
            matched += 1;
        }

        let response = chat
            .answer(&item.question)
            .await
            .with_context(|| format!("failed eval question {}", item.id))?;

        let title = response.title();
        let extra_info = response.extra_info();
        if title == SENTINEL_TITLE {
            sentinel_titles += 1;
        }
        if response.image_url().is_some() {
            with_image += 1;
        }

        let mut pass = item
            .expect_title_contains
            .iter()
            .all(|needle| title.contains(needle.as_str()))
            && item
                .expect_extra_contains
                .iter()
                .all(|needle| extra_info.contains(needle.as_str()));

        if let Some(expected) = &item.expect_building {
            pass &= building.as_deref() == Some(expected.as_str());
        }
        if let Some(expected) = item.expect_image {
            pass &= response.image_url().is_some() == expected;
        }

        if pass {
            passed += 1;
        }

        if cli.verbose {
            println!("--- {} ({}) ---", item.id, if pass { "pass" } else { "FAIL" });
            println!("Q: {}", item.question);
            println!("Building: {}", building.as_deref().unwrap_or("-"));
            println!("Title: {}", title);
            println!("Extra: {}", extra_info.replace('\n', " | "));
            println!();
        }
    }

    println!("Eval questions: {}", total);
    println!("Expectation accuracy: {:.1}%", ratio(passed, total) * 100.0);
    println!("Dataset match rate: {:.1}%", ratio(matched, total) * 100.0);
    println!("Sentinel title rate: {:.1}%", ratio(sentinel_titles, total) * 100.0);
    println!("Image rate: {:.1}%", ratio(with_image, total) * 100.0);

    Ok(())
}

fn load_questions(path: &str) -> Result<Vec<EvalQuestion>> {
    let file = File::open(path).with_context(|| format!("failed opening {}", path))?;
    let reader = BufReader::new(file);
    let mut questions = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let parsed: EvalQuestion = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON at {} line {}", path, idx + 1))?;
        questions.push(parsed);
    }

    Ok(questions)
}

fn ratio(n: usize, d: usize) -> f32 {
    if d == 0 {
        return 0.0;
    }
    n as f32 / d as f32
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
