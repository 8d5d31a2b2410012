use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use campus_chatbot::dataset::FacilityDataset;
use campus_chatbot::matcher::match_question;
use campus_chatbot::normalize::normalize_reply;
use campus_chatbot::parser::parse_reply;
use campus_chatbot::response::assemble;

#[derive(Parser, Debug)]
#[command(name = "lookup")]
#[command(about = "Match a question against the facility dataset without calling the model")]
struct Cli {
    /// Question as a user would type it.
    question: String,
    #[arg(long, env = "CAMPUS_DATA_PATH", default_value = "data.json")]
    data: PathBuf,
    /// File holding a model reply to parse and merge with the match.
    #[arg(long)]
    reply: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let dataset = FacilityDataset::load(&cli.data)?;
    let matched = match_question(&cli.question, Some(&dataset));

    match &matched.matched_by {
        Some(by) => println!(
            "Matched: {} ({:?} via \"{}\")",
            matched.building.map(|b| b.name.as_str()).unwrap_or("-"),
            by.stage,
            by.keyword
        ),
        None => println!("Matched: -"),
    }
    println!("Image: {}", matched.image_url.as_deref().unwrap_or("-"));
    if !matched.facility_digest.is_empty() {
        println!("{}", matched.facility_digest);
    }

    if let Some(path) = cli.reply {
        let reply = std::fs::read_to_string(&path)
            .with_context(|| format!("failed reading reply {}", path.display()))?;
        let parsed = parse_reply(&normalize_reply(&reply));
        let response = assemble(&reply, parsed, &matched);
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
