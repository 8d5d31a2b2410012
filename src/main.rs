use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;

use campus_chatbot::chat::ChatService;
use campus_chatbot::dataset::load_dataset_or_warn;
use campus_chatbot::llm::OpenAiClient;
use campus_chatbot::{run_server, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let dataset = load_dataset_or_warn(&config.data_path);
    let client = OpenAiClient::new(&config.model)?;
    tracing::info!(model = client.model(), "using chat model");

    let generation_limit = Arc::new(Semaphore::new(config.model.max_concurrent_generations));
    let chat = ChatService::new(config.clone(), Arc::new(client), dataset, generation_limit);

    run_server(config, chat).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
