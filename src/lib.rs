pub mod chat;
pub mod config;
pub mod dataset;
pub mod llm;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod response;
pub mod server;

pub use config::AppConfig;
pub use server::run_server;
