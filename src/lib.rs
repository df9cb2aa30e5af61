pub mod analysis;
pub mod config;
pub mod diagram;
pub mod error;
pub mod export;
pub mod llm;
pub mod orchestrator;
pub mod pipeline;
pub mod state;
pub mod transcript;
