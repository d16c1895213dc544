use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use crate::error::{AppError, Result};

pub const DEFAULT_LLM_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "openai/gpt-3.5-turbo";

#[derive(Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    /// Server-side LLM API key. Optional: /fetch and /generate_pdf never
    /// touch the LLM, and /query accepts a per-request key.
    pub api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let api_key = env::var("OPENROUTER_API_KEY").ok().filter(|k| !k.is_empty());
        let llm_api_url =
            env::var("LLM_API_URL").unwrap_or_else(|_| DEFAULT_LLM_API_URL.to_string());
        let llm_model = env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string());

        // Load server configuration with defaults
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let port = port.parse::<u16>().map_err(|e| AppError::Config(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::Config(format!("Invalid host address: {}", e)))?;

        let server_addr = SocketAddr::new(ip, port);

        Ok(Config {
            server_addr,
            api_key,
            llm_api_url,
            llm_model,
        })
    }
}
