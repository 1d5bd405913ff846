//! Process settings read from the environment (and an optional `.env` file).

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub model: ModelSettings,
}

/// Everything the LLM client needs. The key is passed through untouched.
#[derive(Clone)]
pub struct ModelSettings {
    pub api_key: String,
    pub model: String,
    /// Overrides the client's default endpoint; any OpenAI-compatible API works.
    pub api_base: Option<String>,
    pub max_tool_rounds: usize,
}

impl std::fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got '{}'", raw))?,
            None => DEFAULT_PORT,
        };

        let api_key = get("OPENAI_API_KEY").context("OPENAI_API_KEY must be set in .env")?;
        let model = get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_base = get("OPENAI_API_BASE");

        let max_tool_rounds = match get("MAX_TOOL_ROUNDS") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("MAX_TOOL_ROUNDS must be a number, got '{}'", raw))?,
            None => DEFAULT_MAX_TOOL_ROUNDS,
        };

        Ok(Self {
            port,
            model: ModelSettings {
                api_key,
                model,
                api_base,
                max_tool_rounds,
            },
        })
    }

    /// Loopback only; the service is never exposed on other interfaces.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.port))
    }
}
