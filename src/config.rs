use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

const TOKEN_VAR: &str = "TOKEN";
const SCORES_FILE_VAR: &str = "SCORES_FILE";
const QUESTIONS_FILE_VAR: &str = "QUESTIONS_FILE";

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub(crate) struct BotConfig {
    pub(crate) token: String,
    pub(crate) scores_path: PathBuf,
    pub(crate) questions_path: PathBuf,
}

impl BotConfig {
    /// Reads the configuration from the environment. The bot token is
    /// required; the data files default to the working directory.
    pub(crate) fn from_env() -> Result<Self> {
        let token = env::var(TOKEN_VAR)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .with_context(|| {
                format!("environment variable {TOKEN_VAR} is not set; export the Discord bot token before starting")
            })?;

        Ok(Self {
            token,
            scores_path: path_from_env(SCORES_FILE_VAR, "scores.json"),
            questions_path: path_from_env(QUESTIONS_FILE_VAR, "questions.json"),
        })
    }
}

fn path_from_env(var: &str, default: &str) -> PathBuf {
    env::var_os(var).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(default))
}
