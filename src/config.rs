use std::{env, path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::board::BoardConfig;

pub const CONFIG_ENV: &str = "CHESS_UI_CONFIG";
pub const LOG_LEVEL_ENV: &str = "CHESS_UI_LOG";
pub const CONFIG_FILE: &str = "chess-ui.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub board: BoardConfig,
    /// delay before the computer answers a human move
    pub reply_delay_ms: u64,
    pub history_width: usize,
    pub history_rows: usize,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            board: BoardConfig::default(),
            reply_delay_ms: 250,
            history_width: 40,
            history_rows: 6,
            log_file: PathBuf::from("rusty-chess-ui.log"),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Config> {
        let config = serde_json::from_str(json).context("malformed configuration")?;
        Ok(config)
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    /// `CHESS_UI_LOG` wins over the configured level.
    pub fn log_level(&self) -> Result<LevelFilter> {
        let level = env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| self.log_level.clone());
        level
            .parse()
            .map_err(|_| anyhow!("unknown log level '{level}'"))
    }
}

/// Read the configuration from the file named in CHESS_UI_CONFIG, or from a local
/// chess-ui.json, or fall back to the defaults.
pub fn load_config() -> Result<Config> {
    let path = match env::var(CONFIG_ENV) {
        Ok(p) => PathBuf::from(p),
        Err(_) => {
            let local = env::current_dir()?.join(CONFIG_FILE);
            if !local.exists() {
                return Ok(Config::default());
            }
            local
        }
    };

    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("could not read config {}", path.display()))?;
    Config::from_json(&json).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::AnimationSpeed;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
        assert_eq!(Config::default().reply_delay(), Duration::from_millis(250));
    }

    #[test]
    fn partial_overrides() {
        let config = Config::from_json(
            r#"{"replyDelayMs": 10, "board": {"draggable": false, "snapBackSpeed": "fast"}}"#,
        )
        .unwrap();
        assert_eq!(config.reply_delay(), Duration::from_millis(10));
        assert!(!config.board.draggable);
        assert!(config.board.show_notation);
        assert_eq!(config.board.snap_back_speed.millis(), 200);
        assert_eq!(config.board.snap_speed, AnimationSpeed::Millis(100));
        assert_eq!(config.history_rows, 6);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Config::from_json("not json").is_err());
        assert!(Config::from_json(r#"{"replyDelayMs": "soon"}"#).is_err());
    }
}
