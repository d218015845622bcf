use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured endpoint
pub const ENDPOINT_ENV: &str = "TUTICHAT_ENDPOINT";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL of the reply endpoint (POST, JSON)
    pub endpoint: String,

    /// Hold one request in flight at a time so replies arrive in send order
    pub serialize_sends: bool,

    /// Log filter used when RUST_LOG is not set
    pub log_level: String,

    /// Starting bot profile
    pub profile: ProfileConfig,

    /// User-visible texts
    pub texts: Texts,

    /// UI preferences
    pub ui: UiConfig,

    /// Tutichat home directory (~/.tutichat)
    #[serde(skip)]
    pub home: PathBuf,
}

/// Bot profile the process starts with
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub name: String,
    pub avatar_path: Option<PathBuf>,
}

/// Fixed texts used by the chat core. `{name}` in `greeting` is replaced
/// by the committed bot name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Texts {
    pub greeting: String,
    pub generic_error: String,
    pub unreachable: String,
    pub default_caption: String,
    pub settings_saved: String,
    pub chat_restarted: String,
    pub chat_created: String,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_timestamps: bool,
    pub timestamp_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: "http://localhost:8080/chat".to_string(),
            serialize_sends: false,
            log_level: "info".to_string(),
            profile: ProfileConfig::default(),
            texts: Texts::default(),
            ui: UiConfig::default(),
            home: default_home(),
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            name: "TuTiBot".to_string(),
            avatar_path: None,
        }
    }
}

impl Default for Texts {
    fn default() -> Self {
        Self {
            greeting: "Hi! I'm {name}. How can I help?".to_string(),
            generic_error: "Something went wrong".to_string(),
            unreachable: "Couldn't get a reply. Check your connection.".to_string(),
            default_caption: "Sent an image".to_string(),
            settings_saved: "Settings saved".to_string(),
            chat_restarted: "Chat restarted".to_string(),
            chat_created: "New chat created".to_string(),
        }
    }
}

impl Texts {
    /// Greeting for the given bot name
    pub fn greeting_for(&self, name: &str) -> String {
        self.greeting.replace("{name}", name)
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_timestamps: true,
            timestamp_format: "%H:%M".to_string(),
        }
    }
}

fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("~"))
        .join(".tutichat")
}

impl Config {
    /// Load `~/.tutichat/config.toml`, or `path` when given.
    ///
    /// A missing file is created with defaults. The endpoint environment
    /// variable is applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            config
        };

        config.home = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(default_home);

        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            config.endpoint = endpoint;
        }

        Ok(config)
    }

    /// Default configuration file location
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".tutichat").join("config.toml"))
    }

    /// Parse a configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Where the TUI writes its log
    pub fn log_path(&self) -> PathBuf {
        self.home.join("tutichat.log")
    }
}
