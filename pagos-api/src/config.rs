use crate::helpers::pin;
use config::{Config, ConfigError, File};
use extractors::PatternSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// PIN hashed into the config on first run when no [admin] section exists.
const DEFAULT_ADMIN_PIN: &str = "1234";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub server: Option<ServerConfig>,
    pub cors: Option<CorsConfig>,
    pub admin: Option<AdminConfig>,
    /// Extra bank profiles appended after the built-in pattern table.
    pub patterns: Option<Vec<PatternSpec>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server: Some(ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            }),
            cors: Some(CorsConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            }),
            admin: None,
            patterns: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminConfig {
    /// Salted SHA-256 of the operator PIN, `<hex salt>$<hex digest>`.
    pub pin_hash: String,
}

impl ApiConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let config_path = get_config_path();

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        // Create default config file if it doesn't exist
        if !config_path.exists() {
            let default_config = r#"
[server]
host = "127.0.0.1"
port = 8080

[cors]
allowed_origins = ["http://localhost:3000"]

# The [admin] section with a pin_hash is written automatically on first run.
# Change the PIN by deleting the section and restarting with a fresh login.

# Extra bank profiles can be appended to the built-in table:
# [[patterns]]
# bank = "NEQUI"
# key = "Nequi"
# sender = 'de\s+(\d+)'
# amount = '\$\s*([\d,.]+)'
# reference = 'Ref[:\s]*(\d+)'
"#;
            std::fs::write(&config_path, default_config).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .build()?;

        let config: ApiConfig = builder.try_deserialize()?;

        Ok((config, config_path))
    }

    /// Hashes the default PIN into the config when no [admin] section is
    /// present and persists the file. Returns true when the file was updated.
    pub fn ensure_admin_pin(&mut self, config_path: &Path) -> anyhow::Result<bool> {
        if self.admin.is_some() {
            return Ok(false);
        }

        self.admin = Some(AdminConfig {
            pin_hash: pin::hash_pin(DEFAULT_ADMIN_PIN),
        });
        let serialized = toml::to_string_pretty(self)?;
        std::fs::write(config_path, serialized)?;

        Ok(true)
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("pagos").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}
