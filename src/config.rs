use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_port")]
    pub port: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub sqlite: Option<SqliteConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqliteConfig {
    pub filename: String,
}

fn default_port() -> String {
    "3000".to_string()
}

impl Config {
    /// Loads the config file if present, otherwise starts from defaults,
    /// then applies environment overrides (`PORT`, `MOVIE_MASTER_DB`).
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let mut config = if std::path::Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_string(), e))?;

        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            if !port.is_empty() {
                self.listen.port = port;
            }
        }
        if let Ok(db) = std::env::var("MOVIE_MASTER_DB") {
            if !db.is_empty() {
                self.database.sqlite = Some(SqliteConfig { filename: db });
            }
        }
    }

    pub fn database_path(&self) -> String {
        match self.database.sqlite {
            Some(ref sqlite) => sqlite.filename.clone(),
            None => "movie-master.db".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
}
