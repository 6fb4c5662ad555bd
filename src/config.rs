use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default size of one network read; a request must fit into one read
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// Settings of one server instance
///
/// Every field has a default, so a config file only needs to name what it
/// changes.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface the listener binds to
    pub host: String,

    /// Ports tried in order; empty or all taken means an ephemeral port
    pub candidate_ports: Vec<u16>,

    /// CSV file describing the watched memory
    pub watch_list_path: PathBuf,

    /// Shared file the bound address is appended to; `None` disables publishing
    pub discovery_file: Option<PathBuf>,

    /// Bytes read per request
    pub read_chunk_size: usize,

    /// Frame rate of the built-in clock
    pub frame_rate_hz: u32,

    /// Memory size of the simulated host used by the binary
    pub simulated_memory_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            candidate_ports: Vec::new(),
            watch_list_path: PathBuf::from("watch_list.csv"),
            discovery_file: Some(PathBuf::from("instances.txt")),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            frame_rate_hz: 60,
            simulated_memory_size: crate::host::simulated::DEFAULT_MEMORY_SIZE,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ServerConfig {
    /// `<config dir>/framelink/server.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("framelink").join("server.toml"))
    }

    /// Loads the file at `path`; a missing file yields the defaults
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if !exists {
            warn!(
                "Config file {} does not exist, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        debug!("{:?}", config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let config: ServerConfig = toml::from_str(
            r#"
            candidate_ports = [5000, 5001]
            watch_list_path = "games/mkdd/watch_list.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.candidate_ports, vec![5000, 5001]);
        assert_eq!(config.watch_list_path, PathBuf::from("games/mkdd/watch_list.csv"));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.read_chunk_size, 1024);
        assert_eq!(config.discovery_file, Some(PathBuf::from("instances.txt")));
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::load(&dir.path().join("server.toml"))
            .await
            .unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[tokio::test]
    async fn unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        std::fs::write(&path, "frame_rate_hz = \"fast\"").unwrap();
        assert!(matches!(
            ServerConfig::load(&path).await,
            Err(ConfigError::Parse { .. })
        ));
    }
}
