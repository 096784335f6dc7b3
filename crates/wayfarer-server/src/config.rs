use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Origin allowed by CORS; the browser frontend.
    pub frontend_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/wayfarer.db".to_string(),
            max_connections: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. Falls back to WAYFARER_JWT_SECRET, then to a
    /// random per-boot secret (which invalidates tokens on restart).
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expiry_seconds: 24 * 60 * 60,
            argon2_memory_kib: 19_456,
            argon2_iterations: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub dir: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: "uploads".to_string(),
        }
    }
}

impl Config {
    /// Load from a TOML file; a missing file yields pure defaults. The JWT
    /// secret is resolved last so the environment can override the file.
    pub fn load(path: &Path) -> Result<Config> {
        let mut config = if path.is_file() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("parsing config file {}", path.display()))?
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Config::default()
        };

        if config.auth.jwt_secret.is_empty() {
            if let Ok(secret) = std::env::var("WAYFARER_JWT_SECRET") {
                config.auth.jwt_secret = secret;
            }
        }
        if config.auth.jwt_secret.is_empty() {
            use rand::Rng;
            let secret: String = rand::thread_rng()
                .sample_iter(rand::distributions::Alphanumeric)
                .take(48)
                .map(char::from)
                .collect();
            tracing::warn!("no JWT secret configured, generated a per-boot secret");
            config.auth.jwt_secret = secret;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_file_is_missing() {
        let config = Config::load(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.upload.dir, "uploads");
        assert!(!config.auth.jwt_secret.is_empty());
    }

    #[test]
    fn partial_file_fills_the_rest_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nbind_address = \"127.0.0.1:9000\"\n\n\
             [auth]\njwt_secret = \"file-secret\"\njwt_expiry_seconds = 3600"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.auth.jwt_secret, "file-secret");
        assert_eq!(config.auth.jwt_expiry_seconds, 3600);
        assert_eq!(config.database.url, "sqlite://data/wayfarer.db");
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbind_address = ").unwrap();
        assert!(Config::load(file.path()).is_err());
    }
}
