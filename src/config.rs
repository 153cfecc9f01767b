use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT {0:?}")]
    Port(String),
    #[error("invalid bind address {0:?}")]
    Address(String),
    #[error("cannot resolve working directory: {0}")]
    WorkingDir(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub addr: SocketAddr,
    pub data_dir: PathBuf,
    pub public_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; relative directories resolve
    /// against the working directory.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Port(raw))?,
            None => 3000,
        };
        let addr = format!("{host}:{port}");
        let addr = addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Address(addr))?;

        let cwd = std::env::current_dir()?;
        let resolve = |key: &str, default: &str| {
            let dir = lookup(key)
                .filter(|v| !v.is_empty())
                .map_or_else(|| PathBuf::from(default), PathBuf::from);
            if dir.is_absolute() {
                dir
            } else {
                cwd.join(dir)
            }
        };

        Ok(Config {
            addr,
            data_dir: resolve("DATA_DIR", "data"),
            public_dir: resolve("PUBLIC_DIR", "public"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        let cwd = std::env::current_dir().unwrap();

        assert_eq!(config.addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.data_dir, cwd.join("data"));
        assert_eq!(config.public_dir, cwd.join("public"));
    }

    #[test]
    fn absolute_data_dir_is_kept() {
        let config = Config::from_lookup(lookup(&[
            ("DATA_DIR", "/var/lib/board"),
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/board"));
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn rejects_bad_port() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Port(_)));
    }
}
