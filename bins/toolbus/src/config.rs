//! Launcher configuration.
//!
//! One declarative YAML file describes the router and the list of backend
//! processes to supervise, replacing the per-combination launch scripts the
//! original tooling accumulated.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// Top-level launcher configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LauncherConfig {
    #[serde(default)]
    pub router: RouterOptions,
    #[serde(default)]
    pub readiness: ReadinessOptions,
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

/// How to launch (or find) the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterOptions {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_router_port")]
    pub port: u16,
    #[serde(default = "default_router_executable")]
    pub executable_path: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Have the router answer backend namespaces locally instead of proxying.
    #[serde(default)]
    pub mock_backends: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_router_port(),
            executable_path: default_router_executable(),
            args: Vec::new(),
            mock_backends: false,
        }
    }
}

/// Retry budget applied to every readiness wait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessOptions {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_interval", with = "duration_serde")]
    pub interval: Duration,
}

impl Default for ReadinessOptions {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval: default_interval(),
        }
    }
}

/// One supervised backend process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Label, also used for mode filtering ("asset", "engine", ...).
    pub id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub executable_path: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub environment: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    /// Base URL whose `/status` answers the readiness probe.
    pub status_url: String,
    /// An optional backend that fails to launch or come up only warns;
    /// the system continues in degraded mode.
    #[serde(default = "default_optional")]
    pub optional: bool,
}

impl LauncherConfig {
    /// Load configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string.
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: LauncherConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for backend in &self.backends {
            if backend.id.trim().is_empty() {
                bail!("backend id must not be empty");
            }
            if !seen.insert(backend.id.as_str()) {
                bail!("duplicate backend id: {}", backend.id);
            }
            if backend.status_url.trim().is_empty() {
                bail!("backend {} has an empty status_url", backend.id);
            }
        }
        Ok(())
    }

    /// Router base URL as seen from this machine.
    ///
    /// A router bound to 0.0.0.0 is probed via localhost.
    pub fn router_base_url(&self) -> String {
        let host = if self.router.host == "0.0.0.0" {
            "127.0.0.1"
        } else {
            &self.router.host
        };
        format!("http://{}:{}", host, self.router.port)
    }
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_router_port() -> u16 {
    8080
}

fn default_router_executable() -> String {
    "toolbus-router".to_string()
}

fn default_max_attempts() -> u32 {
    15
}

fn default_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_enabled() -> bool {
    true
}

fn default_optional() -> bool {
    true
}

// Custom serialization for Duration ("2s", "500ms", "1m")
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}ms", duration.as_millis()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    fn parse_duration(s: &str) -> Result<Duration, String> {
        // Check for "ms" BEFORE "s" since "ms" ends with 's'
        if let Some(num) = s.strip_suffix("ms") {
            let millis: u64 = num.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_millis(millis))
        } else if let Some(num) = s.strip_suffix('s') {
            let secs: u64 = num.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_secs(secs))
        } else if let Some(num) = s.strip_suffix('m') {
            let mins: u64 = num.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_secs(mins * 60))
        } else {
            Err(format!("Duration must end with 's', 'ms', or 'm': {}", s))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = LauncherConfig::load_from_string("{}").unwrap();
        assert_eq!(config.router.port, 8080);
        assert_eq!(config.readiness.max_attempts, 15);
        assert_eq!(config.readiness.interval, Duration::from_secs(2));
        assert!(config.backends.is_empty());
    }

    #[test]
    fn test_full_config_parses() {
        let yaml = r#"
router:
  host: 0.0.0.0
  port: 9090
  mock_backends: true
readiness:
  max_attempts: 3
  interval: 500ms
backends:
  - id: asset
    executable_path: /opt/asset-backend
    args: ["--background"]
    environment:
      ASSET_EXPORT_DIR: ./exports
    status_url: http://127.0.0.1:8081
  - id: engine
    enabled: false
    executable_path: /opt/engine-backend
    status_url: http://127.0.0.1:8082
    optional: false
"#;
        let config = LauncherConfig::load_from_string(yaml).unwrap();
        assert_eq!(config.router.port, 9090);
        assert!(config.router.mock_backends);
        assert_eq!(config.readiness.interval, Duration::from_millis(500));
        assert_eq!(config.backends.len(), 2);
        assert!(config.backends[0].enabled);
        assert!(config.backends[0].optional);
        assert!(!config.backends[1].enabled);
        assert!(!config.backends[1].optional);
        // 0.0.0.0 is probed via localhost
        assert_eq!(config.router_base_url(), "http://127.0.0.1:9090");
    }

    #[test]
    fn test_duplicate_backend_ids_are_rejected() {
        let yaml = r#"
backends:
  - id: asset
    executable_path: a
    status_url: http://127.0.0.1:8081
  - id: asset
    executable_path: b
    status_url: http://127.0.0.1:8083
"#;
        assert!(LauncherConfig::load_from_string(yaml).is_err());
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        let yaml = r#"
readiness:
  interval: fast
"#;
        assert!(LauncherConfig::load_from_string(yaml).is_err());
    }
}
