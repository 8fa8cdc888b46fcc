//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    /// Maximum archive upload size in bytes (default: 25 MiB).
    #[serde(default = "default_max_archive_bytes")]
    pub max_archive_bytes: usize,
    /// Maximum decompressed size of a single archive entry (default: 25 MiB).
    #[serde(default = "default_max_entry_bytes")]
    pub max_entry_bytes: usize,
    /// Maximum decompressed size of all entries of one archive combined
    /// (default: 100 MiB).
    #[serde(default = "default_max_extracted_bytes")]
    pub max_extracted_bytes: usize,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_max_archive_bytes() -> usize {
    crate::MAX_ARCHIVE_SIZE
}

fn default_max_entry_bytes() -> usize {
    crate::MAX_JSON_BODY_SIZE
}

fn default_max_extracted_bytes() -> usize {
    crate::MAX_EXTRACTED_SIZE
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_enabled: default_metrics_enabled(),
            max_archive_bytes: default_max_archive_bytes(),
            max_entry_bytes: default_max_entry_bytes(),
            max_extracted_bytes: default_max_extracted_bytes(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_archive_bytes == 0 {
            return Err("server.max_archive_bytes must be greater than 0".to_string());
        }
        if self.max_archive_bytes > crate::MAX_ARCHIVE_SIZE {
            return Err(format!(
                "server.max_archive_bytes {} exceeds the hard ceiling of {} bytes",
                self.max_archive_bytes,
                crate::MAX_ARCHIVE_SIZE
            ));
        }
        if self.max_entry_bytes == 0 {
            return Err("server.max_entry_bytes must be greater than 0".to_string());
        }
        if self.max_extracted_bytes < self.max_entry_bytes {
            return Err(format!(
                "server.max_extracted_bytes {} is smaller than server.max_entry_bytes {}",
                self.max_extracted_bytes, self.max_entry_bytes
            ));
        }
        Ok(())
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database.
    Sqlite {
        /// Database file path.
        path: PathBuf,
        /// Busy timeout in seconds while waiting on a locked database.
        #[serde(default = "default_sqlite_busy_timeout_secs")]
        busy_timeout_secs: u64,
    },
}

fn default_sqlite_busy_timeout_secs() -> u64 {
    5
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/critic.db"),
            busy_timeout_secs: default_sqlite_busy_timeout_secs(),
        }
    }
}

impl MetadataConfig {
    /// Validate metadata configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            MetadataConfig::Sqlite { path, .. } if path.as_os_str().is_empty() => {
                Err("metadata.path cannot be empty".to_string())
            }
            MetadataConfig::Sqlite { .. } => Ok(()),
        }
    }
}

/// Credential verification configuration.
///
/// Only the HMAC family (HS256, HS384, HS512) is accepted. Tokens signed
/// with any other algorithm are rejected regardless of their claims.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC secret used to verify credentials.
    /// WARNING: Prefer CRITIC_AUTH__JWT_SECRET over storing it in a config file.
    #[serde(default)]
    pub jwt_secret: String,
    /// Clock skew tolerated when checking `exp`, in seconds (default: 0).
    #[serde(default)]
    pub leeway_secs: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl AuthConfig {
    /// A fixed secret for tests.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            jwt_secret: "test-secret-do-not-use".to_string(),
            leeway_secs: 0,
        }
    }

    /// Validate credential configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.trim().is_empty() {
            return Err(
                "auth.jwt_secret is required (set CRITIC_AUTH__JWT_SECRET or auth.jwt_secret)"
                    .to_string(),
            );
        }
        Ok(())
    }
}

/// External analyzer configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyzersConfig {
    /// Path to the cppcheck executable.
    #[serde(default = "default_cppcheck_path")]
    pub cppcheck_path: String,
    /// Path to the checkstyle executable.
    #[serde(default = "default_checkstyle_path")]
    pub checkstyle_path: String,
    /// Path to the eslint executable.
    #[serde(default = "default_eslint_path")]
    pub eslint_path: String,
    /// Path to the flake8 executable.
    #[serde(default = "default_flake8_path")]
    pub flake8_path: String,
    /// Upper bound on a single tool run, in seconds (default: 60).
    #[serde(default = "default_analyzer_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional JSON Schema applied by the JSON analyzer.
    /// When unset every syntactically valid document passes.
    #[serde(default)]
    pub json_schema_path: Option<PathBuf>,
}

fn default_cppcheck_path() -> String {
    "cppcheck".to_string()
}

fn default_checkstyle_path() -> String {
    "checkstyle".to_string()
}

fn default_eslint_path() -> String {
    "eslint".to_string()
}

fn default_flake8_path() -> String {
    "flake8".to_string()
}

fn default_analyzer_timeout_secs() -> u64 {
    60
}

impl Default for AnalyzersConfig {
    fn default() -> Self {
        Self {
            cppcheck_path: default_cppcheck_path(),
            checkstyle_path: default_checkstyle_path(),
            eslint_path: default_eslint_path(),
            flake8_path: default_flake8_path(),
            timeout_secs: default_analyzer_timeout_secs(),
            json_schema_path: None,
        }
    }
}

impl AnalyzersConfig {
    /// Tool run timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate analyzer configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("analyzers.timeout_secs must be at least 1 second".to_string());
        }
        for (name, value) in [
            ("cppcheck_path", &self.cppcheck_path),
            ("checkstyle_path", &self.checkstyle_path),
            ("eslint_path", &self.eslint_path),
            ("flake8_path", &self.flake8_path),
        ] {
            if value.trim().is_empty() {
                return Err(format!("analyzers.{name} cannot be empty"));
            }
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Credential verification configuration (required).
    pub auth: AuthConfig,
    /// External analyzer configuration.
    #[serde(default)]
    pub analyzers: AnalyzersConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses SQLite metadata at the default path and a
    /// fixed signing secret.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            metadata: MetadataConfig::default(),
            auth: AuthConfig::for_testing(),
            analyzers: AnalyzersConfig::default(),
        }
    }

    /// Validate every section, returning the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.metadata.validate()?;
        self.auth.validate()?;
        self.analyzers.validate()?;
        Ok(())
    }
}
