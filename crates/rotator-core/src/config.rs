use crate::error::{Result, RotatorError};
use crate::executor::PollPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ClusterConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// First path segment of the published parameter.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    "kubestock".to_string()
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

// ---------------------------------------------------------------------------
// TargetConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_label_key")]
    pub label_key: String,
    #[serde(default = "default_label_value")]
    pub label_value: String,
}

fn default_label_key() -> String {
    "Name".to_string()
}

fn default_label_value() -> String {
    "kubestock-control-plane".to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            label_key: default_label_key(),
            label_value: default_label_value(),
        }
    }
}

// ---------------------------------------------------------------------------
// CommandsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Prints a fresh join token on stdout.
    #[serde(default = "default_create_command")]
    pub create: String,
    /// Read-only; prints the number of active tokens.
    #[serde(default = "default_count_command")]
    pub count_active: String,
    /// Remote-side execution timeout for each dispatched command.
    #[serde(default = "default_command_timeout")]
    pub timeout_seconds: u32,
}

fn default_create_command() -> String {
    "sudo kubeadm token create".to_string()
}

fn default_count_command() -> String {
    r#"sudo kubeadm token list -o jsonpath="{.token}" 2>/dev/null | wc -w || echo "0""#.to_string()
}

fn default_command_timeout() -> u32 {
    60
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            create: default_create_command(),
            count_active: default_count_command(),
            timeout_seconds: default_command_timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// PollingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_interval() -> u64 {
    2
}

fn default_max_attempts() -> u32 {
    30
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

// ---------------------------------------------------------------------------
// SsmConfig
// ---------------------------------------------------------------------------

pub const ENDPOINT_ENV: &str = "AWS_ENDPOINT_URL_SSM";
pub const REGION_ENV: &str = "AWS_REGION";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsmConfig {
    /// Base URL requests are posted to, typically a SigV4 signing proxy.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default = "default_document")]
    pub document: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_document() -> String {
    "AWS-RunShellScript".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for SsmConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: None,
            document: default_document(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl SsmConfig {
    /// Resolve the SSM base URL.
    ///
    /// Priority:
    /// 1. `ssm.endpoint` from the config file
    /// 2. `AWS_ENDPOINT_URL_SSM`
    /// 3. the regional endpoint for `ssm.region` or `AWS_REGION`
    pub fn resolve_endpoint(&self) -> Result<String> {
        self.resolve_endpoint_with(|key| std::env::var(key).ok())
    }

    fn resolve_endpoint_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<String> {
        if let Some(endpoint) = self.endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
            return Ok(endpoint.trim_end_matches('/').to_string());
        }
        if let Some(endpoint) = env(ENDPOINT_ENV).filter(|e| !e.trim().is_empty()) {
            return Ok(endpoint.trim_end_matches('/').to_string());
        }
        let region = self
            .region
            .clone()
            .or_else(|| env(REGION_ENV))
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| {
                RotatorError::Config(format!(
                    "no SSM endpoint: set ssm.endpoint, ssm.region, {ENDPOINT_ENV} or {REGION_ENV}"
                ))
            })?;
        Ok(format!("https://ssm.{region}.amazonaws.com"))
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub ssm: SsmConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            cluster: ClusterConfig::default(),
            target: TargetConfig::default(),
            commands: CommandsConfig::default(),
            polling: PollingConfig::default(),
            ssm: SsmConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RotatorError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Name the join token is published under.
    pub fn parameter_name(&self) -> String {
        format!("/{}/join-token", self.cluster.namespace)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.polling.interval_seconds),
            max_attempts: self.polling.max_attempts,
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        if self.target.label_key.trim().is_empty() || self.target.label_value.trim().is_empty() {
            error("target.label_key and target.label_value must both be set".to_string());
        }
        if self.commands.create.trim().is_empty() {
            error("commands.create is empty".to_string());
        }
        if self.polling.max_attempts == 0 {
            error("polling.max_attempts is 0: every command would time out unobserved".to_string());
        }
        let ns = &self.cluster.namespace;
        if ns.is_empty() || ns.contains('/') {
            error(format!(
                "cluster.namespace '{ns}' must be a single non-empty path segment"
            ));
        }

        let ceiling = self.poll_policy().ceiling().as_secs();
        if self.polling.max_attempts > 0 && ceiling < u64::from(self.commands.timeout_seconds) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "polling gives up after {ceiling}s but commands may run for {}s",
                    self.commands.timeout_seconds
                ),
            });
        }
        if ceiling > 900 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("polling may block for {ceiling}s (>900s is unusual)"),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_the_stock_deployment() {
        let cfg = Config::default();
        assert_eq!(cfg.parameter_name(), "/kubestock/join-token");
        assert_eq!(cfg.target.label_key, "Name");
        assert_eq!(cfg.target.label_value, "kubestock-control-plane");
        assert_eq!(cfg.commands.create, "sudo kubeadm token create");
        assert_eq!(cfg.commands.timeout_seconds, 60);
        assert_eq!(cfg.poll_policy(), PollPolicy::default());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "cluster:\n  namespace: prod\npolling:\n  max_attempts: 5\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.parameter_name(), "/prod/join-token");
        assert_eq!(cfg.polling.max_attempts, 5);
        assert_eq!(cfg.polling.interval_seconds, 2);
        assert_eq!(cfg.ssm.document, "AWS-RunShellScript");
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, RotatorError::Config(_)));
    }

    #[test]
    fn load_empty_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rotator.yaml");
        std::fs::write(&path, "\n").unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.version, 1);
    }

    #[test]
    fn load_reads_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rotator.yaml");
        std::fs::write(
            &path,
            "target:\n  label_key: Role\n  label_value: cp\nssm:\n  endpoint: http://127.0.0.1:8080/\n",
        )
        .unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.target.label_key, "Role");
        assert_eq!(cfg.target.label_value, "cp");
        assert_eq!(cfg.ssm.resolve_endpoint().unwrap(), "http://127.0.0.1:8080");
    }

    #[test]
    fn endpoint_falls_back_to_env_then_region() {
        let ssm = SsmConfig::default();
        let from_env = ssm
            .resolve_endpoint_with(|k| (k == ENDPOINT_ENV).then(|| "http://proxy:8080".to_string()))
            .unwrap();
        assert_eq!(from_env, "http://proxy:8080");

        let from_region = ssm
            .resolve_endpoint_with(|k| (k == REGION_ENV).then(|| "eu-west-1".to_string()))
            .unwrap();
        assert_eq!(from_region, "https://ssm.eu-west-1.amazonaws.com");

        let configured = SsmConfig {
            region: Some("us-east-2".to_string()),
            ..SsmConfig::default()
        };
        assert_eq!(
            configured.resolve_endpoint_with(|_| None).unwrap(),
            "https://ssm.us-east-2.amazonaws.com"
        );

        let err = ssm.resolve_endpoint_with(|_| None).unwrap_err();
        assert!(matches!(err, RotatorError::Config(_)));
    }

    #[test]
    fn validate_default_config_no_warnings() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_zero_attempts_is_error() {
        let mut cfg = Config::default();
        cfg.polling.max_attempts = 0;
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("max_attempts is 0")));
    }

    #[test]
    fn validate_bad_namespace_and_empty_command() {
        let mut cfg = Config::default();
        cfg.cluster.namespace = "a/b".to_string();
        cfg.commands.create = "  ".to_string();
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains("'a/b'")));
        assert!(warnings.iter().any(|w| w.message.contains("commands.create")));
    }

    #[test]
    fn validate_short_ceiling_warns() {
        let mut cfg = Config::default();
        cfg.polling.max_attempts = 5;
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Warning);
        assert!(warnings[0].message.contains("gives up after 10s"));
    }

    #[test]
    fn validate_long_ceiling_warns() {
        let mut cfg = Config::default();
        cfg.polling.interval_seconds = 60;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains(">900s is unusual")));
    }
}
