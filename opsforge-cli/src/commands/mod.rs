//! Command handlers -- one module per subcommand

pub mod components;
pub mod generate;
pub mod validate;

use std::path::Path;

use tracing::debug;

use opsforge_confgen::{CompileOptions, UnifiedConfig};
use opsforge_core::config::OpsforgeConfig;
use opsforge_core::platform::PlatformFacts;

use crate::error::CliError;

/// Read and parse a unified configuration file.
pub(crate) async fn load_unified(path: &Path) -> Result<UnifiedConfig, CliError> {
    let yaml = tokio::fs::read_to_string(path).await.map_err(|e| {
        CliError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })?;
    debug!(path = %path.display(), bytes = yaml.len(), "read unified configuration");
    Ok(UnifiedConfig::parse(&yaml)?)
}

/// Platform facts for the current host.
pub(crate) async fn platform_facts(settings: &OpsforgeConfig) -> PlatformFacts {
    PlatformFacts::from_config(settings, detect_hostname().await)
}

/// Compile options from settings; `--self-logs` can only switch the pipeline on.
pub(crate) fn compile_options(settings: &OpsforgeConfig, self_logs: bool) -> CompileOptions {
    CompileOptions {
        self_logs: self_logs || settings.general.self_logs,
        default_log_level: settings.general.backend_log_level.clone(),
    }
}

async fn detect_hostname() -> String {
    for key in ["OPSFORGE_HOSTNAME", "HOSTNAME"] {
        if let Ok(name) = std::env::var(key) {
            let name = name.trim();
            if !name.is_empty() {
                return name.to_owned();
            }
        }
    }
    match tokio::fs::read_to_string("/etc/hostname").await {
        Ok(name) if !name.trim().is_empty() => name.trim().to_owned(),
        _ => "localhost".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_logs_flag_or_settings() {
        let mut settings = OpsforgeConfig::default();
        settings.general.self_logs = false;
        assert!(!compile_options(&settings, false).self_logs);
        assert!(compile_options(&settings, true).self_logs);

        settings.general.self_logs = true;
        assert!(compile_options(&settings, false).self_logs);
    }

    #[test]
    fn test_backend_log_level_comes_from_settings() {
        let mut settings = OpsforgeConfig::default();
        settings.general.backend_log_level = "debug".to_owned();
        assert_eq!(compile_options(&settings, false).default_log_level, "debug");
    }

    #[tokio::test]
    async fn test_load_unified_missing_file_is_io_error() {
        let err = load_unified(Path::new("/nonexistent/agent.yaml"))
            .await
            .expect_err("missing file should fail");
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("/nonexistent/agent.yaml"));
    }

    #[tokio::test]
    async fn test_hostname_is_never_empty() {
        assert!(!detect_hostname().await.is_empty());
    }
}
