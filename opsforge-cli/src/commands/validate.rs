//! `opsforge validate` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use opsforge_confgen::{CompileOptions, UnifiedConfig, generate};
use opsforge_core::config::OpsforgeConfig;
use opsforge_core::platform::PlatformFacts;
use opsforge_core::types::Backend;

use crate::cli::ValidateArgs;
use crate::commands::{compile_options, load_unified, platform_facts};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `validate` command.
///
/// Compiles for each selected backend without writing anything. Parse and
/// structural errors fail immediately; per-backend failures are reported
/// and then turned into [`CliError::Invalid`].
pub async fn execute(
    args: ValidateArgs,
    settings: &OpsforgeConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = load_unified(&args.input).await?;
    let platform = platform_facts(settings).await;
    let options = compile_options(settings, false);

    let backends = if args.backend.is_empty() {
        Backend::ALL.to_vec()
    } else {
        args.backend
    };

    let report = check_backends(
        &args.input.display().to_string(),
        &config,
        &backends,
        &platform,
        &options,
    );
    writer.render(&report)?;

    let failed = report.results.iter().filter(|r| !r.valid).count();
    info!(checked = report.results.len(), failed, "validation finished");
    if failed > 0 {
        return Err(CliError::Invalid {
            failed,
            checked: report.results.len(),
        });
    }
    Ok(())
}

fn check_backends(
    source: &str,
    config: &UnifiedConfig,
    backends: &[Backend],
    platform: &PlatformFacts,
    options: &CompileOptions,
) -> ValidationReport {
    let results = backends
        .iter()
        .map(|&backend| match generate(config, backend, platform, options) {
            Ok(files) => BackendStatus {
                backend: backend.to_string(),
                valid: true,
                files: files.keys().cloned().collect(),
                error: None,
            },
            Err(e) => BackendStatus {
                backend: backend.to_string(),
                valid: false,
                files: Vec::new(),
                error: Some(e.to_string()),
            },
        })
        .collect();

    ValidationReport {
        source: source.to_owned(),
        results,
    }
}

#[derive(Serialize)]
pub struct ValidationReport {
    pub source: String,
    pub results: Vec<BackendStatus>,
}

#[derive(Serialize)]
pub struct BackendStatus {
    pub backend: String,
    pub valid: bool,
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Render for ValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Source: {}", self.source)?;
        writeln!(w)?;
        writeln!(w, "{:<12} {:<8} Files", "Backend", "Status")?;
        writeln!(w, "{}", "-".repeat(60))?;
        for status in &self.results {
            if status.valid {
                writeln!(
                    w,
                    "{:<12} {:<8} {}",
                    status.backend,
                    "OK".green(),
                    status.files.join(", ")
                )?;
            } else {
                writeln!(w, "{:<12} {:<8}", status.backend, "FAILED".red().bold())?;
                if let Some(error) = &status.error {
                    writeln!(w, "  {}", error.dimmed())?;
                }
            }
        }
        Ok(())
    }
}
