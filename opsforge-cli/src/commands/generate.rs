//! `opsforge generate` command handler

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use opsforge_confgen::{OutputFiles, generate};
use opsforge_core::config::OpsforgeConfig;

use crate::cli::GenerateArgs;
use crate::commands::{compile_options, load_unified, platform_facts};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `generate` command.
///
/// Nothing is written unless compilation succeeds for the whole configuration.
pub async fn execute(
    args: GenerateArgs,
    settings: &OpsforgeConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = load_unified(&args.input).await?;
    let platform = platform_facts(settings).await;
    let options = compile_options(settings, args.self_logs);

    let files = generate(&config, args.backend, &platform, &options)?;

    let out_dir = args
        .out_dir
        .unwrap_or_else(|| PathBuf::from(&settings.paths.output_dir));
    write_output(&out_dir, &files).await?;
    info!(backend = %args.backend, out_dir = %out_dir.display(), files = files.len(), "wrote backend configuration");

    let report = GenerateReport {
        backend: args.backend.to_string(),
        out_dir: out_dir.display().to_string(),
        files: files
            .iter()
            .map(|(name, content)| GeneratedFile {
                name: name.clone(),
                bytes: content.len(),
            })
            .collect(),
    };
    writer.render(&report)
}

/// Write every generated file into `dir`, creating it when missing.
pub async fn write_output(dir: &Path, files: &OutputFiles) -> Result<(), CliError> {
    tokio::fs::create_dir_all(dir).await?;
    for (name, content) in files {
        tokio::fs::write(dir.join(name), content).await?;
    }
    Ok(())
}

#[derive(Serialize)]
pub struct GenerateReport {
    pub backend: String,
    pub out_dir: String,
    pub files: Vec<GeneratedFile>,
}

#[derive(Serialize)]
pub struct GeneratedFile {
    pub name: String,
    pub bytes: usize,
}

impl Render for GenerateReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Generated {} configuration in {}",
            self.backend.bold(),
            self.out_dir
        )?;
        for file in &self.files {
            writeln!(
                w,
                "  {} {:<32} {}",
                "✓".green(),
                file.name,
                format!("{} bytes", file.bytes).dimmed()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_output_creates_directory_and_files() {
        let temp = tempfile::tempdir().expect("should create temp dir");
        let dir = temp.path().join("nested").join("out");

        let mut files = OutputFiles::new();
        files.insert("otel.yaml".to_owned(), "receivers: {}\n".to_owned());
        files.insert("extra.conf".to_owned(), "[SERVICE]\n".to_owned());

        write_output(&dir, &files).await.expect("should write files");

        let written = std::fs::read_to_string(dir.join("otel.yaml")).expect("should read back");
        assert_eq!(written, "receivers: {}\n");
        assert!(dir.join("extra.conf").exists());
    }

    #[test]
    fn test_report_text_lists_files() {
        colored::control::set_override(false);
        let report = GenerateReport {
            backend: "fluent-bit".to_owned(),
            out_dir: "/tmp/out".to_owned(),
            files: vec![GeneratedFile {
                name: "fluent_bit_main.conf".to_owned(),
                bytes: 120,
            }],
        };

        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("should render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");

        assert!(output.contains("Generated fluent-bit configuration in /tmp/out"));
        assert!(output.contains("fluent_bit_main.conf"));
        assert!(output.contains("120 bytes"));
    }
}
