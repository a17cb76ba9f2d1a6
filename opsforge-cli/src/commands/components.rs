//! `opsforge components` command handler

use std::io::Write;

use serde::Serialize;

use opsforge_confgen::{ComponentInfo, components};
use opsforge_core::types::Subagent;

use crate::cli::ComponentsArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `components` command.
pub fn execute(args: ComponentsArgs, writer: &OutputWriter) -> Result<(), CliError> {
    let report = catalog_report(args.subagent.map(Subagent::from));
    writer.render(&report)
}

fn catalog_report(filter: Option<Subagent>) -> ComponentsReport {
    ComponentsReport {
        components: components()
            .into_iter()
            .filter(|c| filter.is_none_or(|s| c.subagent == s))
            .collect(),
    }
}

#[derive(Serialize)]
pub struct ComponentsReport {
    pub components: Vec<ComponentInfo>,
}

impl Render for ComponentsReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "{:<10} {:<10} {:<28} Capabilities",
            "Subagent", "Role", "Type"
        )?;
        writeln!(w, "{}", "-".repeat(80))?;
        for c in &self.components {
            let name = if opsforge_core::is_reserved(&c.type_name) {
                c.type_name.cyan().to_string()
            } else {
                c.type_name.clone()
            };
            writeln!(
                w,
                "{:<10} {:<10} {:<28} {}",
                c.subagent.to_string(),
                c.role.to_string(),
                name,
                c.capabilities.join(", ").dimmed()
            )?;
        }
        writeln!(w)?;
        writeln!(w, "{} component type(s)", self.components.len())?;
        Ok(())
    }
}
