//! Render command implementation

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::cli::{RenderCommands, RenderTemplateArgs};
use crate::commands::common::parse_variables;

/// Execute a render subcommand
pub(crate) fn execute(command: &RenderCommands) -> Result<()> {
    match command {
        RenderCommands::Template(args) => template(args),
    }
}

fn template(args: &RenderTemplateArgs) -> Result<()> {
    let data = parse_variables(&args.variables)?;
    let path = Path::new(&args.template_path);
    if !path.is_file() {
        anyhow::bail!("Template {} does not exist", path.display());
    }
    let rendered = sf_jinja::render_file(path, &data)?;

    match &args.output_file {
        Some(output) => {
            fs::write(output, &rendered).with_context(|| format!("Failed to write {}", output))?;
            log::info!("Rendered {} to {}", path.display(), output);
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
