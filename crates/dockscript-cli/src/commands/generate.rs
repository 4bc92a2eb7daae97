use std::path::Path;

use dockscript_build::{ScriptError, verify_script, write_script};
use dockscript_core::DockscriptConfig;

/// Generate the self-building script for the project in `project_dir`.
pub fn generate(project_dir: &Path, verify: bool) -> anyhow::Result<()> {
    let config = DockscriptConfig::load(project_dir)?;
    let dir = project_dir.display();

    let (output, summary) = write_script(project_dir, &config).map_err(|e| {
        let context = match &e {
            ScriptError::SourceRead { .. } => {
                format!("cannot open {} in {dir}", config.script.dockerfile)
            }
            ScriptError::CreateOutput { .. }
            | ScriptError::WriteOutput { .. }
            | ScriptError::PersistOutput { .. } => {
                format!("cannot create {} in {dir}", config.script.output)
            }
            _ => format!("cannot embed project files from {dir}"),
        };
        anyhow::Error::new(e).context(context)
    })?;

    match &summary.ignore_source {
        Some(source) => tracing::info!(source = %source.display(), "applied ignore rules"),
        None => tracing::info!("no ignore file found, embedding every file"),
    }
    if summary.insertion.is_none() {
        tracing::warn!(
            "no FROM, WORKDIR, COPY or ADD instruction found; embedded files were appended at the end"
        );
    }

    if verify {
        let checked = verify_script(&output)?;
        println!("Verified {checked} embedded files");
    }

    println!(
        "{} created successfully in {dir} ({} files embedded)",
        config.script.output, summary.files_embedded
    );
    Ok(())
}
