use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use dockscript_core::{DockscriptConfig, RunConfig};
use tracing::{debug, info};

use crate::directive::{self, DirectiveError};
use crate::encode::{self, DecodeError};
use crate::locate::{InsertionPoint, locate};
use crate::matcher::IgnoreMatcher;
use crate::walk::{WalkError, walk};

/// First line of the script: builds the script itself as a Dockerfile and
/// runs the resulting image.
pub struct Shebang<'a> {
    run: &'a RunConfig,
}

impl<'a> Shebang<'a> {
    pub fn new(run: &'a RunConfig) -> Self {
        Self { run }
    }

    pub fn render(&self) -> String {
        let mut run_flags = format!("--network {}", self.run.network);
        if self.run.interactive {
            run_flags.push_str(" -it");
        }
        if self.run.remove {
            run_flags.push_str(" --rm");
        }

        format!(
            r#"#!/usr/bin/env -S bash -c "docker run {run_flags} \$(docker build --progress {progress} -f \$0 . 2>&1 | tee /dev/stderr | grep -oE 'writing image sha256:[0-9a-f]+' | grep -oE 'sha256:[0-9a-f]+')""#,
            progress = self.run.progress,
        )
    }
}

/// What a run embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblySummary {
    pub files_embedded: usize,
    /// `None` when no anchor was found and directives were appended.
    pub insertion: Option<InsertionPoint>,
    pub ignore_source: Option<PathBuf>,
}

/// Splices embedded-file directives into a Dockerfile.
pub struct ScriptAssembler<'a> {
    root: &'a Path,
    config: &'a DockscriptConfig,
    matcher: IgnoreMatcher,
}

impl<'a> ScriptAssembler<'a> {
    /// Compiles the ignore rules for `root` and registers the built-in
    /// exclusions (Dockerfile, output script, `[script].exclude`).
    pub fn new(root: &'a Path, config: &'a DockscriptConfig) -> Self {
        let mut matcher = IgnoreMatcher::discover(root, &config.script.ignore_files);
        matcher.exclude(&config.script.dockerfile);
        matcher.exclude(&config.script.output);
        for path in &config.script.exclude {
            matcher.exclude(path);
        }
        Self {
            root,
            config,
            matcher,
        }
    }

    /// Also leave `relative_path` out of the script.
    pub fn exclude(mut self, relative_path: &str) -> Self {
        self.matcher.exclude(relative_path);
        self
    }

    /// Writes the shebang, the lines of `source`, and the embedded-file
    /// directives to `sink`.
    ///
    /// Original lines are copied verbatim; a missing final newline is added.
    /// Each file's payload is encoded in memory and written before the next
    /// file is read.
    pub fn assemble<W: Write>(
        &self,
        source: &str,
        sink: &mut W,
    ) -> Result<AssemblySummary, ScriptError> {
        let lines = split_lines(source);
        let insertion = locate(&lines);
        let offset = insertion.map_or(lines.len(), InsertionPoint::offset);
        debug!(?insertion, lines = lines.len(), "located insertion point");

        let output_path = self.root.join(&self.config.script.output);
        let write_err = |e| ScriptError::WriteOutput {
            path: output_path.clone(),
            source: e,
        };

        writeln!(sink, "{}", Shebang::new(&self.config.run).render()).map_err(write_err)?;
        for line in &lines[..offset] {
            writeln!(sink, "{line}").map_err(write_err)?;
        }

        let mut files_embedded = 0;
        for entry in walk(self.root, &self.matcher) {
            let entry = entry?;
            let bytes = entry.read()?;
            let payload = encode::encode(&bytes).map_err(|e| ScriptError::Encode {
                path: entry.path().to_path_buf(),
                source: e,
            })?;
            for step in directive::emit(entry.relative_path(), &payload)? {
                writeln!(sink, "{step}").map_err(write_err)?;
            }
            debug!(path = entry.relative_path(), bytes = bytes.len(), "embedded");
            files_embedded += 1;
        }

        for line in &lines[offset..] {
            writeln!(sink, "{line}").map_err(write_err)?;
        }

        Ok(AssemblySummary {
            files_embedded,
            insertion,
            ignore_source: self.matcher.source().map(Path::to_path_buf),
        })
    }
}

/// Generates `<root>/<output>` from `<root>/<dockerfile>`.
///
/// The script is assembled in a temporary file next to the destination and
/// renamed into place only once complete, so a failed run leaves no output.
pub fn write_script(
    root: &Path,
    config: &DockscriptConfig,
) -> Result<(PathBuf, AssemblySummary), ScriptError> {
    let source_path = root.join(&config.script.dockerfile);
    let source = std::fs::read_to_string(&source_path).map_err(|e| ScriptError::SourceRead {
        path: source_path.clone(),
        source: e,
    })?;

    let output_path = root.join(&config.script.output);
    let output_dir = match output_path.parent() {
        Some(parent) => parent,
        None => root,
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".dockscript-")
        .suffix(".tmp")
        .tempfile_in(output_dir)
        .map_err(|e| ScriptError::CreateOutput {
            path: output_path.clone(),
            source: e,
        })?;

    let tmp_rel = Path::new(&config.script.output)
        // arch-lint: allow(no-silent-result-drop) reason="tempfile names always have a final component"
        .with_file_name(tmp.path().file_name().unwrap_or_default());
    let assembler = ScriptAssembler::new(root, config).exclude(&tmp_rel.to_string_lossy());

    let summary = {
        let mut writer = BufWriter::new(&mut tmp);
        let summary = assembler.assemble(&source, &mut writer)?;
        writer.flush().map_err(|e| ScriptError::WriteOutput {
            path: output_path.clone(),
            source: e,
        })?;
        summary
    };

    make_executable(tmp.as_file()).map_err(|e| ScriptError::WriteOutput {
        path: output_path.clone(),
        source: e,
    })?;
    tmp.persist(&output_path)
        .map_err(|e| ScriptError::PersistOutput {
            path: output_path.clone(),
            source: e.error,
        })?;

    info!(
        output = %output_path.display(),
        files = summary.files_embedded,
        "wrote script"
    );
    Ok((output_path, summary))
}

/// Decodes every embedded payload in the script at `path`.
///
/// Returns the number of payloads checked.
pub fn verify_script(path: &Path) -> Result<usize, ScriptError> {
    let script = std::fs::read_to_string(path).map_err(|e| ScriptError::SourceRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut checked = 0;
    for (index, line) in script.lines().enumerate() {
        if let Some(payload) = directive::parse_write(line) {
            encode::decode(payload).map_err(|e| ScriptError::CorruptPayload {
                path: path.to_path_buf(),
                line: index + 1,
                source: e,
            })?;
            checked += 1;
        }
    }
    Ok(checked)
}

/// Lines of `source` without their `\n`; a trailing newline does not
/// produce an extra empty line.
fn split_lines(source: &str) -> Vec<&str> {
    if source.is_empty() {
        return Vec::new();
    }
    let body = match source.strip_suffix('\n') {
        Some(body) => body,
        None => source,
    };
    body.split('\n').collect()
}

#[cfg(unix)]
fn make_executable(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("failed to read {path}")]
    SourceRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create {path}")]
    CreateOutput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to move finished script into place at {path}")]
    PersistOutput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to embed project files")]
    Walk(#[from] WalkError),
    #[error("failed to encode {path}")]
    Encode {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Directive(#[from] DirectiveError),
    #[error("corrupt payload in {path} at line {line}")]
    CorruptPayload {
        path: PathBuf,
        line: usize,
        source: DecodeError,
    },
}
