use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

/// Name of the optional per-project configuration file.
pub const CONFIG_FILE_NAME: &str = "dockscript.toml";

/// dockscript.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockscriptConfig {
    #[serde(default)]
    pub script: ScriptConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Build file to read, relative to the project directory
    #[serde(default = "default_dockerfile")]
    pub dockerfile: String,
    /// Script to write, relative to the project directory
    #[serde(default = "default_output")]
    pub output: String,
    /// Ignore files probed in order; the first one that exists is used
    #[serde(default = "default_ignore_files")]
    pub ignore_files: Vec<String>,
    /// Paths never embedded, independent of the ignore file
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

/// Options for the `docker run` / `docker build` pipeline in the shebang.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Value passed to `docker run --network`
    #[serde(default = "default_network")]
    pub network: String,
    /// Attach a TTY and stdin (`-it`)
    #[serde(default = "default_true")]
    pub interactive: bool,
    /// Remove the container on exit (`--rm`)
    #[serde(default = "default_true")]
    pub remove: bool,
    /// Value passed to `docker build --progress`
    #[serde(default = "default_progress")]
    pub progress: String,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            dockerfile: default_dockerfile(),
            output: default_output(),
            ignore_files: default_ignore_files(),
            exclude: default_exclude(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            interactive: true,
            remove: true,
            progress: default_progress(),
        }
    }
}

impl DockscriptConfig {
    /// Load from dockscript.toml in the given directory, or return defaults if not found.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE_NAME);
        let config: Self = if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path.clone(),
                source: e,
            })?
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make the generated script read or write
    /// outside the project directory, or produce a broken shebang.
    pub fn validate(&self) -> crate::Result<()> {
        check_relative("dockerfile", &self.script.dockerfile)?;
        check_relative("output", &self.script.output)?;
        if self.script.dockerfile == self.script.output {
            return Err(crate::Error::InvalidValue {
                field: "output",
                value: self.script.output.clone(),
                reason: "must differ from dockerfile",
            });
        }
        for name in &self.script.ignore_files {
            check_relative("ignore_files entry", name)?;
        }
        check_shell_word("network", &self.run.network)?;
        check_shell_word("progress", &self.run.progress)?;
        Ok(())
    }
}

fn check_relative(field: &'static str, value: &str) -> crate::Result<()> {
    let invalid = |reason| crate::Error::InvalidValue {
        field,
        value: value.to_owned(),
        reason,
    };

    if value.is_empty() {
        return Err(invalid("must not be empty"));
    }
    let path = Path::new(value);
    if path.is_absolute() {
        return Err(invalid("must be relative to the project directory"));
    }
    if path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(invalid("must not leave the project directory"));
    }
    Ok(())
}

fn check_shell_word(field: &'static str, value: &str) -> crate::Result<()> {
    let ok = !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'));
    if ok {
        Ok(())
    } else {
        Err(crate::Error::InvalidValue {
            field,
            value: value.to_owned(),
            reason: "must be a single word of [A-Za-z0-9._:-]",
        })
    }
}

fn default_dockerfile() -> String {
    "Dockerfile".to_owned()
}

fn default_output() -> String {
    "Dockerfile.script".to_owned()
}

fn default_ignore_files() -> Vec<String> {
    vec![".gitignore".to_owned(), ".dockerignore".to_owned()]
}

fn default_exclude() -> Vec<String> {
    vec![".git".to_owned()]
}

fn default_network() -> String {
    "host".to_owned()
}

fn default_progress() -> String {
    "plain".to_owned()
}

fn default_true() -> bool {
    true
}
