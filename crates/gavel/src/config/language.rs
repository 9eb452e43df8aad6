use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::config::ConfigError;
use crate::runner::Program;

const INVALID_FILE_EXT_CHARS: [char; 2] = ['/', '.'];

/// Configuration for a programming language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    /// Human-readable name for the language (e.g., "Go")
    pub name: String,

    /// File extension
    pub extension: FileExtension,

    /// Execution configuration
    pub run: RunConfig,
}

impl Language {
    /// Get the file name a submission is saved under
    pub fn source_name(&self) -> String {
        format!("main.{}", self.extension)
    }

    /// Expand the `{source}` placeholder in the given command
    pub fn expand_command(command: &[String], source: &str) -> Vec<String> {
        command
            .iter()
            .map(|arg| arg.replace("{source}", source))
            .collect()
    }

    /// Build the launch description for a saved source file
    ///
    /// The program runs with the source's directory as its working directory
    /// and `{source}` expands to the bare file name.
    pub fn program(&self, source_path: &Path) -> Program {
        let source = source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| source_path.to_string_lossy().into_owned());

        let working_dir = source_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf);

        Program {
            command: Self::expand_command(&self.run.command, &source),
            env: self.run.env.clone(),
            working_dir,
            compile_error_exit_codes: self.run.compile_error_exit_codes.clone(),
        }
    }
}

/// File extension without dot (e.g., "go")
#[derive(Debug, Clone, Serialize)]
pub struct FileExtension(String);

impl FileExtension {
    pub fn new(extension: &str) -> Result<Self, ConfigError> {
        let contains_invalid = extension
            .chars()
            .any(|c| INVALID_FILE_EXT_CHARS.contains(&c));
        if contains_invalid {
            return Err(ConfigError::InvalidFileExtChars);
        }
        Ok(Self(extension.to_owned()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for FileExtension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FileExtension::new(&s).map_err(|_| {
            de::Error::invalid_value(
                de::Unexpected::Str(&s),
                &"a file extension without '/' or '.' characters",
            )
        })
    }
}

impl std::fmt::Display for FileExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration for running a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Command and arguments with placeholders
    /// Placeholders: {source}
    pub command: Vec<String>,

    /// Environment Variables to set
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Exit codes that mean the toolchain rejected the source.
    ///
    /// Toolchain specific: POSIX shells use 2 for syntax errors. Compiled
    /// languages wrap the build in a shell step that exits with a code of its
    /// own (101 for Go), since a compiler driver like `go run` reuses 1 for
    /// program failures. Other non-zero exits are runtime errors.
    #[serde(default)]
    pub compile_error_exit_codes: Vec<i32>,
}
