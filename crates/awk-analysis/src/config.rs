//! Configuration for this crate.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use awk_grammar::Mode;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

/// Configuration for `awk-analysis`.
///
/// This type is a wrapper around an `Arc`, and so can be cheaply cloned and
/// sent between threads.
#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    /// The actual fields, `Arc`ed up for easy cloning.
    #[serde(flatten)]
    inner: Arc<ConfigInner>,
}

// Custom `Debug` impl for the `Config` wrapper type that simplifies away the
// arc and the private inner struct
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("max_number_of_problems", &self.inner.max_number_of_problems)
            .field("mode", &self.inner.mode)
            .field("stylistic_warnings", &self.inner.stylistic_warnings)
            .field("path", &self.inner.path)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inner: Arc::new(ConfigInner::default()),
        }
    }
}

impl Config {
    /// Gets the maximum number of diagnostics published per document.
    pub fn max_number_of_problems(&self) -> usize {
        self.inner.max_number_of_problems
    }

    /// Gets the configured dialect.
    pub fn mode(&self) -> Mode {
        self.inner.mode
    }

    /// Gets the stylistic warning settings.
    pub fn stylistic_warnings(&self) -> &StylisticWarnings {
        &self.inner.stylistic_warnings
    }

    /// Gets the include search path.
    ///
    /// Falls back to the `AWKPATH` environment variable split on `:`, and
    /// finally to the current directory.
    pub fn include_path(&self) -> Vec<PathBuf> {
        if let Some(path) = &self.inner.path {
            return path.clone();
        }

        if let Ok(awkpath) = env::var("AWKPATH") {
            let entries: Vec<PathBuf> = awkpath
                .split(':')
                .filter(|e| !e.is_empty())
                .map(PathBuf::from)
                .collect();
            if !entries.is_empty() {
                return entries;
            }
        }

        vec![PathBuf::from(".")]
    }

    /// Returns a new configuration with the maximum number of problems
    /// replaced by the argument.
    pub fn with_max_number_of_problems(&self, max: usize) -> Self {
        let mut inner = (*self.inner).clone();
        inner.max_number_of_problems = max;
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns a new configuration with the dialect replaced by the argument.
    pub fn with_mode(&self, mode: Mode) -> Self {
        let mut inner = (*self.inner).clone();
        inner.mode = mode;
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns a new configuration with the stylistic warning settings
    /// replaced by the argument.
    pub fn with_stylistic_warnings(&self, warnings: StylisticWarnings) -> Self {
        let mut inner = (*self.inner).clone();
        inner.stylistic_warnings = warnings;
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns a new configuration with the include search path replaced by
    /// the argument.
    pub fn with_path(&self, path: Option<Vec<PathBuf>>) -> Self {
        let mut inner = (*self.inner).clone();
        inner.path = path;
        Self {
            inner: Arc::new(inner),
        }
    }
}

/// The actual configuration fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
struct ConfigInner {
    /// The maximum number of diagnostics published per document.
    max_number_of_problems: usize,
    /// The configured dialect.
    #[serde(
        serialize_with = "serialize_mode",
        deserialize_with = "deserialize_mode"
    )]
    mode: Mode,
    /// The stylistic warning settings.
    stylistic_warnings: StylisticWarnings,
    /// The include search path, if explicitly configured.
    path: Option<Vec<PathBuf>>,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            max_number_of_problems: 100,
            mode: Mode::Gawk,
            stylistic_warnings: StylisticWarnings::default(),
            path: None,
        }
    }
}

/// Settings for stylistic warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StylisticWarnings {
    /// Whether to emit warnings for statements terminated by a newline
    /// instead of a `;`.
    pub missing_semicolon: bool,
    /// Whether to emit warnings for extended-dialect syntax in strict mode,
    /// and to include gawk-only built-ins in hover.
    pub compatibility: bool,
    /// Whether to check function call arity across documents.
    pub check_function_calls: bool,
}

impl Default for StylisticWarnings {
    fn default() -> Self {
        Self {
            missing_semicolon: false,
            compatibility: true,
            check_function_calls: true,
        }
    }
}

/// Serializes a mode as its configuration string.
fn serialize_mode<S: Serializer>(mode: &Mode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(match mode {
        Mode::Gawk => "gawk",
        Mode::Awk => "awk",
    })
}

/// Deserializes a mode from its configuration string.
///
/// `"gawk"` selects the extended dialect; any other value selects strict AWK.
fn deserialize_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Mode, D::Error> {
    let value = String::deserialize(deserializer)?;
    Ok(Mode::from_setting(&value))
}
