//! AWK dialect selection.

use std::sync::LazyLock;

use regex::Regex;

/// The AWK dialect a document is parsed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Strict POSIX AWK.
    Awk,
    /// GNU AWK with extensions.
    #[default]
    Gawk,
}

impl Mode {
    /// Parses a mode from its configuration string.
    ///
    /// `"gawk"` selects the extended dialect; any other value selects strict
    /// AWK.
    pub fn from_setting(value: &str) -> Self {
        if value == "gawk" { Self::Gawk } else { Self::Awk }
    }
}

/// Matches a shebang line that selects an AWK interpreter.
static SHEBANG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#!(.*[^a-z])?([a-z]?awk) +-f").expect("shebang pattern should compile")
});

/// Detects a dialect override from the first line of a document.
///
/// A shebang such as `#!/usr/bin/gawk -f` switches the parse to the detected
/// dialect regardless of the configured mode. Returns `None` when the first
/// line is not an AWK shebang.
pub fn detect_mode(source: &str) -> Option<Mode> {
    let first = source.lines().next()?;
    let captures = SHEBANG.captures(first)?;
    match captures.get(2).map(|m| m.as_str()) {
        Some("gawk") => Some(Mode::Gawk),
        Some(_) => Some(Mode::Awk),
        None => None,
    }
}
