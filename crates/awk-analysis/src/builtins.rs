//! Representation of AWK built-in functions and variables.

use std::sync::LazyLock;

use awk_grammar::Mode;
use indexmap::IndexMap;

/// The kind of a built-in symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    /// A built-in function.
    Function,
    /// A built-in variable.
    Variable,
}

/// A built-in function or variable.
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    /// The symbol name.
    pub name: &'static str,
    /// The symbol kind.
    pub kind: BuiltinKind,
    /// The parameter names, in order; empty for variables.
    pub parameters: &'static [&'static str],
    /// The index of the first optional parameter, if any.
    pub first_optional: Option<usize>,
    /// Whether the function accepts additional arguments past its listed
    /// parameters.
    pub variadic: bool,
    /// Whether the symbol exists only in the extended (gawk) dialect.
    pub gawk_only: bool,
    /// A one-line description.
    pub description: &'static str,
}

impl Builtin {
    /// Whether the built-in is available under the given dialect.
    pub fn available(&self, mode: Mode) -> bool {
        mode == Mode::Gawk || !self.gawk_only
    }

    /// Renders the built-in's signature.
    ///
    /// Variables render as their bare name.
    pub fn signature(&self) -> String {
        match self.kind {
            BuiltinKind::Variable => self.name.to_string(),
            BuiltinKind::Function => {
                format_signature(self.name, self.parameters.iter().copied(), self.first_optional)
            }
        }
    }
}

/// Renders a function signature with optional parameters bracketed.
pub fn format_signature<'a>(
    name: &str,
    parameters: impl IntoIterator<Item = &'a str>,
    first_optional: Option<usize>,
) -> String {
    let mut signature = format!("{name}(");
    let mut brackets = 0;
    for (i, parameter) in parameters.into_iter().enumerate() {
        let optional = first_optional.is_some_and(|f| i >= f);
        match (i, optional) {
            (0, false) => {}
            (0, true) => {
                signature.push('[');
                brackets += 1;
            }
            (_, false) => signature.push_str(", "),
            (_, true) => {
                signature.push_str(" [, ");
                brackets += 1;
            }
        }
        signature.push_str(parameter);
    }
    for _ in 0..brackets {
        signature.push(']');
    }
    signature.push(')');
    signature
}

/// A shorthand for a built-in function entry.
const fn function(
    name: &'static str,
    parameters: &'static [&'static str],
    first_optional: Option<usize>,
    gawk_only: bool,
    description: &'static str,
) -> Builtin {
    Builtin {
        name,
        kind: BuiltinKind::Function,
        parameters,
        first_optional,
        variadic: false,
        gawk_only,
        description,
    }
}

/// A shorthand for a built-in variable entry.
const fn variable(name: &'static str, gawk_only: bool, description: &'static str) -> Builtin {
    Builtin {
        name,
        kind: BuiltinKind::Variable,
        parameters: &[],
        first_optional: None,
        variadic: false,
        gawk_only,
        description,
    }
}

/// The built-in table entries.
const ENTRIES: &[Builtin] = &[
    // Arithmetic functions
    function("atan2", &["y", "x"], None, false, "Returns the arctangent of `y / x` in radians."),
    function("cos", &["x"], None, false, "Returns the cosine of `x`, with `x` in radians."),
    function("exp", &["x"], None, false, "Returns the exponential of `x`."),
    function("int", &["x"], None, false, "Truncates `x` toward zero."),
    function("log", &["x"], None, false, "Returns the natural logarithm of `x`."),
    function("rand", &[], None, false, "Returns a random number between zero and one."),
    function("sin", &["x"], None, false, "Returns the sine of `x`, with `x` in radians."),
    function("sqrt", &["x"], None, false, "Returns the square root of `x`."),
    function(
        "srand",
        &["seed"],
        Some(0),
        false,
        "Seeds the random number generator and returns the previous seed.",
    ),
    // String functions
    function(
        "gsub",
        &["regexp", "replacement", "target"],
        Some(2),
        false,
        "Replaces every match of `regexp` in `target` (default `$0`); returns the number of substitutions.",
    ),
    function("index", &["haystack", "needle"], None, false, "Returns the position of `needle` in `haystack`, or zero."),
    function(
        "length",
        &["string"],
        Some(0),
        false,
        "Returns the length of `string`, or of `$0` when called without an argument.",
    ),
    function(
        "match",
        &["string", "regexp"],
        None,
        false,
        "Searches `string` for `regexp`; sets `RSTART` and `RLENGTH`.",
    ),
    function(
        "split",
        &["string", "array", "fieldsep"],
        Some(2),
        false,
        "Splits `string` into `array` on `fieldsep` (default `FS`); returns the number of elements.",
    ),
    function(
        "sub",
        &["regexp", "replacement", "target"],
        Some(2),
        false,
        "Replaces the first match of `regexp` in `target` (default `$0`); returns the number of substitutions.",
    ),
    function("substr", &["string", "start", "length"], Some(2), false, "Returns the substring of `string` starting at `start`."),
    function("tolower", &["string"], None, false, "Returns `string` with uppercase characters folded to lowercase."),
    function("toupper", &["string"], None, false, "Returns `string` with lowercase characters folded to uppercase."),
    Builtin {
        name: "sprintf",
        kind: BuiltinKind::Function,
        parameters: &["format", "expression"],
        first_optional: Some(1),
        variadic: true,
        gawk_only: false,
        description: "Formats `expression`s according to `format` and returns the result.",
    },
    // Input/output functions
    function("close", &["expression"], None, false, "Closes the file or command named by `expression`."),
    function(
        "fflush",
        &["expression"],
        Some(0),
        false,
        "Flushes buffered output for the file or command named by `expression`, or all output.",
    ),
    function("system", &["command"], None, false, "Runs `command` via the shell and returns its exit status."),
    // gawk extension functions
    function("and", &["a", "b"], None, true, "Returns the bitwise AND of its arguments."),
    function("asort", &["source", "dest"], Some(1), true, "Sorts `source` by value; returns the number of elements."),
    function("asorti", &["source", "dest"], Some(1), true, "Sorts `source` by index; returns the number of elements."),
    function("compl", &["x"], None, true, "Returns the bitwise complement of `x`."),
    function(
        "gensub",
        &["regexp", "replacement", "how", "target"],
        Some(3),
        true,
        "Generalized substitution on `target` (default `$0`); returns the modified string.",
    ),
    function("isarray", &["x"], None, true, "Whether `x` is an array."),
    function("lshift", &["x", "count"], None, true, "Returns `x` shifted left by `count` bits."),
    function("mktime", &["datespec"], None, true, "Converts `datespec` to a timestamp in seconds since the epoch."),
    function("or", &["a", "b"], None, true, "Returns the bitwise OR of its arguments."),
    function(
        "patsplit",
        &["string", "array", "fieldpat"],
        Some(2),
        true,
        "Splits `string` into `array` on matches of `fieldpat` (default `FPAT`).",
    ),
    function("rshift", &["x", "count"], None, true, "Returns `x` shifted right by `count` bits."),
    function(
        "strftime",
        &["format", "timestamp"],
        Some(0),
        true,
        "Formats `timestamp` (default now) according to `format`.",
    ),
    function("strtonum", &["string"], None, true, "Examines `string` and returns its numeric value."),
    function("systime", &[], None, true, "Returns the current time in seconds since the epoch."),
    function("typeof", &["x"], None, true, "Returns a string describing the type of `x`."),
    function("xor", &["a", "b"], None, true, "Returns the bitwise XOR of its arguments."),
    // Variables
    variable("ARGC", false, "The number of command line arguments."),
    variable("ARGV", false, "The array of command line arguments."),
    variable("CONVFMT", false, "The conversion format for numbers, `\"%.6g\"` by default."),
    variable("ENVIRON", false, "The array of environment variables."),
    variable("FILENAME", false, "The name of the current input file."),
    variable("FNR", false, "The record number in the current input file."),
    variable("FS", false, "The input field separator, a space by default."),
    variable("NF", false, "The number of fields in the current record."),
    variable("NR", false, "The total number of input records seen so far."),
    variable("OFMT", false, "The output format for numbers, `\"%.6g\"` by default."),
    variable("OFS", false, "The output field separator, a space by default."),
    variable("ORS", false, "The output record separator, a newline by default."),
    variable("RLENGTH", false, "The length of the string matched by `match`."),
    variable("RS", false, "The input record separator, a newline by default."),
    variable("RSTART", false, "The start of the string matched by `match`."),
    variable("SUBSEP", false, "The subscript separator for multi-dimensional arrays."),
    // gawk extension variables
    variable("BINMODE", true, "Controls binary mode for file I/O on non-POSIX systems."),
    variable("ERRNO", true, "A string describing the most recent system error."),
    variable("FIELDWIDTHS", true, "A whitespace-separated list of fixed field widths."),
    variable("FPAT", true, "A regular expression describing the contents of a field."),
    variable("FUNCTAB", true, "An array whose indices are the names of all defined functions."),
    variable("IGNORECASE", true, "When nonzero, string operations ignore case."),
    variable("PROCINFO", true, "An array with information about the running program."),
    variable("RT", true, "The input text that matched the record separator."),
    variable("SYMTAB", true, "An array whose indices are the names of all global variables."),
    variable("TEXTDOMAIN", true, "The text domain for internationalized messages."),
];

/// The built-in table, indexed by name.
pub static BUILTINS: LazyLock<IndexMap<&'static str, Builtin>> = LazyLock::new(|| {
    let mut map = IndexMap::with_capacity(ENTRIES.len());
    for entry in ENTRIES {
        let previous = map.insert(entry.name, *entry);
        assert!(previous.is_none(), "duplicate built-in `{name}`", name = entry.name);
    }
    map
});

/// Looks up a built-in by name.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.get(name)
}

/// Iterates the built-in functions.
pub fn functions() -> impl Iterator<Item = &'static Builtin> {
    BUILTINS.values().filter(|b| b.kind == BuiltinKind::Function)
}
