//! Typed configuration properties.

use std::fmt;

/// A named, typed configuration property with a hard-coded default.
///
/// Raw values come from config files and overrides as strings; a property
/// knows how to parse them into `T`.
#[derive(Clone, Copy)]
pub struct ConfigProperty<T: Copy + 'static> {
    name: &'static str,
    description: &'static str,
    default: T,
    parse: fn(&str) -> Option<T>,
}

impl<T: Copy + 'static> ConfigProperty<T> {
    /// Creates a property.
    #[must_use]
    pub const fn new(
        name: &'static str,
        description: &'static str,
        default: T,
        parse: fn(&str) -> Option<T>,
    ) -> Self {
        Self {
            name,
            description,
            default,
            parse,
        }
    }

    /// Returns the property name as used in config files.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns a one-line description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// Returns the hard-coded default.
    #[must_use]
    pub fn default_value(&self) -> T {
        self.default
    }

    /// Parses a raw value. Surrounding whitespace and case are ignored.
    #[must_use]
    pub fn parse(&self, raw: &str) -> Option<T> {
        (self.parse)(&raw.trim().to_ascii_lowercase())
    }
}

impl<T: Copy + fmt::Debug + 'static> fmt::Debug for ConfigProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigProperty")
            .field("name", &self.name)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Indentation character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentStyle {
    /// Spaces.
    Space,
    /// Tabs.
    Tab,
}

/// Code style family, used by rules whose defaults differ per style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeStyle {
    /// The default style.
    Official,
    /// Denser layout.
    Compact,
}

/// Value of a rule execution key (`treelint_<ruleset>_<rule>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleExecution {
    /// Run the rule (or rule set).
    Enabled,
    /// Skip the rule (or rule set).
    Disabled,
}

impl RuleExecution {
    /// Parses `enabled`/`disabled` (also `true`/`false`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "enabled" | "true" => Some(Self::Enabled),
            "disabled" | "false" => Some(Self::Disabled),
            _ => None,
        }
    }

    /// Returns the config file spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

fn parse_usize(raw: &str) -> Option<usize> {
    raw.parse().ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_max_line_length(raw: &str) -> Option<usize> {
    match raw {
        "off" | "unset" => Some(usize::MAX),
        _ => raw.parse().ok().filter(|&n| n > 0),
    }
}

fn parse_indent_style(raw: &str) -> Option<IndentStyle> {
    match raw {
        "space" => Some(IndentStyle::Space),
        "tab" => Some(IndentStyle::Tab),
        _ => None,
    }
}

fn parse_code_style(raw: &str) -> Option<CodeStyle> {
    match raw {
        "official" => Some(CodeStyle::Official),
        "compact" => Some(CodeStyle::Compact),
        _ => None,
    }
}

/// `indent_size`: columns per indentation level.
pub const INDENT_SIZE_PROPERTY: ConfigProperty<usize> =
    ConfigProperty::new("indent_size", "Columns per indentation level", 4, parse_usize);

/// `indent_style`: `space` or `tab`.
pub const INDENT_STYLE_PROPERTY: ConfigProperty<IndentStyle> = ConfigProperty::new(
    "indent_style",
    "Indent with spaces or tabs",
    IndentStyle::Space,
    parse_indent_style,
);

/// `max_line_length`: positive number, or `off` (stored as `usize::MAX`).
pub const MAX_LINE_LENGTH_PROPERTY: ConfigProperty<usize> = ConfigProperty::new(
    "max_line_length",
    "Maximum line length in characters, or off",
    usize::MAX,
    parse_max_line_length,
);

/// `insert_final_newline`: whether files end with a line break.
pub const INSERT_FINAL_NEWLINE_PROPERTY: ConfigProperty<bool> = ConfigProperty::new(
    "insert_final_newline",
    "Whether a file ends with a newline",
    true,
    parse_bool,
);

/// `code_style`: `official` or `compact`.
pub const CODE_STYLE_PROPERTY: ConfigProperty<CodeStyle> = ConfigProperty::new(
    "code_style",
    "Code style family",
    CodeStyle::Official,
    parse_code_style,
);

/// Names of the properties the engine itself defines.
pub const ENGINE_PROPERTIES: &[&str] = &[
    INDENT_SIZE_PROPERTY.name(),
    INDENT_STYLE_PROPERTY.name(),
    MAX_LINE_LENGTH_PROPERTY.name(),
    INSERT_FINAL_NEWLINE_PROPERTY.name(),
    CODE_STYLE_PROPERTY.name(),
];

/// Prefix shared by all rule execution and severity keys.
pub const EXECUTION_KEY_PREFIX: &str = "treelint_";

/// Key opting into experimental rules.
pub const EXPERIMENTAL_KEY: &str = "treelint_experimental";
