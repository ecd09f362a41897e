//! Column definitions: `Name`, `Name=type` or `Name=type;attr=value;...`
use crate::util::{strip_brackets, DELIMITER};
use crate::value::Value;

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    /// multiline string
    Textbox,
}

impl ColumnType {
    pub const ALL: [ColumnType; 5] = [
        ColumnType::String,
        ColumnType::Int,
        ColumnType::Float,
        ColumnType::Bool,
        ColumnType::Textbox,
    ];

    /// Case insensitive lookup of a type token
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|column_type| column_type.token().eq_ignore_ascii_case(token))
    }

    pub fn token(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Bool => "bool",
            ColumnType::Textbox => "textbox",
        }
    }

    pub fn zero_value(&self) -> Value {
        match self {
            ColumnType::String | ColumnType::Textbox => Value::String(String::new()),
            ColumnType::Int => Value::Integer(0),
            ColumnType::Float => Value::Decimal(0.0),
            ColumnType::Bool => Value::Boolean(false),
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::String => f.write_str("STRING"),
            ColumnType::Int => f.write_str("INT"),
            ColumnType::Float => f.write_str("FLOAT"),
            ColumnType::Bool => f.write_str("BOOLEAN"),
            ColumnType::Textbox => f.write_str("TEXTBOX"),
        }
    }
}

/// Attributes accepted after the type
pub const ATTRIBUTES: [&str; 2] = ["output", "default"];

/// Values accepted for boolean-like attributes
pub const BOOLEAN_TOKENS: [&str; 8] = ["true", "false", "yes", "no", "0", "1", "on", "off"];

/// `output=` values that hide a column
const HIDING_TOKENS: [&str; 3] = ["false", "no", "0"];

/// One typed column of a section
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub default: Value,
    /// hidden columns are resolved but not exposed as outputs
    pub visible: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            default: column_type.zero_value(),
            visible: true,
        }
    }

    /// Parse a single header fragment, optionally wrapped in `[` `]`.
    ///
    /// Parsing is permissive: unknown types read as `string`, unknown or malformed attributes are skipped. The
    /// validator reports them separately.
    pub fn parse(fragment: &str) -> Self {
        let inner = strip_brackets(fragment);
        let mut parts = inner
            .split(DELIMITER)
            .map(str::trim)
            .filter(|part| !part.is_empty());

        let definition = parts.next().unwrap_or_default();
        let (name, column_type) = match definition.split_once('=') {
            Some((name, type_token)) => (
                name.trim(),
                ColumnType::from_token(type_token).unwrap_or_default(),
            ),
            None => (definition, ColumnType::String),
        };

        let mut column = ColumnDef::new(name, column_type);

        for attribute in parts {
            let Some((key, value)) = attribute.split_once('=') else {
                tracing::debug!(column = %column.name, attribute, "ignoring malformed attribute");
                continue;
            };

            let key = key.trim();
            if key.eq_ignore_ascii_case("output") {
                let value = value.trim();
                if HIDING_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(value)) {
                    column.visible = false;
                }
            } else if key.eq_ignore_ascii_case("default") {
                column.default = Value::convert(value, column_type);
            } else {
                tracing::debug!(column = %column.name, key, "ignoring unknown attribute");
            }
        }

        column
    }

    /// Resolve a raw field, or the default when the field is absent
    pub fn resolve(&self, raw: Option<&str>) -> Value {
        match raw {
            Some(raw) => Value::convert(raw, self.column_type),
            None => self.default.clone(),
        }
    }
}
