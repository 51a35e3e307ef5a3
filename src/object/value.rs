//! Property values and their type tags.
//!
//! [`PropertyValue`] is a closed sum type: every property slot holds exactly
//! one of these variants, and [`PropertyType`] describes which variant a slot
//! accepts. Composite kinds (enums and structs) carry a static descriptor
//! that supplies their string parser.

use std::fmt;
use std::num::{ParseFloatError, ParseIntError};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Failure to turn text into a typed value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueParseError {
    #[error("invalid boolean '{0}'")]
    Bool(String),
    #[error("invalid integer: {0}")]
    Int(#[from] ParseIntError),
    #[error("invalid float: {0}")]
    Float(#[from] ParseFloatError),
    #[error("invalid color '{0}'")]
    Color(String),
    #[error("'{value}' is not a variant of {type_name}")]
    UnknownVariant {
        type_name: &'static str,
        value: String,
    },
    #[error("invalid {type_name} value '{value}'")]
    Struct {
        type_name: &'static str,
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// A terminal color: one of the sixteen named ANSI colors, a 24-bit RGB
/// triple, or the terminal's default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Grey,
    DarkGrey,
    DarkRed,
    DarkGreen,
    DarkYellow,
    DarkBlue,
    DarkMagenta,
    DarkCyan,
    Rgb(u8, u8, u8),
}

const NAMED_COLORS: &[(&str, Color)] = &[
    ("default", Color::Default),
    ("black", Color::Black),
    ("red", Color::Red),
    ("green", Color::Green),
    ("yellow", Color::Yellow),
    ("blue", Color::Blue),
    ("magenta", Color::Magenta),
    ("cyan", Color::Cyan),
    ("white", Color::White),
    ("grey", Color::Grey),
    ("dark-grey", Color::DarkGrey),
    ("dark-red", Color::DarkRed),
    ("dark-green", Color::DarkGreen),
    ("dark-yellow", Color::DarkYellow),
    ("dark-blue", Color::DarkBlue),
    ("dark-magenta", Color::DarkMagenta),
    ("dark-cyan", Color::DarkCyan),
];

impl Color {
    /// Whether this is the terminal default (i.e. "no color set").
    pub fn is_default(self) -> bool {
        self == Color::Default
    }
}

impl FromStr for Color {
    type Err = ValueParseError;

    /// Accepts `#rgb`, `#rrggbb`, `rgb(r, g, b)` and the named colors.
    /// Names are case-insensitive; `_`, `-` and no separator are equivalent
    /// (`dark_red`, `dark-red`, `darkred`), and `gray` spells `grey`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ValueParseError::Color(s.to_owned());

        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }

        let lower = s.to_ascii_lowercase();
        if let Some(inner) = lower
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(invalid());
            }
            let channel = |p: &str| p.parse::<u8>().map_err(|_| invalid());
            return Ok(Color::Rgb(
                channel(parts[0])?,
                channel(parts[1])?,
                channel(parts[2])?,
            ));
        }

        let normalized = lower.replace('_', "-").replace("gray", "grey");
        let squashed = normalized.replace('-', "");
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == normalized || name.replace('-', "") == squashed)
            .map(|(_, color)| *color)
            .ok_or_else(invalid)
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let byte = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(Color::Rgb(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
        3 => {
            let r = byte(&hex[0..1])?;
            let g = byte(&hex[1..2])?;
            let b = byte(&hex[2..3])?;
            Some(Color::Rgb(r * 17, g * 17, b * 17))
        }
        _ => None,
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
            named => {
                let name = NAMED_COLORS
                    .iter()
                    .find(|(_, c)| c == named)
                    .map(|(n, _)| *n)
                    .unwrap_or("default");
                f.write_str(name)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Composite type descriptors
// ---------------------------------------------------------------------------

/// A named set of string variants, e.g. orientation or response type.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumType {
    pub name: &'static str,
    pub variants: &'static [&'static str],
}

impl EnumType {
    /// Resolve a variant by name (case-insensitive) or by numeric index.
    pub fn parse(&'static self, text: &str) -> Result<PropertyValue, ValueParseError> {
        let text = text.trim();
        let index = self
            .variants
            .iter()
            .position(|v| v.eq_ignore_ascii_case(text))
            .or_else(|| {
                text.parse::<usize>()
                    .ok()
                    .filter(|i| *i < self.variants.len())
            })
            .ok_or_else(|| ValueParseError::UnknownVariant {
                type_name: self.name,
                value: text.to_owned(),
            })?;
        Ok(PropertyValue::Enum { ty: self, index })
    }

    /// The value for a given variant name. `None` if no such variant.
    pub fn value(&'static self, variant: &str) -> Option<PropertyValue> {
        self.variants
            .iter()
            .position(|v| *v == variant)
            .map(|index| PropertyValue::Enum { ty: self, index })
    }
}

/// Parser for a struct type's textual form.
pub type StructParser = fn(&str) -> Result<Vec<PropertyValue>, ValueParseError>;

/// A fixed-shape record of named fields. `parse` is `None` for types that
/// have no textual representation (object references and the like).
#[derive(Debug, PartialEq, Eq)]
pub struct StructType {
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub parse: Option<StructParser>,
}

/// Horizontal or vertical packing direction.
pub static ORIENTATION: EnumType = EnumType {
    name: "orientation",
    variants: &["horizontal", "vertical"],
};

/// A `width x height` pair in cells. Accepts `20x3`, `20 3` or `20,3`.
pub static SIZE: StructType = StructType {
    name: "size",
    fields: &["width", "height"],
    parse: Some(parse_size),
};

/// A reference to another object. Not expressible as text.
pub static OBJECT_REF: StructType = StructType {
    name: "object",
    fields: &["id"],
    parse: None,
};

fn parse_size(text: &str) -> Result<Vec<PropertyValue>, ValueParseError> {
    let invalid = || ValueParseError::Struct {
        type_name: "size",
        value: text.to_owned(),
    };
    let parts: Vec<&str> = text
        .split(|c: char| c == 'x' || c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 2 {
        return Err(invalid());
    }
    let w = parse_int(parts[0]).map_err(|_| invalid())?;
    let h = parse_int(parts[1]).map_err(|_| invalid())?;
    Ok(vec![PropertyValue::Int(w), PropertyValue::Int(h)])
}

// ---------------------------------------------------------------------------
// PropertyType
// ---------------------------------------------------------------------------

/// The declared type tag of a property slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Bool,
    Int,
    Float,
    Str,
    Color,
    Enum(&'static EnumType),
    Struct(&'static StructType),
}

impl PropertyType {
    /// Resolve a textual type tag (`bool`, `int`, `float`, `string`, `color`,
    /// or a known enum/struct name). `None` for unrecognized tags.
    pub fn from_tag(tag: &str) -> Option<PropertyType> {
        Some(match tag {
            "bool" | "boolean" => PropertyType::Bool,
            "int" | "integer" => PropertyType::Int,
            "float" | "double" => PropertyType::Float,
            "string" | "str" => PropertyType::Str,
            "color" => PropertyType::Color,
            "orientation" => PropertyType::Enum(&ORIENTATION),
            "size" => PropertyType::Struct(&SIZE),
            "object" => PropertyType::Struct(&OBJECT_REF),
            _ => return None,
        })
    }

    /// A short name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            PropertyType::Bool => "bool",
            PropertyType::Int => "int",
            PropertyType::Float => "float",
            PropertyType::Str => "string",
            PropertyType::Color => "color",
            PropertyType::Enum(e) => e.name,
            PropertyType::Struct(s) => s.name,
        }
    }

    /// Whether values of this type can be parsed from text.
    pub fn is_buildable(&self) -> bool {
        !matches!(self, PropertyType::Struct(s) if s.parse.is_none())
    }

    /// Type-directed parse of `text`.
    ///
    /// Callers must check [`is_buildable`](Self::is_buildable) first; a
    /// struct type without a parser yields an empty-field error here.
    pub fn parse(&self, text: &str) -> Result<PropertyValue, ValueParseError> {
        let text = text.trim();
        match self {
            PropertyType::Bool => parse_bool(text).map(PropertyValue::Bool),
            PropertyType::Int => parse_int(text).map(PropertyValue::Int),
            PropertyType::Float => Ok(PropertyValue::Float(text.parse()?)),
            PropertyType::Str => Ok(PropertyValue::Str(text.to_owned())),
            PropertyType::Color => text.parse().map(PropertyValue::Color),
            PropertyType::Enum(e) => (*e).parse(text),
            PropertyType::Struct(s) => {
                let parse = s.parse.ok_or_else(|| ValueParseError::Struct {
                    type_name: s.name,
                    value: text.to_owned(),
                })?;
                Ok(PropertyValue::Struct {
                    ty: *s,
                    fields: parse(text)?,
                })
            }
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `1`, `t`, `T`, `TRUE`, `true`, `True` and the matching false spellings.
pub fn parse_bool(text: &str) -> Result<bool, ValueParseError> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(ValueParseError::Bool(other.to_owned())),
    }
}

/// Integer parse that tolerates a trailing `px` or `%` unit.
pub fn parse_int(text: &str) -> Result<i64, ValueParseError> {
    let digits = text
        .strip_suffix("px")
        .or_else(|| text.strip_suffix('%'))
        .unwrap_or(text)
        .trim();
    Ok(digits.parse::<i64>()?)
}

// ---------------------------------------------------------------------------
// PropertyValue
// ---------------------------------------------------------------------------

/// A typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Color(Color),
    Enum {
        ty: &'static EnumType,
        index: usize,
    },
    Struct {
        ty: &'static StructType,
        fields: Vec<PropertyValue>,
    },
}

impl PropertyValue {
    /// The type tag this value satisfies.
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::Bool(_) => PropertyType::Bool,
            PropertyValue::Int(_) => PropertyType::Int,
            PropertyValue::Float(_) => PropertyType::Float,
            PropertyValue::Str(_) => PropertyType::Str,
            PropertyValue::Color(_) => PropertyType::Color,
            PropertyValue::Enum { ty, .. } => PropertyType::Enum(ty),
            PropertyValue::Struct { ty, .. } => PropertyType::Struct(ty),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            PropertyValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// The variant name of an enum value.
    pub fn as_variant(&self) -> Option<&'static str> {
        match self {
            PropertyValue::Enum { ty, index } => ty.variants.get(*index).copied(),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Str(s) => f.write_str(s),
            PropertyValue::Color(c) => write!(f, "{c}"),
            PropertyValue::Enum { .. } => f.write_str(self.as_variant().unwrap_or("?")),
            PropertyValue::Struct { ty, fields } => {
                write!(f, "{}(", ty.name)?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Str(v.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Str(v)
    }
}

impl From<Color> for PropertyValue {
    fn from(v: Color) -> Self {
        PropertyValue::Color(v)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ── Bool / int / float ───────────────────────────────────────────

    #[test]
    fn bool_spellings() {
        for t in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(t), Ok(true), "{t}");
        }
        for f in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(f), Ok(false), "{f}");
        }
        assert!(parse_bool("yes").is_err());
    }

    #[test]
    fn int_strips_units() {
        assert_eq!(parse_int("12px"), Ok(12));
        assert_eq!(parse_int("50%"), Ok(50));
        assert_eq!(parse_int("-3"), Ok(-3));
        assert!(matches!(parse_int("3em"), Err(ValueParseError::Int(_))));
    }

    #[test]
    fn float_parse() {
        assert_eq!(PropertyType::Float.parse("2.5"), Ok(PropertyValue::Float(2.5)));
        assert!(PropertyType::Float.parse("x").is_err());
    }

    // ── Color ────────────────────────────────────────────────────────

    #[test]
    fn color_named_and_hex() {
        assert_eq!("red".parse::<Color>(), Ok(Color::Red));
        assert_eq!("Dark_Blue".parse::<Color>(), Ok(Color::DarkBlue));
        assert_eq!("darkgray".parse::<Color>(), Ok(Color::DarkGrey));
        assert_eq!("#ff8800".parse::<Color>(), Ok(Color::Rgb(255, 136, 0)));
        assert_eq!("#f00".parse::<Color>(), Ok(Color::Rgb(255, 0, 0)));
        assert_eq!("rgb(1, 2, 3)".parse::<Color>(), Ok(Color::Rgb(1, 2, 3)));
        assert!("#12345".parse::<Color>().is_err());
        assert!("chartreuse".parse::<Color>().is_err());
    }

    #[test]
    fn color_display_reparses() {
        for c in [Color::Red, Color::DarkMagenta, Color::Rgb(1, 2, 254), Color::Default] {
            assert_eq!(c.to_string().parse::<Color>(), Ok(c));
        }
    }

    // ── Enum / struct ────────────────────────────────────────────────

    #[test]
    fn enum_parse_by_name_and_index() {
        let v = PropertyType::Enum(&ORIENTATION).parse("Vertical").unwrap();
        assert_eq!(v.as_variant(), Some("vertical"));
        let h = ORIENTATION.parse("0").unwrap();
        assert_eq!(h.as_variant(), Some("horizontal"));
        assert!(matches!(
            ORIENTATION.parse("diagonal"),
            Err(ValueParseError::UnknownVariant { .. })
        ));
    }

    #[test]
    fn struct_parse_uses_type_parser() {
        let v = PropertyType::Struct(&SIZE).parse("20x3").unwrap();
        assert_eq!(
            v,
            PropertyValue::Struct {
                ty: &SIZE,
                fields: vec![PropertyValue::Int(20), PropertyValue::Int(3)],
            }
        );
        assert!(PropertyType::Struct(&SIZE).parse("20").is_err());
    }

    #[test]
    fn object_ref_is_not_buildable() {
        assert!(!PropertyType::Struct(&OBJECT_REF).is_buildable());
        assert!(PropertyType::Struct(&SIZE).is_buildable());
        assert!(PropertyType::Bool.is_buildable());
    }

    // ── Tags ─────────────────────────────────────────────────────────

    #[test]
    fn type_tags() {
        assert_eq!(PropertyType::from_tag("int"), Some(PropertyType::Int));
        assert_eq!(PropertyType::from_tag("color"), Some(PropertyType::Color));
        assert_eq!(PropertyType::from_tag("pixbuf"), None);
    }

    #[test]
    fn value_reports_its_type() {
        assert_eq!(PropertyValue::from(true).property_type(), PropertyType::Bool);
        assert_eq!(PropertyValue::from("x").property_type(), PropertyType::Str);
        assert_eq!(
            ORIENTATION.value("vertical").map(|v| v.property_type()),
            Some(PropertyType::Enum(&ORIENTATION))
        );
    }
}
