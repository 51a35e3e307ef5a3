//! `@media` conditions.
//!
//! Only the features a terminal can answer are understood: `min-width`,
//! `max-width`, `min-height`, `max-height` (in cells) and the boolean
//! `color`. Anything else evaluates false.

use std::fmt;

use crate::geometry::Size;
use crate::logging::targets;

/// What media conditions are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaContext {
    pub size: Size,
    pub color: bool,
}

impl MediaContext {
    pub fn new(size: Size) -> Self {
        Self { size, color: true }
    }
}

impl Default for MediaContext {
    fn default() -> Self {
        Self::new(Size::new(80, 24))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaFeature {
    MinWidth(i32),
    MaxWidth(i32),
    MinHeight(i32),
    MaxHeight(i32),
    Color,
    Unknown(String),
}

impl MediaFeature {
    fn parse(name: &str, value: Option<&str>) -> MediaFeature {
        let cells = value.and_then(|v| {
            v.trim()
                .trim_end_matches("px")
                .parse::<i32>()
                .ok()
        });
        match (name.trim().to_ascii_lowercase().as_str(), cells) {
            ("min-width", Some(n)) => MediaFeature::MinWidth(n),
            ("max-width", Some(n)) => MediaFeature::MaxWidth(n),
            ("min-height", Some(n)) => MediaFeature::MinHeight(n),
            ("max-height", Some(n)) => MediaFeature::MaxHeight(n),
            ("color", None) if value.is_none() => MediaFeature::Color,
            _ => MediaFeature::Unknown(match value {
                Some(v) => format!("{}: {}", name.trim(), v.trim()),
                None => name.trim().to_owned(),
            }),
        }
    }

    pub fn evaluate(&self, ctx: &MediaContext) -> bool {
        match self {
            MediaFeature::MinWidth(n) => ctx.size.width >= *n,
            MediaFeature::MaxWidth(n) => ctx.size.width <= *n,
            MediaFeature::MinHeight(n) => ctx.size.height >= *n,
            MediaFeature::MaxHeight(n) => ctx.size.height <= *n,
            MediaFeature::Color => ctx.color,
            MediaFeature::Unknown(text) => {
                tracing::warn!(target: targets::STYLE, feature = %text, "unknown media feature");
                false
            }
        }
    }
}

impl fmt::Display for MediaFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaFeature::MinWidth(n) => write!(f, "(min-width: {n})"),
            MediaFeature::MaxWidth(n) => write!(f, "(max-width: {n})"),
            MediaFeature::MinHeight(n) => write!(f, "(min-height: {n})"),
            MediaFeature::MaxHeight(n) => write!(f, "(max-height: {n})"),
            MediaFeature::Color => f.write_str("(color)"),
            MediaFeature::Unknown(text) => write!(f, "({text})"),
        }
    }
}

/// A conjunction of features joined with `and`. An empty query always holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaQuery {
    pub features: Vec<MediaFeature>,
}

impl MediaQuery {
    /// Parse condition text such as `(min-width: 80) and (color)`. A leading
    /// media type (`screen`, `all`) is accepted and ignored.
    pub fn parse(text: &str) -> MediaQuery {
        let mut features = Vec::new();
        let mut rest = text;
        while let Some(open) = rest.find('(') {
            let Some(close) = rest[open..].find(')') else {
                features.push(MediaFeature::Unknown(rest[open + 1..].trim().to_owned()));
                break;
            };
            let inner = &rest[open + 1..open + close];
            let feature = match inner.split_once(':') {
                Some((name, value)) => MediaFeature::parse(name, Some(value)),
                None => MediaFeature::parse(inner, None),
            };
            features.push(feature);
            rest = &rest[open + close + 1..];
        }
        MediaQuery { features }
    }

    pub fn matches(&self, ctx: &MediaContext) -> bool {
        self.features.iter().all(|f| f.evaluate(ctx))
    }
}

impl fmt::Display for MediaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, feature) in self.features.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{feature}")?;
        }
        Ok(())
    }
}
