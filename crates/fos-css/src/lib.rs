//! fOS CSS - Resolved Style Values
//!
//! The computed style attributes inline layout reads (`white-space`,
//! `text-align`, `direction`, `unicode-bidi`, `word-wrap`, box edges,
//! paged-media counts) and a small declaration parser to build them.

mod computed;
mod properties;

pub use computed::{ComputedStyle, EdgeSizes, Insets};
pub use properties::{
    Clear, Direction, Display, Float, LineHeight, Overflow, PageBreakInside, Position,
    TextAlign, TextOverflow, UnicodeBidi, VerticalAlign, WhiteSpace, WordWrap,
};

/// CSS declaration (property: value)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Split a declaration block (`a: b; c: d`) into declarations
pub fn parse_declarations(css: &str) -> Result<Vec<Declaration>> {
    let mut declarations = Vec::new();
    for (index, chunk) in css.split(';').enumerate() {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        let (property, value) = chunk.split_once(':').ok_or_else(|| StyleError::ParseError {
            index,
            message: format!("expected `property: value`, found `{chunk}`"),
        })?;

        let mut value = value.trim();
        let important = match value.strip_suffix("!important") {
            Some(rest) => {
                value = rest.trim_end();
                true
            }
            None => false,
        };

        declarations.push(Declaration {
            property: property.trim().to_ascii_lowercase(),
            value: value.to_string(),
            important,
        });
    }
    Ok(declarations)
}

/// Style errors
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("Parse error in declaration {index}: {message}")]
    ParseError { index: usize, message: String },

    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    #[error("Invalid value for {property}: {value}")]
    InvalidValue { property: String, value: String },
}

pub type Result<T> = std::result::Result<T, StyleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_declarations() {
        let decls = parse_declarations("White-Space: pre ; width:10px;;").unwrap();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property, "white-space");
        assert_eq!(decls[0].value, "pre");
        assert_eq!(decls[1].value, "10px");
    }

    #[test]
    fn test_parse_important() {
        let decls = parse_declarations("direction: rtl !important").unwrap();
        assert!(decls[0].important);
        assert_eq!(decls[0].value, "rtl");
    }

    #[test]
    fn test_parse_error() {
        let err = parse_declarations("width 10px").unwrap_err();
        assert!(matches!(err, StyleError::ParseError { index: 0, .. }));
    }
}
