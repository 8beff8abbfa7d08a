//! Structured error types for the htmldef converter.
//!
//! The conversion stages themselves never fail. Errors only come from the
//! collaborators around them: JSON input, the markup parser, and asset decoding.

use thiserror::Error;

/// The unified error type returned by all public htmldef API functions.
#[derive(Debug, Error)]
pub enum HtmlDefError {
    /// JSON input failed to parse as a document definition.
    #[error("Failed to parse document: {source}{}", format_hint(.hint))]
    ParseError {
        source: serde_json::Error,
        hint: String,
    },
    /// A host markup parser rejected an `html` descriptor.
    #[error("Markup error: {0}")]
    Markup(String),
    /// An asset in the virtual filesystem could not be decoded.
    #[error("Asset error: '{name}': {reason}")]
    Asset { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, HtmlDefError>;

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for HtmlDefError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but is not a document definition. Expected an object with a `content` array.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        HtmlDefError::ParseError { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_syntax_hint() {
        let err: HtmlDefError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse document:"));
        assert!(msg.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn test_parse_error_eof_hint() {
        let err: HtmlDefError = serde_json::from_str::<serde_json::Value>("{\"content\": [")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_markup_and_asset_display() {
        let err = HtmlDefError::Markup("bad tag".to_string());
        assert_eq!(err.to_string(), "Markup error: bad tag");

        let err = HtmlDefError::Asset {
            name: "font.ttf".to_string(),
            reason: "invalid padding".to_string(),
        };
        assert_eq!(err.to_string(), "Asset error: 'font.ttf': invalid padding");
    }

    #[test]
    fn test_error_source_is_json_error() {
        use std::error::Error;
        let err: HtmlDefError = serde_json::from_str::<serde_json::Value>("nope")
            .unwrap_err()
            .into();
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HtmlDefError>();
    }
}
