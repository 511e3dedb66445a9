//! Purpose: Provide the internal JSON decode entrypoints and failure categorization.
//! Exports: `from_str`, `ParseFailureCategory`, `categorize_error`, `hint_for_error`.
//! Role: Parser boundary that centralizes serde_json usage for on-disk documents.
//! Invariants: Hints never echo document payloads, only category and position.
//! Notes: Error mapping to crate errors is done by callsites so path context stays explicit.

use serde::de::DeserializeOwned;
use serde_json::error::Category;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ParseFailureCategory {
    Syntax,
    Eof,
    Data,
    Io,
}

impl ParseFailureCategory {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Eof => "eof",
            Self::Data => "data",
            Self::Io => "io",
        }
    }
}

pub(crate) fn from_str<T: DeserializeOwned>(input: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(input)
}

pub(crate) fn categorize_error(err: &serde_json::Error) -> ParseFailureCategory {
    match err.classify() {
        Category::Syntax => ParseFailureCategory::Syntax,
        Category::Eof => ParseFailureCategory::Eof,
        Category::Data => ParseFailureCategory::Data,
        Category::Io => ParseFailureCategory::Io,
    }
}

/// `expected` describes the shape the caller decodes into; it is only quoted
/// for data errors, where the JSON was valid but had the wrong shape.
pub(crate) fn hint_for_error(err: &serde_json::Error, context: &str, expected: &str) -> String {
    let category = categorize_error(err);
    let advice = match category {
        ParseFailureCategory::Syntax | ParseFailureCategory::Eof => {
            "The input is not valid JSON; fix it or restore it from a backup.".to_string()
        }
        ParseFailureCategory::Data => format!("Expected {expected}."),
        ParseFailureCategory::Io => "The input could not be read completely.".to_string(),
    };
    format!(
        "parse category: {}; line {}, column {}; context: {context}. {advice}",
        category.label(),
        err.line(),
        err.column()
    )
}
