//! Purpose: Decode raw request text into a JSON tree and classify decode failures.
//! Exports: `from_str`, `ParseFailureCategory`, `categorize_error`, `categorize_message`,
//! `hint_for_error`.
//! Role: Parser boundary in front of the typed parsers; the tree it returns is their only input.
//! Invariants: Category labels are stable and payload-free.
//! Invariants: Depth is bounded by serde_json's recursion limit, reported as `depth-limit`.
//! Notes: Error mapping is done by callsites so domain context stays explicit.

use serde::de::DeserializeOwned;
use serde_json::error::Category;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseFailureCategory {
    Syntax,
    Eof,
    Data,
    DepthLimit,
    Io,
    Unknown,
}

impl ParseFailureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Eof => "eof",
            Self::Data => "data",
            Self::DepthLimit => "depth-limit",
            Self::Io => "io",
            Self::Unknown => "unknown",
        }
    }
}

pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(input)
}

pub fn categorize_error(err: &serde_json::Error) -> ParseFailureCategory {
    let by_message = categorize_message(&err.to_string());
    if by_message != ParseFailureCategory::Unknown {
        return by_message;
    }
    match err.classify() {
        Category::Io => ParseFailureCategory::Io,
        Category::Syntax => ParseFailureCategory::Syntax,
        Category::Data => ParseFailureCategory::Data,
        Category::Eof => ParseFailureCategory::Eof,
    }
}

pub fn categorize_message(message: &str) -> ParseFailureCategory {
    let lower = message.to_ascii_lowercase();
    if lower.contains("recursion limit") {
        ParseFailureCategory::DepthLimit
    } else if lower.contains("eof while parsing") {
        ParseFailureCategory::Eof
    } else if lower.contains("expected value")
        || lower.contains("trailing characters")
        || lower.contains("key must be a string")
    {
        ParseFailureCategory::Syntax
    } else {
        ParseFailureCategory::Unknown
    }
}

pub fn hint_for_error(err: &serde_json::Error, context: &str) -> String {
    let category = categorize_error(err);
    let position = if err.line() > 0 {
        format!(" at line {} column {}", err.line(), err.column())
    } else {
        String::new()
    };
    format!(
        "Input is not valid JSON{position}. parse category: {}; context: {context}",
        category.as_str()
    )
}
