// ABOUTME: Parses the engine's structured `Key: value` error text into display fields
// ABOUTME: Detail is mandatory; its absence means the message is not in a recognized format

use std::fmt;

use crate::error::FormatError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedError {
    pub url: String,
    pub code: String,
    pub summary: String,
    pub detail: String,
}

impl ParsedError {
    /// Keys are case-insensitive, the last occurrence of a key wins and
    /// lines without a colon are skipped.
    pub fn parse(message: &str) -> Result<Self, FormatError> {
        if message.trim().is_empty() {
            return Err(FormatError::EmptyInput);
        }

        let mut parsed = ParsedError::default();

        for line in message.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim().to_string();

            match key.trim().to_ascii_lowercase().as_str() {
                "url" => parsed.url = value,
                "code" => parsed.code = value,
                "summary" => parsed.summary = value,
                "detail" => parsed.detail = value,
                _ => {}
            }
        }

        if parsed.detail.is_empty() {
            return Err(FormatError::MissingDetail);
        }

        Ok(parsed)
    }
}

/// Renders the canonical four-line form.
impl fmt::Display for ParsedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "URL: {}\nCode: {}\nSummary: {}\nDetail: {}",
            self.url, self.code, self.summary, self.detail
        )
    }
}

/// Formats one raw engine error for the message log, indenting the parsed
/// fields, or showing the raw text verbatim when it cannot be parsed.
pub fn format_error_block(raw: &str) -> String {
    match ParsedError::parse(raw) {
        Ok(parsed) => parsed
            .to_string()
            .lines()
            .map(|line| format!("\t{}", line))
            .collect::<Vec<_>>()
            .join("\n"),
        Err(e) => {
            tracing::debug!("Falling back to raw error text: {}", e);
            format!("\tCould not parse error message: {}", raw)
        }
    }
}
