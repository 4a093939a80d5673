// src/content.rs
//! Content kinds accepted by both analysis stages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three supported input shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Url,
    Email,
    Sms,
}

impl ContentType {
    /// Uppercase wire form used in responses and prompts ("URL", "EMAIL", "SMS").
    pub fn as_upper(&self) -> &'static str {
        match self {
            ContentType::Url => "URL",
            ContentType::Email => "EMAIL",
            ContentType::Sms => "SMS",
        }
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "url" => Ok(ContentType::Url),
            "email" => Ok(ContentType::Email),
            "sms" => Ok(ContentType::Sms),
            other => Err(format!("unsupported content type: '{other}'")),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentType::Url => "url",
            ContentType::Email => "email",
            ContentType::Sms => "sms",
        };
        f.write_str(s)
    }
}

/// Truncate `text` to at most `max_chars` Unicode scalars, never splitting a
/// character. Matches the reference behavior of bounding by character count
/// (not tokens); the cut may still land mid-word.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
