//! Filter step codes and selection parsing.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

/// Token separators in a selection: commas and whitespace.
#[allow(clippy::expect_used)]
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\s]+").expect("separator regex is valid"));

/// One filter instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStep {
    /// `1`: delete small images.
    Size,
    /// `2`: delete byte-identical copies.
    Duplicate,
    /// `3`: sort into color / greyscale folders.
    Color,
    /// `4`: delete text, QR and screenshot-like images.
    Text,
    /// `6`: move videos and GIFs into their own folders.
    Media,
}

/// Order used by `5` / `all`.
pub const EVERYTHING: [FilterStep; 5] = [
    FilterStep::Size,
    FilterStep::Duplicate,
    FilterStep::Text,
    FilterStep::Color,
    FilterStep::Media,
];

impl FilterStep {
    /// Numeric menu code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Size => 1,
            Self::Duplicate => 2,
            Self::Color => 3,
            Self::Text => 4,
            Self::Media => 6,
        }
    }

    /// Canonical name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Duplicate => "duplicate",
            Self::Color => "color",
            Self::Text => "text",
            Self::Media => "media",
        }
    }

    /// Resolves a single code or name. `5`/`all` are not single steps.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "1" | "size" | "small" => Some(Self::Size),
            "2" | "duplicate" | "duplicates" | "dupes" => Some(Self::Duplicate),
            "3" | "color" | "colour" => Some(Self::Color),
            "4" | "text" | "qr" => Some(Self::Text),
            "6" | "media" => Some(Self::Media),
            _ => None,
        }
    }
}

impl fmt::Display for FilterStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.as_str())
    }
}

/// Parsed selection: steps in run order plus ignored tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Steps to run, first occurrence wins.
    pub steps: Vec<FilterStep>,
    /// Tokens that named no step.
    pub unknown: Vec<String>,
}

impl Selection {
    /// True when nothing runnable was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Parses `"1,3 4"`, `"5"`, `"all"`, `"size dupes"` and the like.
///
/// Unknown tokens are logged and collected, never fatal.
///
/// # Example
///
/// ```
/// use mediarip_core::filter::{FilterStep, parse_selection};
///
/// let selection = parse_selection("3, 1 3 nope");
/// assert_eq!(selection.steps, vec![FilterStep::Color, FilterStep::Size]);
/// assert_eq!(selection.unknown, vec!["nope".to_string()]);
/// ```
#[must_use]
pub fn parse_selection(raw: &str) -> Selection {
    fn push(step: FilterStep, steps: &mut Vec<FilterStep>) {
        if !steps.contains(&step) {
            steps.push(step);
        }
    }

    let mut selection = Selection::default();

    for token in SEPARATORS.split(raw.trim()).filter(|t| !t.is_empty()) {
        if matches!(token.to_ascii_lowercase().as_str(), "5" | "all") {
            for step in EVERYTHING {
                push(step, &mut selection.steps);
            }
        } else if let Some(step) = FilterStep::from_token(token) {
            push(step, &mut selection.steps);
        } else {
            warn!(token, "unknown filter option, skipping");
            selection.unknown.push(token.to_string());
        }
    }
    selection
}
