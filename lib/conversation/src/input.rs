//! Parsing and validation of customer replies.

use regex::Regex;
use std::sync::LazyLock;

/// Longest name that fits on a case.
pub const MAX_NAME_CHARS: usize = 20;

/// Accepted photo file extensions, compared case-insensitively.
pub const PHOTO_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"];

static NAME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^nome\s*").expect("name prefix pattern is valid"));

static CASE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^capinha\s*(\d+),\s*(.*)$").expect("case reference pattern is valid")
});

/// Normalizes a reply for keyword comparison.
#[must_use]
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Returns true if the customer asked to go back to the main menu.
#[must_use]
pub fn is_go_back(normalized: &str) -> bool {
    normalized == "voltar"
}

/// Answer to a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
}

/// Parses `sim` / `não` (with or without the accent).
#[must_use]
pub fn parse_confirmation(normalized: &str) -> Option<Confirmation> {
    match normalized {
        "sim" => Some(Confirmation::Yes),
        "não" | "nao" => Some(Confirmation::No),
        _ => None,
    }
}

/// Why an item count was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountError {
    NotANumber,
    NotPositive,
}

/// Parses the number of cases to customize.
///
/// # Errors
///
/// Returns an error for non-numeric input and for zero or negative counts.
pub fn parse_count(input: &str) -> Result<usize, CountError> {
    let count: i64 = input.trim().parse().map_err(|_| CountError::NotANumber)?;
    if count <= 0 {
        return Err(CountError::NotPositive);
    }
    usize::try_from(count).map_err(|_| CountError::NotANumber)
}

/// Removes a leading "nome" the customer may type before the name.
#[must_use]
pub fn strip_name_prefix(input: &str) -> String {
    NAME_PREFIX.replace(input.trim(), "").trim().to_string()
}

/// Returns true if `name` fits on a case: 1 to 20 characters, only letters
/// (accented Latin letters included) and spaces.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let length = name.chars().count();
    length > 0 && length <= MAX_NAME_CHARS && name.chars().all(is_name_char)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic()
        || c.is_whitespace()
        || matches!(c, 'À'..='Ö' | 'Ø'..='ö' | 'ø'..='ÿ')
}

/// Returns true if `filename` ends in a supported image extension.
#[must_use]
pub fn is_photo_filename(filename: &str) -> bool {
    let lower = filename.trim().to_lowercase();
    PHOTO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// A `capinha <n>, <rest>` reference to an already collected item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReference<'a> {
    /// 1-based position as typed, `None` if the digits overflow.
    pub position: Option<usize>,
    pub rest: &'a str,
}

/// Splits an optional leading `capinha <n>,` off `input`.
#[must_use]
pub fn parse_case_reference(input: &str) -> Option<CaseReference<'_>> {
    let captures = CASE_REFERENCE.captures(input.trim())?;
    let digits = captures.get(1)?.as_str();
    let rest = captures.get(2)?.as_str();
    Some(CaseReference {
        position: digits.parse().ok(),
        rest,
    })
}

/// Converts a 1-based position into an index below `len`.
#[must_use]
pub fn item_index(position: Option<usize>, len: usize) -> Option<usize> {
    position
        .and_then(|p| p.checked_sub(1))
        .filter(|&index| index < len)
}
