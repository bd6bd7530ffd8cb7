//! Clean-up of resolved values.

/// Alternates printed after these are dropped ("cafe/cafe_5G").
const ALTERNATE_DELIMITERS: [char; 2] = ['/', ','];

/// Keep the first delimiter-separated segment and strip the spaces OCR
/// tends to inject inside tokens.
pub fn normalize(raw: &str) -> String {
    raw.split(ALTERNATE_DELIMITERS)
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}
