//! Compiled keyword matchers.
//!
//! Turns a [`KeywordConfig`] table into regexes once, so classification is a
//! pure read over shared immutable state. Synonyms are literal text; the
//! carrier templates are raw regexes.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::KeywordConfig;

/// Errors raised while compiling a keyword profile.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("profile '{profile}' has no {field} keywords")]
    EmptyKeywords { profile: String, field: &'static str },

    #[error("failed to build {field} pattern for profile '{profile}': {source}")]
    Build {
        profile: String,
        field: &'static str,
        #[source]
        source: regex::Error,
    },
}

static BUILTIN: Lazy<Arc<CompiledKeywords>> = Lazy::new(|| {
    Arc::new(
        CompiledKeywords::compile(&KeywordConfig::builtin())
            .expect("builtin keyword profile must compile"),
    )
});

/// Regexes for one profile, ready for matching.
#[derive(Debug)]
pub struct CompiledKeywords {
    profile: String,
    carriers: Vec<CompiledCarrier>,
    id_label: Regex,
    pw_label: Regex,
    /// Anchored: a PW keyword right after an ID label ("ID/PW").
    pw_follows: Regex,
    generic_id: Option<Regex>,
}

#[derive(Debug)]
struct CompiledCarrier {
    id: String,
    regex: Regex,
}

/// A label found in a line. Offsets are byte offsets into the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMatch {
    /// Start of the keyword, including any noise prefix.
    pub start: usize,
    /// Start of the bare label.
    pub label_start: usize,
    /// End of the label.
    pub end: usize,
}

/// A carrier SSID template hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierMatch<'a> {
    pub carrier: &'a str,
    pub start: usize,
    pub end: usize,
}

impl CompiledKeywords {
    /// Compile a profile. Invalid carrier regexes are skipped with a warning;
    /// label tables must be non-empty.
    pub fn compile(config: &KeywordConfig) -> Result<Self, PatternError> {
        let mut carriers = Vec::new();
        for c in &config.carrier_patterns {
            match Regex::new(&c.pattern) {
                Ok(regex) => carriers.push(CompiledCarrier {
                    id: c.id.clone(),
                    regex,
                }),
                Err(e) => {
                    warn!(
                        "Skipping invalid carrier pattern '{}' ({}): {}",
                        c.id, c.pattern, e
                    );
                }
            }
        }

        let id_labels = alternation(&config.id_keywords);
        if id_labels.is_empty() {
            return Err(PatternError::EmptyKeywords {
                profile: config.name.clone(),
                field: "id",
            });
        }
        let pw_labels = alternation(&config.pw_keywords);
        if pw_labels.is_empty() {
            return Err(PatternError::EmptyKeywords {
                profile: config.name.clone(),
                field: "pw",
            });
        }

        let noise = alternation(&config.noise_prefixes);
        let prefix = if noise.is_empty() {
            String::new()
        } else {
            format!(r"(?:(?:{noise})[\s\-_:]*)*")
        };

        let build = |field: &'static str, pattern: String| {
            Regex::new(&pattern).map_err(|source| PatternError::Build {
                profile: config.name.clone(),
                field,
                source,
            })
        };

        let id_label = build(
            "id",
            format!(r"(?i)(?:^|[^A-Za-z0-9])(?P<keyword>{prefix}(?P<label>{id_labels}))"),
        )?;
        let pw_label = build(
            "pw",
            format!(r"(?i)(?:^|[^A-Za-z0-9])(?P<keyword>{prefix}(?P<label>{pw_labels}))"),
        )?;
        let pw_follows = build(
            "pw",
            format!(r"(?i)^\s*[/|&,·]?\s*(?P<label>{pw_labels})"),
        )?;

        let generic = alternation(&config.generic_id_keywords);
        let generic_id = if generic.is_empty() {
            None
        } else {
            Some(build(
                "generic id",
                format!(r"(?i)^\s*{prefix}(?:{generic})\s*$"),
            )?)
        };

        debug!(
            "Compiled profile '{}': {} carrier patterns",
            config.name,
            carriers.len()
        );

        Ok(Self {
            profile: config.name.clone(),
            carriers,
            id_label,
            pw_label,
            pw_follows,
            generic_id,
        })
    }

    /// Shared compilation of [`KeywordConfig::builtin`], built on first use.
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN)
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// First carrier template (in profile order) found in `text`.
    pub fn find_carrier<'a>(&'a self, text: &str) -> Option<CarrierMatch<'a>> {
        self.carriers.iter().find_map(|c| {
            c.regex.find(text).map(|m| CarrierMatch {
                carrier: c.id.as_str(),
                start: m.start(),
                end: m.end(),
            })
        })
    }

    /// First ID label in `text` that is not the "ID" half of an "ID/PW" label.
    pub fn find_id_label(&self, text: &str) -> Option<LabelMatch> {
        find_label(&self.id_label, text, Some(&self.pw_follows))
    }

    /// First PW label in `text`.
    pub fn find_pw_label(&self, text: &str) -> Option<LabelMatch> {
        find_label(&self.pw_label, text, None)
    }

    /// Whether an ID keyword only names the network generically ("Wi-Fi").
    pub fn is_generic_id(&self, keyword: &str) -> bool {
        self.generic_id
            .as_ref()
            .map(|re| re.is_match(keyword))
            .unwrap_or(false)
    }
}

fn find_label(regex: &Regex, text: &str, reject_if_followed: Option<&Regex>) -> Option<LabelMatch> {
    for caps in regex.captures_iter(text) {
        let (Some(keyword), Some(label)) = (caps.name("keyword"), caps.name("label")) else {
            continue;
        };
        let rest = &text[label.end()..];

        if glued(label.as_str(), rest) {
            continue;
        }

        if reject_if_followed
            .and_then(|re| re.captures(rest))
            .and_then(|c| c.name("label"))
            .map(|next| !glued(next.as_str(), &rest[next.end()..]))
            .unwrap_or(false)
        {
            continue;
        }

        return Some(LabelMatch {
            start: keyword.start(),
            label_start: label.start(),
            end: label.end(),
        });
    }
    None
}

/// An ASCII label running straight into more ASCII letters is part of a word.
fn glued(label: &str, rest: &str) -> bool {
    let ends_in_letter = label
        .chars()
        .last()
        .map(|c| c.is_ascii_alphabetic())
        .unwrap_or(false);
    ends_in_letter
        && rest
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic())
            .unwrap_or(false)
}

/// Regex alternation over literal synonyms, longest first so the leftmost-first
/// engine prefers "암호키" over "암호". Spaces match any whitespace run and
/// hyphens are optional.
fn alternation(synonyms: &[String]) -> String {
    let mut sorted: Vec<&str> = synonyms
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    sorted
        .iter()
        .map(|s| synonym_pattern(s))
        .collect::<Vec<_>>()
        .join("|")
}

fn synonym_pattern(synonym: &str) -> String {
    synonym
        .split_whitespace()
        .map(|word| {
            word.split('-')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"[\s\-]?")
        })
        .collect::<Vec<_>>()
        .join(r"\s*")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CarrierPattern;

    fn label_text<'a>(text: &'a str, m: &LabelMatch) -> &'a str {
        &text[m.label_start..m.end]
    }

    #[test]
    fn test_builtin_compiles_all_carriers() {
        let compiled = CompiledKeywords::builtin();
        assert_eq!(compiled.carriers.len(), 3);
        assert_eq!(compiled.profile(), "default");
    }

    #[test]
    fn test_carrier_patterns() {
        let kw = CompiledKeywords::builtin();
        let kt = kw.find_carrier("KT GiGA 5G Wave2 CAC7").unwrap();
        assert_eq!(kt.carrier, "kt_giga");
        assert_eq!((kt.start, kt.end), (0, 21));

        assert_eq!(kw.find_carrier("SK_WiFiGIGA1A2B").unwrap().carrier, "sk_wifi");
        assert_eq!(kw.find_carrier("U+Net3F9A").unwrap().carrier, "uplus");
        assert_eq!(kw.find_carrier("U+ Zone").unwrap().carrier, "uplus");
        assert!(kw.find_carrier("Welcome to our cafe").is_none());
    }

    #[test]
    fn test_carrier_stops_at_short_id() {
        let kw = CompiledKeywords::builtin();
        for (text, ssid) in [
            ("KT_GiGA_5G_CAC7 abcd1234", "KT_GiGA_5G_CAC7"),
            ("SK_WiFiGIGA1A2B Free Zone", "SK_WiFiGIGA1A2B"),
            ("SK_WiFi1A2B_5G", "SK_WiFi1A2B_5G"),
            ("U+Net3F9A guest", "U+Net3F9A"),
            ("KT GiGA 5GHz", "KT GiGA"),
        ] {
            let m = kw.find_carrier(text).unwrap_or_else(|| panic!("no carrier in {text}"));
            assert_eq!(&text[m.start..m.end], ssid, "{text}");
        }
    }

    #[test]
    fn test_id_label_variants() {
        let kw = CompiledKeywords::builtin();
        for (text, keyword) in [
            ("SSID: barbet_2F", "SSID"),
            ("ID barbet", "ID"),
            ("와이파이 이름 : cafe", "와이파이 이름"),
            ("Wi-Fi Name: home", "Wi-Fi Name"),
            ("WiFi: home", "WiFi"),
            ("아이디 cafe", "아이디"),
        ] {
            let m = kw.find_id_label(text).unwrap_or_else(|| panic!("no label in {text}"));
            assert_eq!(&text[m.start..m.end], keyword, "{text}");
        }
    }

    #[test]
    fn test_noise_prefix_is_part_of_keyword() {
        let kw = CompiledKeywords::builtin();
        let text = "Free Wi-Fi ID: guest";
        let m = kw.find_id_label(text).unwrap();
        assert_eq!(&text[m.start..m.end], "Free Wi-Fi ID");
        assert_eq!(label_text(text, &m), "ID");
    }

    #[test]
    fn test_id_followed_by_pw_is_rejected() {
        let kw = CompiledKeywords::builtin();
        assert!(kw.find_id_label("ID/PW: cafe1234").is_none());
        assert!(kw.find_id_label("ID / Password").is_none());
        assert!(kw.find_pw_label("ID/PW: cafe1234").is_some());
    }

    #[test]
    fn test_id_value_starting_with_pw_word_is_kept() {
        let kw = CompiledKeywords::builtin();
        for text in ["SSID Keystone_Cafe", "ID pwcafe", "SSID Passwordless"] {
            let m = kw
                .find_id_label(text)
                .unwrap_or_else(|| panic!("no label in {text}"));
            assert_eq!(m.start, 0, "{text}");
        }
        assert!(kw.find_id_label("ID PW-cafe").is_none());
    }

    #[test]
    fn test_labels_glued_to_words_are_ignored() {
        let kw = CompiledKeywords::builtin();
        assert!(kw.find_id_label("IDENTITY CHECK").is_none());
        assert!(kw.find_id_label("hybrid").is_none());
        assert!(kw.find_pw_label("mypwd123").is_none());
        assert!(kw.find_pw_label("MONKEY").is_none());
        let text = "ID1234";
        assert_eq!(label_text(text, &kw.find_id_label(text).unwrap()), "ID");
    }

    #[test]
    fn test_pw_label_prefers_longest_synonym() {
        let kw = CompiledKeywords::builtin();
        let text = "암호키: abcd";
        assert_eq!(label_text(text, &kw.find_pw_label(text).unwrap()), "암호키");
        let text = "무료 와이파이 비밀번호 12345678";
        let m = kw.find_pw_label(text).unwrap();
        assert_eq!(m.start, 0);
        assert_eq!(label_text(text, &m), "비밀번호");
    }

    #[test]
    fn test_generic_id_keywords() {
        let kw = CompiledKeywords::builtin();
        assert!(kw.is_generic_id("Wi-Fi"));
        assert!(kw.is_generic_id("Free WiFi"));
        assert!(kw.is_generic_id("네트워크"));
        assert!(!kw.is_generic_id("SSID"));
        assert!(!kw.is_generic_id("Wi-Fi ID"));
        assert!(!kw.is_generic_id(""));
    }

    #[test]
    fn test_invalid_carrier_skipped() {
        let mut config = KeywordConfig::builtin();
        config.carrier_patterns.push(CarrierPattern {
            id: "bad".to_string(),
            label: "Bad".to_string(),
            pattern: r"[invalid".to_string(),
        });
        let compiled = CompiledKeywords::compile(&config).unwrap();
        assert_eq!(compiled.carriers.len(), 3);
    }

    #[test]
    fn test_empty_id_keywords_is_error() {
        let mut config = KeywordConfig::builtin();
        config.id_keywords = vec!["  ".to_string()];
        let err = CompiledKeywords::compile(&config).unwrap_err();
        assert!(matches!(err, PatternError::EmptyKeywords { field: "id", .. }));
    }
}
