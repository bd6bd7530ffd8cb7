//! Keyword profile configuration.
//!
//! A profile is the data table the classifier matches against: carrier SSID
//! templates plus the label synonym sets for each field. The builtin profile
//! covers Korean/English placards; additional profiles are loaded from the
//! `configs/` directory (or `PLACARD_PROFILES_DIR`) as JSON files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::patterns::CompiledKeywords;

pub const DEFAULT_PROFILE: &str = "default";

/// Keyword table for one placard family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// ISP default-SSID templates, tried in order. The builtin ones end at the
    /// carrier's short hex ID so trailing words stay out of the SSID.
    #[serde(default)]
    pub carrier_patterns: Vec<CarrierPattern>,
    /// Labels that introduce the network name.
    pub id_keywords: Vec<String>,
    /// Labels that introduce the password.
    pub pw_keywords: Vec<String>,
    /// Words that may precede a label without changing its meaning ("Free", "Wi-Fi").
    #[serde(default)]
    pub noise_prefixes: Vec<String>,
    /// ID labels that merely mention the network and rank below specific ones.
    #[serde(default)]
    pub generic_id_keywords: Vec<String>,
}

/// A regex recognizing an ISP-issued SSID without any label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierPattern {
    /// Unique identifier (e.g. "kt_giga")
    pub id: String,
    /// Human-readable label (e.g. "KT GiGA")
    pub label: String,
    /// Regex matched against the raw fragment text
    pub pattern: String,
}

impl KeywordConfig {
    /// The profile used when no other is requested.
    pub fn builtin() -> Self {
        Self {
            name: DEFAULT_PROFILE.to_string(),
            description: "Korean/English Wi-Fi placards with KT, SK and LG U+ default SSIDs"
                .to_string(),
            carrier_patterns: vec![
                CarrierPattern {
                    id: "kt_giga".to_string(),
                    label: "KT GiGA".to_string(),
                    pattern: r"\bKT[\s_.\-]*G[iI]GA(?:[\s_.\-]*[25]G(?:\b|_))?(?:[\s_.\-]*(?i:wave)[0-9]*(?:\b|_))?(?:[\s_.\-]*[0-9A-F]{4}(?:\b|_))?"
                        .to_string(),
                },
                CarrierPattern {
                    id: "sk_wifi".to_string(),
                    label: "SK WiFi".to_string(),
                    pattern: r"\bSK[\s_.\-]*(?i:wi[\s\-]?fi)(?:[\s_.\-]*(?i:giga))?(?:[\s_.\-]*[0-9A-F]{4}(?:\b|_))?(?:[\s_.\-]*[25]G(?:\b|_))?"
                        .to_string(),
                },
                CarrierPattern {
                    id: "uplus".to_string(),
                    label: "U+ Net/Zone".to_string(),
                    pattern: r"\bU\+[\s_.\-]*(?i:net|zone)(?:[\s_.\-]*[25]G(?:\b|_))?(?:[\s_.\-]*[0-9A-F]{4}(?:\b|_))?"
                        .to_string(),
                },
            ],
            id_keywords: strings(&[
                "SSID",
                "ID",
                "아이디",
                "이름",
                "무선랜 이름",
                "와이파이 이름",
                "Wi-Fi 이름",
                "Wi-Fi Name",
                "Network Name",
                "Network",
                "네트워크 이름",
                "네트워크",
                "Wi-Fi",
                "와이파이",
            ]),
            pw_keywords: strings(&[
                "Password",
                "Passwd",
                "Pass word",
                "PWD",
                "PW",
                "비밀번호",
                "패스워드",
                "파스워드",
                "비번",
                "KEY",
                "암호키",
                "암호",
            ]),
            noise_prefixes: strings(&["Wi-Fi", "무선랜", "와이파이", "Free", "무료"]),
            generic_id_keywords: strings(&["Wi-Fi", "와이파이", "Network", "네트워크"]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A profile ready for use: its source table and the compiled matcher.
#[derive(Debug, Clone)]
pub struct Profile {
    pub config: KeywordConfig,
    pub compiled: Arc<CompiledKeywords>,
}

/// Read-only store of every loaded profile.
#[derive(Debug)]
pub struct ConfigStore {
    profiles: HashMap<String, Profile>,
}

impl ConfigStore {
    /// Store holding only the builtin profile.
    pub fn builtin() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(
            DEFAULT_PROFILE.to_string(),
            Profile {
                config: KeywordConfig::builtin(),
                compiled: CompiledKeywords::builtin(),
            },
        );
        Self { profiles }
    }

    /// Load every `*.json` profile in `dir` on top of the builtin one.
    ///
    /// A missing directory leaves only the builtin profile. A file that cannot
    /// be read, parsed or compiled fails the whole load.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let mut store = Self::builtin();

        if !dir.exists() {
            warn!("Profile directory {:?} not found, using builtin profile only", dir);
            return Ok(store);
        }

        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to list profile directory: {:?}", dir))?
        {
            let path = entry?.path();

            if path.extension().map(|e| e == "json").unwrap_or(false) {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read profile: {:?}", path))?;

                let config: KeywordConfig = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse profile: {:?}", path))?;

                let compiled = CompiledKeywords::compile(&config)
                    .with_context(|| format!("Failed to compile profile: {:?}", path))?;

                info!("Loaded profile: {} from {:?}", config.name, path);
                store.profiles.insert(
                    config.name.clone(),
                    Profile {
                        config,
                        compiled: Arc::new(compiled),
                    },
                );
            }
        }

        Ok(store)
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// The `default` profile; always present since the builtin seeds it.
    pub fn default_profile(&self) -> Profile {
        self.profiles
            .get(DEFAULT_PROFILE)
            .cloned()
            .unwrap_or_else(|| Profile {
                config: KeywordConfig::builtin(),
                compiled: CompiledKeywords::builtin(),
            })
    }

    /// Profile names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_builtin_store_has_default() {
        let store = ConfigStore::builtin();
        assert_eq!(store.list(), vec!["default".to_string()]);
        assert_eq!(store.default_profile().config.name, "default");
    }

    #[test]
    fn test_builtin_round_trips_through_json() {
        let json = serde_json::to_string(&KeywordConfig::builtin()).unwrap();
        let parsed: KeywordConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.carrier_patterns.len(), 3);
        assert!(parsed.pw_keywords.contains(&"비밀번호".to_string()));
    }

    #[test]
    fn test_missing_dir_falls_back_to_builtin() {
        let store = ConfigStore::load_from_dir(Path::new("/nonexistent/profiles")).unwrap();
        assert_eq!(store.list(), vec!["default".to_string()]);
    }

    #[test]
    fn test_load_profile_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("cafe.json"),
            r#"{
                "name": "cafe",
                "id_keywords": ["Network"],
                "pw_keywords": ["Code"]
            }"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = ConfigStore::load_from_dir(dir.path()).unwrap();
        assert_eq!(store.list(), vec!["cafe".to_string(), "default".to_string()]);
        let cafe = store.get("cafe").unwrap();
        assert!(cafe.config.carrier_patterns.is_empty());
        assert_eq!(cafe.compiled.profile(), "cafe");
    }

    #[test]
    fn test_shipped_profiles_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs");
        let store = ConfigStore::load_from_dir(&dir).unwrap();
        let hotel = store.get("hotel_en").unwrap();
        let extractor = crate::CredentialExtractor::new(hotel.compiled.clone());
        let result = extractor.extract(&[
            crate::TextFragment::new("Guest Network: Seaside_Guest", crate::Rect::new(0.1, 0.6, 0.7, 0.05)),
            crate::TextFragment::new("Access Code: wave2024", crate::Rect::new(0.1, 0.5, 0.7, 0.05)),
        ]);
        assert_eq!(result.ssid.as_deref(), Some("Seaside_Guest"));
        assert_eq!(result.password.as_deref(), Some("wave2024"));
    }

    #[test]
    fn test_malformed_profile_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        assert!(ConfigStore::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_profile_without_pw_keywords_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("empty.json"),
            r#"{"name": "empty", "id_keywords": ["ID"], "pw_keywords": []}"#,
        )
        .unwrap();
        assert!(ConfigStore::load_from_dir(dir.path()).is_err());
    }
}
