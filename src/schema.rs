//! Extraction output types.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::geometry::{Rect, TextFragment};

/// Credentials found on one image. Boxes share the input's coordinate space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid_box: Option<Rect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_box: Option<Rect>,
}

impl ExtractionResult {
    /// Nothing found; callers usually retry on the next frame.
    pub fn is_empty(&self) -> bool {
        self.ssid.is_none() && self.password.is_none()
    }

    /// Both SSID and password found.
    pub fn is_complete(&self) -> bool {
        self.ssid.is_some() && self.password.is_some()
    }

    /// Same result with every box mirrored vertically.
    pub fn flipped_vertically(mut self) -> Self {
        self.ssid_box = self.ssid_box.map(|r| r.flipped_vertically());
        self.password_box = self.password_box.map(|r| r.flipped_vertically());
        self
    }
}

/// A served extraction, kept for later lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub id: String,
    pub profile: String,
    pub fragment_count: usize,
    /// SHA-256 over the fragments, for dropping duplicate frames.
    pub content_hash: String,
    pub result: ExtractionResult,
}

impl ExtractionRecord {
    pub fn new(profile: &str, fragments: &[TextFragment], result: ExtractionResult) -> Self {
        Self {
            id: format!("ex_{}", Uuid::new_v4().simple()),
            profile: profile.to_string(),
            fragment_count: fragments.len(),
            content_hash: fragments_hash(fragments),
            result,
        }
    }
}

/// Order-sensitive digest of fragment texts and boxes.
pub fn fragments_hash(fragments: &[TextFragment]) -> String {
    let mut hasher = Sha256::new();
    for f in fragments {
        hasher.update((f.text.len() as u64).to_le_bytes());
        hasher.update(f.text.as_bytes());
        for v in [f.bbox.min_x, f.bbox.min_y, f.bbox.width, f.bbox.height] {
            hasher.update(v.to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_complete() {
        let empty = ExtractionResult::default();
        assert!(empty.is_empty());
        assert!(!empty.is_complete());

        let partial = ExtractionResult {
            ssid: Some("cafe".to_string()),
            ..Default::default()
        };
        assert!(!partial.is_empty());
        assert!(!partial.is_complete());
    }

    #[test]
    fn test_none_fields_are_omitted() {
        let result = ExtractionResult {
            ssid: Some("cafe".to_string()),
            ssid_box: Some(Rect::new(0.0, 0.0, 0.5, 0.5)),
            ..Default::default()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["ssid"], "cafe");
        assert!(json.get("password").is_none());
        assert!(json.get("password_box").is_none());
    }

    #[test]
    fn test_record_hash_is_stable() {
        let fragments = vec![TextFragment::new("SSID: cafe", Rect::new(0.1, 0.2, 0.3, 0.04))];
        let a = ExtractionRecord::new("default", &fragments, ExtractionResult::default());
        let b = ExtractionRecord::new("default", &fragments, ExtractionResult::default());
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("ex_"));
        assert_eq!(a.content_hash.len(), 64);
    }

    #[test]
    fn test_hash_depends_on_geometry() {
        let a = [TextFragment::new("PW", Rect::new(0.1, 0.2, 0.3, 0.04))];
        let b = [TextFragment::new("PW", Rect::new(0.1, 0.3, 0.3, 0.04))];
        assert_ne!(fragments_hash(&a), fragments_hash(&b));
    }
}
