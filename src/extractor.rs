//! Credential extraction pipeline.
//!
//! fragments → classify → bucket → resolve SSID → resolve password (may use
//! the SSID box) → normalize. Pure and synchronous; every call starts from
//! fresh state, so identical input gives identical output.

use std::sync::Arc;

use tracing::debug;

use crate::aggregator::TokenBuckets;
use crate::classifier::{ClassifiedToken, TokenClassifier};
use crate::geometry::{Rect, TextFragment};
use crate::normalizer::normalize;
use crate::patterns::CompiledKeywords;
use crate::resolver::{self, ResolvedField};
use crate::schema::ExtractionResult;

/// Extracts Wi-Fi credentials from OCR fragments of a placard photo.
#[derive(Debug, Clone)]
pub struct CredentialExtractor {
    classifier: TokenClassifier,
}

impl Default for CredentialExtractor {
    fn default() -> Self {
        Self::new(CompiledKeywords::builtin())
    }
}

impl CredentialExtractor {
    pub fn new(keywords: Arc<CompiledKeywords>) -> Self {
        Self {
            classifier: TokenClassifier::new(keywords),
        }
    }

    /// Classify every fragment, in input order.
    pub fn classify_all(&self, fragments: &[TextFragment]) -> Vec<ClassifiedToken> {
        fragments
            .iter()
            .flat_map(|f| self.classifier.classify(&f.text, f.bbox))
            .collect()
    }

    pub fn buckets(&self, fragments: &[TextFragment]) -> TokenBuckets {
        TokenBuckets::aggregate(self.classify_all(fragments), self.classifier.keywords())
    }

    pub fn extract(&self, fragments: &[TextFragment]) -> ExtractionResult {
        let buckets = self.buckets(fragments);
        debug!(
            "Bucketed {} fragments: {} id, {} pw, {} other",
            fragments.len(),
            buckets.id_candidates.len(),
            buckets.pw_candidates.len(),
            buckets.other.len()
        );

        let ssid = resolver::resolve_ssid(&buckets);
        let password = resolver::resolve_password(&buckets, ssid.as_ref());

        let (ssid, ssid_box) = finish(ssid);
        let (password, password_box) = finish(password);
        debug!(
            "Extracted ssid={:?} password_len={:?}",
            ssid,
            password.as_ref().map(|p| p.chars().count())
        );

        ExtractionResult {
            ssid,
            password,
            ssid_box,
            password_box,
        }
    }
}

/// Normalize a resolved value; an empty result counts as not found.
fn finish(field: Option<ResolvedField>) -> (Option<String>, Option<Rect>) {
    match field {
        Some(f) => {
            let value = normalize(&f.text);
            if value.is_empty() {
                (None, None)
            } else {
                (Some(value), Some(f.bbox))
            }
        }
        None => (None, None),
    }
}
