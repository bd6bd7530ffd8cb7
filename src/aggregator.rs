//! Groups classified tokens by field and ranks the label candidates.

use std::cmp::Ordering;

use serde::Serialize;

use crate::classifier::{ClassifiedToken, Label};
use crate::geometry::Rect;
use crate::patterns::CompiledKeywords;

/// Tokens of one image, bucketed by inferred field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenBuckets {
    pub id_candidates: Vec<ClassifiedToken>,
    pub pw_candidates: Vec<ClassifiedToken>,
    /// Unlabeled lines as `(box, trimmed text)`, in input order.
    pub other: Vec<(Rect, String)>,
}

impl TokenBuckets {
    /// Partition `tokens` and sort both candidate lists so index 0 is the
    /// one resolution should use.
    pub fn aggregate(tokens: Vec<ClassifiedToken>, keywords: &CompiledKeywords) -> Self {
        let mut buckets = Self::default();
        for token in tokens {
            match token.label {
                Label::Id => buckets.id_candidates.push(token),
                Label::Pw => buckets.pw_candidates.push(token),
                Label::None => buckets.other.push((token.content_box, token.content)),
            }
        }

        // Generic network mentions ("Wi-Fi") rank after specific labels ("SSID").
        buckets.id_candidates.sort_by(|a, b| {
            let generic_a = keywords.is_generic_id(a.keyword_str());
            let generic_b = keywords.is_generic_id(b.keyword_str());
            generic_a
                .cmp(&generic_b)
                .then_with(|| by_keyword_then_content(a, b))
        });
        buckets.pw_candidates.sort_by(by_keyword_then_content);

        buckets
    }

    pub fn primary_id(&self) -> Option<&ClassifiedToken> {
        self.id_candidates.first()
    }

    pub fn primary_pw(&self) -> Option<&ClassifiedToken> {
        self.pw_candidates.first()
    }
}

/// Lexicographic keyword order; for equal keywords, tokens carrying an
/// inline value first.
fn by_keyword_then_content(a: &ClassifiedToken, b: &ClassifiedToken) -> Ordering {
    a.keyword_str()
        .cmp(b.keyword_str())
        .then_with(|| a.content.is_empty().cmp(&b.content.is_empty()))
}
