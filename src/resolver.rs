//! Spatial resolution of label candidates to values.
//!
//! A label's value is its inline text, otherwise the nearest unlabeled line
//! to its right, otherwise the nearest one below. Distances are plain
//! Euclidean in normalized coordinates, equal weight on both axes.

use serde::Serialize;
use tracing::debug;

use crate::aggregator::TokenBuckets;
use crate::classifier::ClassifiedToken;
use crate::geometry::Rect;

/// How a value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Inline,
    Right,
    Below,
    /// Password stacked under the resolved SSID value.
    BelowSsid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedField {
    #[serde(rename = "box")]
    pub bbox: Rect,
    pub text: String,
    pub tier: Tier,
}

impl ResolvedField {
    fn new(bbox: Rect, text: &str, tier: Tier) -> Self {
        Self {
            bbox,
            text: text.to_string(),
            tier,
        }
    }
}

/// Resolve the network name from the primary ID candidate.
pub fn resolve_ssid(buckets: &TokenBuckets) -> Option<ResolvedField> {
    let candidate = buckets.primary_id()?;
    let resolved = resolve_candidate(candidate, &buckets.other);
    debug!(
        "SSID resolution via {:?} (keyword {:?})",
        resolved.as_ref().map(|r| r.tier),
        candidate.keyword_str()
    );
    resolved
}

/// Resolve the password.
///
/// Precedence: inline value, right of the PW label, below the PW label, then
/// below the already-resolved SSID value. The last tier covers placards that
/// stack both values without repeating a password label.
pub fn resolve_password(
    buckets: &TokenBuckets,
    ssid: Option<&ResolvedField>,
) -> Option<ResolvedField> {
    if let Some(candidate) = buckets.primary_pw() {
        if let Some(resolved) = resolve_candidate(candidate, &buckets.other) {
            debug!("Password resolution via {:?}", resolved.tier);
            return Some(resolved);
        }
    }

    let ssid = ssid.filter(|s| !s.text.trim().is_empty())?;
    let (bbox, text) = closest_below(&ssid.bbox, &buckets.other)?;
    if text.is_empty() {
        return None;
    }
    debug!("Password resolution via {:?}", Tier::BelowSsid);
    Some(ResolvedField::new(*bbox, text, Tier::BelowSsid))
}

fn resolve_candidate(candidate: &ClassifiedToken, other: &[(Rect, String)]) -> Option<ResolvedField> {
    if !candidate.content.is_empty() {
        return Some(ResolvedField::new(
            candidate.content_box,
            &candidate.content,
            Tier::Inline,
        ));
    }

    let source = candidate.anchor_box();
    if let Some((bbox, text)) = closest_right(&source, other).filter(|(_, t)| !t.is_empty()) {
        return Some(ResolvedField::new(*bbox, text, Tier::Right));
    }
    closest_below(&source, other)
        .filter(|(_, t)| !t.is_empty())
        .map(|(bbox, text)| ResolvedField::new(*bbox, text, Tier::Below))
}

/// Nearest line starting right of `source`'s center and sharing some of its
/// vertical span. Ties keep the earlier entry.
pub fn closest_right<'a>(source: &Rect, other: &'a [(Rect, String)]) -> Option<&'a (Rect, String)> {
    nearest(other, |c| {
        let qualifies = c.min_x > source.mid_x()
            && c.min_y < source.max_y()
            && c.max_y() > source.min_y;
        qualifies.then(|| distance(source.max_x(), source.mid_y(), c.min_x, c.mid_y()))
    })
}

/// Nearest line lying below `source`'s center and sharing some of its
/// horizontal span. Ties keep the earlier entry.
pub fn closest_below<'a>(source: &Rect, other: &'a [(Rect, String)]) -> Option<&'a (Rect, String)> {
    nearest(other, |c| {
        let qualifies = c.max_y() < source.mid_y()
            && c.max_x() > source.min_x
            && c.min_x < source.max_x();
        qualifies.then(|| distance(source.mid_x(), source.min_y, c.mid_x(), c.max_y()))
    })
}

fn nearest<'a>(
    other: &'a [(Rect, String)],
    score: impl Fn(&Rect) -> Option<f64>,
) -> Option<&'a (Rect, String)> {
    let mut best: Option<(f64, &'a (Rect, String))> = None;
    for entry in other {
        if let Some(d) = score(&entry.0) {
            if best.map(|(bd, _)| d < bd).unwrap_or(true) {
                best = Some((d, entry));
            }
        }
    }
    best.map(|(_, entry)| entry)
}

fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (x2 - x1).hypot(y2 - y1)
}
