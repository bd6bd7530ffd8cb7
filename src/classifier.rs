//! Token classification: decides what each OCR line says about the
//! credentials and splits its box between label and value.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::trace;

use crate::geometry::Rect;
use crate::patterns::{CompiledKeywords, LabelMatch};

static SEPARATOR_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\-._]+").expect("valid separator regex"));

/// Characters allowed between a label and its value.
fn is_label_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ':' | '：' | '=' | '-' | '|')
}

fn is_carrier_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '.' | '_')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Id,
    Pw,
    None,
}

/// One classified unit derived from an OCR line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedToken {
    pub label: Label,
    /// Inline value; empty when the line is a bare label.
    pub content: String,
    pub content_box: Rect,
    /// Matched keyword. `Some("")` for carrier SSIDs, `None` for unlabeled text.
    pub keyword: Option<String>,
    pub keyword_box: Option<Rect>,
}

impl ClassifiedToken {
    fn other(text: &str, bbox: Rect) -> Self {
        Self {
            label: Label::None,
            content: text.trim().to_string(),
            content_box: bbox,
            keyword: None,
            keyword_box: None,
        }
    }

    pub fn keyword_str(&self) -> &str {
        self.keyword.as_deref().unwrap_or("")
    }

    /// Box that neighbour searches start from.
    pub fn anchor_box(&self) -> Rect {
        self.keyword_box.unwrap_or(self.content_box)
    }
}

/// Classifies OCR lines against one keyword profile.
#[derive(Debug, Clone)]
pub struct TokenClassifier {
    keywords: Arc<CompiledKeywords>,
}

impl TokenClassifier {
    pub fn new(keywords: Arc<CompiledKeywords>) -> Self {
        Self { keywords }
    }

    pub fn keywords(&self) -> &CompiledKeywords {
        &self.keywords
    }

    /// Classify one line into zero, one or two tokens.
    ///
    /// A carrier SSID takes the ID slot before any labeled ID; the PW label is
    /// looked for independently, so "ID: foo PW: bar" yields both tokens.
    /// Lines with neither yield a single [`Label::None`] token.
    pub fn classify(&self, text: &str, bbox: Rect) -> Vec<ClassifiedToken> {
        let line = Line::new(text, bbox);
        let (id, pw) = line.separate_fields(
            self.keywords.find_id_label(text),
            self.keywords.find_pw_label(text),
        );
        let mut tokens = Vec::with_capacity(2);

        if let Some(carrier) = self.keywords.find_carrier(text) {
            trace!("Carrier pattern '{}' matched {:?}", carrier.carrier, text);
            tokens.push(self.carrier_token(&line, carrier.start, carrier.end));
        } else if let Some(id) = &id {
            let value_end = stop_at(id, pw.as_ref(), text.len());
            tokens.push(line.labeled(Label::Id, id, value_end));
        }

        if let Some(pw) = &pw {
            let value_end = stop_at(pw, id.as_ref(), text.len());
            tokens.push(line.labeled(Label::Pw, pw, value_end));
        }

        if tokens.is_empty() {
            tokens.push(ClassifiedToken::other(text, bbox));
        }
        tokens
    }

    fn carrier_token(&self, line: &Line<'_>, start: usize, end: usize) -> ClassifiedToken {
        let span = &line.text[start..end];
        let cut = self
            .keywords
            .find_pw_label(span)
            .map(|p| p.start)
            .unwrap_or(span.len());
        let matched = span[..cut].trim_end_matches(is_carrier_separator);
        let end = start + matched.len();

        let ssid = SEPARATOR_RUN.replace_all(matched, "_").into_owned();

        ClassifiedToken {
            label: Label::Id,
            content: ssid,
            content_box: line.span_box(start, end),
            keyword: Some(String::new()),
            keyword_box: None,
        }
    }
}

/// End of a label's value: where the other field's keyword starts, when it
/// comes later on the same line.
fn stop_at(own: &LabelMatch, other: Option<&LabelMatch>, line_end: usize) -> usize {
    other
        .filter(|o| o.start >= own.end)
        .map(|o| o.start)
        .unwrap_or(line_end)
}

struct Line<'a> {
    text: &'a str,
    bbox: Rect,
    chars: usize,
}

impl<'a> Line<'a> {
    fn new(text: &'a str, bbox: Rect) -> Self {
        Self {
            text,
            bbox,
            chars: text.chars().count(),
        }
    }

    /// Drop the later of two labels when it sits inside the earlier label's
    /// value ("PW: id-1234", "SSID: home-key"). A later label only opens a new
    /// field after a gap and once the earlier label has a value of its own.
    fn separate_fields(
        &self,
        id: Option<LabelMatch>,
        pw: Option<LabelMatch>,
    ) -> (Option<LabelMatch>, Option<LabelMatch>) {
        match (id, pw) {
            (Some(id), Some(pw)) if id.start < pw.start => {
                let pw = self.opens_field(&id, &pw).then_some(pw);
                (Some(id), pw)
            }
            (Some(id), Some(pw)) => {
                let id = self.opens_field(&pw, &id).then_some(id);
                (id, Some(pw))
            }
            other => other,
        }
    }

    fn opens_field(&self, earlier: &LabelMatch, later: &LabelMatch) -> bool {
        if later.start < earlier.end {
            return false;
        }
        let between = &self.text[earlier.end..later.start];
        let after_gap = between
            .chars()
            .last()
            .map(|c| c.is_whitespace() || matches!(c, '/' | '|' | ',' | '·' | '&'))
            .unwrap_or(false);
        after_gap && !between.trim_matches(is_label_separator).is_empty()
    }

    fn char_index(&self, byte: usize) -> usize {
        self.text[..byte].chars().count()
    }

    fn span_box(&self, start: usize, end: usize) -> Rect {
        self.bbox
            .char_span(self.char_index(start), self.char_index(end), self.chars)
    }

    /// Token for a label; the value runs from after the separators up to
    /// `value_end`, the keyword box is everything left of the value.
    fn labeled(&self, label: Label, m: &LabelMatch, value_end: usize) -> ClassifiedToken {
        let tail = &self.text[m.end..value_end];
        let value_start = m.end + (tail.len() - tail.trim_start_matches(is_label_separator).len());
        let value = self.text[value_start..value_end].trim_end();

        ClassifiedToken {
            label,
            content: value.to_string(),
            content_box: self.span_box(value_start, value_start + value.len()),
            keyword: Some(self.text[m.start..m.end].to_string()),
            keyword_box: Some(self.span_box(0, value_start)),
        }
    }
}
