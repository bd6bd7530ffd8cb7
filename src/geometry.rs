//! Normalized image geometry shared by every pipeline stage.
//!
//! Coordinates are fractions of the image size with the origin at the
//! bottom-left corner. OCR noise can push values slightly outside `[0, 1]`;
//! nothing here clamps or rejects them.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Build a rect, folding negative extents to zero.
    pub fn new(min_x: f64, min_y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x,
            min_y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn mid_x(&self) -> f64 {
        self.min_x + self.width / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        self.min_y + self.height / 2.0
    }

    pub fn max_x(&self) -> f64 {
        self.min_x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.min_y + self.height
    }

    /// Horizontal slice covering characters `[start, end)` of a line of
    /// `total` characters. Vertical extent is unchanged.
    pub fn char_span(&self, start: usize, end: usize, total: usize) -> Rect {
        if total == 0 {
            return *self;
        }
        let start = start.min(total);
        let end = end.clamp(start, total);
        let unit = self.width / total as f64;
        Rect::new(
            self.min_x + unit * start as f64,
            self.min_y,
            unit * (end - start) as f64,
            self.height,
        )
    }

    /// Mirror across the horizontal center line of the image.
    ///
    /// Converts between bottom-left and top-left origins; applying it twice
    /// returns the original rect.
    pub fn flipped_vertically(&self) -> Rect {
        Rect::new(self.min_x, 1.0 - self.max_y(), self.width, self.height)
    }
}

/// One OCR-recognized line: its text and where it sits in the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    #[serde(rename = "box")]
    pub bbox: Rect,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, bbox: Rect) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_derived_edges() {
        let r = Rect::new(0.1, 0.2, 0.4, 0.1);
        assert!(approx(r.mid_x(), 0.3));
        assert!(approx(r.mid_y(), 0.25));
        assert!(approx(r.max_x(), 0.5));
        assert!(approx(r.max_y(), 0.3));
    }

    #[test]
    fn test_negative_extent_folds_to_zero() {
        let r = Rect::new(0.5, 0.5, -0.1, -0.2);
        assert_eq!(r.width, 0.0);
        assert_eq!(r.height, 0.0);
        assert_eq!(r.max_x(), 0.5);
    }

    #[test]
    fn test_char_span_splits_proportionally() {
        let line = Rect::new(0.0, 0.5, 1.0, 0.1);
        let left = line.char_span(0, 4, 10);
        let right = line.char_span(4, 10, 10);
        assert!(approx(left.width, 0.4));
        assert!(approx(right.min_x, 0.4));
        assert!(approx(right.max_x(), 1.0));
        assert_eq!(right.min_y, 0.5);
        assert_eq!(right.height, 0.1);
    }

    #[test]
    fn test_char_span_tolerates_out_of_range() {
        let line = Rect::new(0.2, 0.0, 0.5, 0.1);
        assert_eq!(line.char_span(0, 0, 0), line);
        let tail = line.char_span(12, 40, 10);
        assert!(approx(tail.min_x, 0.7));
        assert_eq!(tail.width, 0.0);
    }

    #[test]
    fn test_flip_round_trips() {
        let r = Rect::new(0.1, 0.7, 0.3, 0.2);
        let flipped = r.flipped_vertically();
        assert!(approx(flipped.min_y, 0.1));
        let back = flipped.flipped_vertically();
        assert!(approx(back.min_y, r.min_y));
    }

    #[test]
    fn test_fragment_deserializes_box_field() {
        let json = r#"{"text":"SSID","box":{"min_x":0.1,"min_y":0.2,"width":0.3,"height":0.05}}"#;
        let fragment: TextFragment = serde_json::from_str(json).unwrap();
        assert_eq!(fragment.text, "SSID");
        assert!(approx(fragment.bbox.width, 0.3));
    }
}
