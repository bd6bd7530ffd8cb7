//! Placard Extractor - Wi-Fi credential extraction from OCR'd placard photos.
//!
//! Given the recognized text lines of a photographed Wi-Fi placard (each a
//! string plus a normalized bounding box), infer which line holds the network
//! name and which the password. Labels may sit beside or above their values,
//! or be missing entirely when the SSID is an ISP default such as
//! `KT_GiGA_5G_xxxx`.

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod extractor;
pub mod geometry;
pub mod normalizer;
pub mod patterns;
pub mod resolver;
pub mod schema;

pub use config::{ConfigStore, KeywordConfig};
pub use extractor::CredentialExtractor;
pub use geometry::{Rect, TextFragment};
pub use patterns::{CompiledKeywords, PatternError};
pub use schema::{ExtractionRecord, ExtractionResult};
