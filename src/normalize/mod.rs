// src/normalize/mod.rs
//! Pure, stateless transformations from raw listing text to identity parts.
//!
//! - `dimension` parses free-form size text into a [`Dimensions`] triple.
//! - `encode` renders a triple as the display (`raw_specs`) or join-key (`correct_specs`) string.
//! - `resolve` maps noisy names onto the reference vocabulary.
//! - `split` pulls brand and model out of a combined title.
//! - `sku` assembles the product code and reads load/speed indices.
//!
//! Nothing here holds state across calls, so every function is safe to run
//! from any number of worker threads at once.

pub mod dimension;
pub mod encode;
pub mod resolve;
pub mod sku;
pub mod split;

pub use dimension::{Dimensions, Measure, locate_dimensions, parse_dimensions};
pub use encode::{SpecMode, combine_specs};
pub use resolve::{
    JaroWinkler, Levenshtein, NameResolver, ReferenceVocabulary, Resolution, ScorerKind, Similarity, TokenSetRatio,
    Vocabulary, clean_name, extract_model,
};
pub use sku::{LoadSpeed, SkuParts, compose_sku, extract_load_speed, locate_load_speed};
pub use split::{BrandModel, RewriteRules, split_brand_model};
