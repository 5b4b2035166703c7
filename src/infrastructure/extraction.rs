//! Selector-driven field extraction
//!
//! The platform's markup drifts between rollouts, so every field is located
//! through an ordered list of candidate query expressions (most specific
//! first, a generic fallback last) with bounded retry-and-wait. Submodules:
//! selector tables, the field resolver, the listing matcher, and the detail
//! extractor with its field-specific post-processing.

pub mod detail;
pub mod listing;
pub mod resolver;
pub mod selectors;

pub use detail::DetailExtractor;
pub use listing::ListingMatcher;
pub use resolver::FieldResolver;
pub use selectors::{ExtractionMode, FieldSpec, SelectorTable};
