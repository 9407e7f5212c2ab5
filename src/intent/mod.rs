pub mod extractor;

pub use extractor::{classify, matches_kind, IntentExtractor};
