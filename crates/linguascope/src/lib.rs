pub mod analysis;
pub mod annotate;
pub mod dict;
pub mod enrich;
pub mod handlers;
pub mod rate_limit;
pub mod wiktionary;

pub use analysis::{
    FrequencyTable, extract_vocabulary, filter_tokens, inflected_forms, rank_keywords,
    vocabulary_key,
};
pub use dict::{DefinitionSource, DictService, FetchError};
pub use handlers::{AppState, router};
