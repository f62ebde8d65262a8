//! Query translation and execution.
//!
//! - **index_query**: engine-neutral query algebra and its tantivy lowering
//! - **like**: LIKE pattern translation
//! - **preprocess**: free-text query preprocessing and validation
//! - **constraint**: structured constraint vocabulary
//! - **translator**: constraint to index query translation
//! - **fulltext**: ranked free-text search
//! - **access**: leaf execution of structured queries

pub mod access;
pub mod constraint;
pub mod fulltext;
pub mod index_query;
pub mod like;
pub mod preprocess;
pub mod translator;

pub use access::{QueryCommand, QueryResults, Tuple};
pub use constraint::{parse_full_text, Constraint, DynamicOperand, FullTextTerm, Operator};
pub use fulltext::SearchHit;
pub use index_query::{identifier_query, IndexQuery, TermValue, IDENTIFIER_DISJUNCTION_LIMIT};
pub use like::{like_query, like_to_regex, path_like_query};
pub use preprocess::{check_query_length, preprocess_query, validate_query_fields};
pub use translator::{PathsLookup, QueryTranslator, ScoreFilter, TranslatedConstraint};
