//! Local index and multi-criterion search for Hacker News posts.

pub mod commands;
pub mod config;
pub mod error;
pub mod labels;
pub mod query;
pub mod search;
pub mod store;
pub mod types;

pub use error::{Error, Result, StoreError};
pub use labels::{KeywordClassifier, LabelClassifier};
pub use query::{QueryBuilder, SearchQuery};
pub use search::SearchEngine;
pub use store::{MemoryStore, SqliteStore, Store};
pub use types::{Category, OrderBy, Post, SearchHit, SearchResult};
