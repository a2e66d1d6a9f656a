//! # Dinàmiques Common Library
//!
//! Core of the dynamics catalog viewer:
//! - Canonical curriculum table and module normalizer
//! - Record model and curricular connection accessor
//! - Curricular index with cascading dropdowns
//! - Filter predicate engine, sorting and pagination
//! - Favorites, comparison list and catalog session
//! - Data sources, configuration and error types

pub mod catalog;
pub mod compare;
pub mod config;
pub mod connection;
pub mod curriculum;
pub mod debounce;
pub mod error;
pub mod favorites;
pub mod filter;
pub mod index;
pub mod pagination;
pub mod record;
pub mod serde_helpers;
pub mod sort;
pub mod source;
pub mod stats;

pub use catalog::{Catalog, CatalogView, LoadOutcome, LoadTicket};
pub use error::{Error, Result};
pub use filter::{FilterState, QualityScale};
pub use record::Dynamic;
pub use sort::SortKey;
