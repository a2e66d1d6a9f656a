//! HTTP API handlers for dinamiques-viewer

pub mod catalog;
pub mod dinamiques;
pub mod error;
pub mod favorites;
pub mod health;
pub mod reload;
pub mod stats;

pub use catalog::{get_catalog, load_more, query_catalog, submit_search};
pub use dinamiques::{get_dynamic, list_dynamics};
pub use error::{ApiError, ApiResult};
pub use favorites::{add_compare, clear_compare, get_compare, get_favorites, remove_compare, toggle_favorite};
pub use health::health_routes;
pub use reload::reload;
pub use stats::{get_models, get_stats, get_types};
