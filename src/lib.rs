pub mod api;
pub mod api_docs;
pub mod domain;
pub mod email;
pub mod identity;
pub mod infrastructure;
pub mod middleware;
pub mod models;
pub mod utils;

pub use infrastructure::{config, db, server, startup};
