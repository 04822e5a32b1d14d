pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod pricing;
pub mod services;

pub use config::AppConfig;
pub use db::create_pool;
pub use error::{CoreError, CoreResult};
