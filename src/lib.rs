pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod models;
pub mod render;
pub mod store;
pub mod sync;
pub mod templates_structs;
