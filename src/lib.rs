pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod essays;
pub mod evaluate;
pub mod extract;
pub mod state;
pub mod store;
