pub mod app;
pub mod chat;
pub mod config;
pub mod error;
pub mod memory;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod validation;
