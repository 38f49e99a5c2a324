pub mod admission;
pub mod api;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod models;
pub mod observability;
pub mod retention;
pub mod storage;
