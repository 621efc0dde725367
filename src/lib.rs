//! foxdb - a small relational database core
//!
//! This crate provides:
//! - SQL parsing (lexer, Pratt parser, AST)
//! - A lock-guarded schema catalog persisted as JSON
//! - Planning, a physical-plan seam and execution
//! - Row records stored in a pluggable ordered key-value engine

pub mod config;
pub mod context;
pub mod database;
pub mod error;
pub mod sql;
pub mod storage;

pub use context::CancellationToken;
pub use database::Database;
pub use error::{Error, Result};
