//! SQL processing module
//!
//! This module provides:
//! - `parser`: SQL lexer and parser
//! - `types`: values, result chunks and the row record codec
//! - `catalog`: schemas, tables and the information_schema views
//! - `plan`: logical planning
//! - `optimizer`: physical planning
//! - `executor`: physical plan execution
//! - `keys`: storage key layout for rows

pub mod catalog;
pub mod executor;
pub mod keys;
pub mod optimizer;
pub mod parser;
pub mod plan;
pub mod types;
