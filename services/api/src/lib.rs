//! services/api/src/lib.rs
//!
//! The HTTP service around the question core: configuration, storage adapters
//! and the axum web layer. The `api` binary wires these together.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
