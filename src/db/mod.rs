//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and schema setup
//! - SQLite pragma configuration
//! - Repository layer, including the locked per-tournament transaction

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::{Repository, StandingRow, TournamentTx};
