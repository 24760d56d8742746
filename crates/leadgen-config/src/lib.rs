// crates/leadgen-config/src/lib.rs
// ============================================================================
// Module: Lead Generation Configuration
// Description: Application configuration loading and the versioned config
// store backing the domain-pattern CAS records and leases.
// Purpose: Give the orchestrator a strict, fail-closed configuration layer
// and a durable, race-free home for shared domain-pattern offsets.
// Dependencies: leadgen-core, rusqlite, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! This crate covers two distinct concerns that both sit under
//! "configuration" in the wider system: [`AppConfig`], the process-level
//! settings read once at startup, and [`store::SqliteConfigStore`], the
//! versioned, CAS-protected store for domain-pattern configuration records
//! that many campaigns may share a `config_hash` with.

pub mod app;
pub mod store;

pub use app::AppConfig;
pub use app::ConfigError;
pub use app::StoreConfig;
pub use app::WorkerConfig;
pub use store::SqliteConfigStore;
pub use store::SqliteConfigStoreError;
