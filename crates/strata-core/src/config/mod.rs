//! Configuration management for Strata.
//!
//! User preferences ([`settings::Config`]) are stored as TOML and loaded
//! once at startup.

pub mod settings;
