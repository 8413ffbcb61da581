//! Data models for the envguard binary

pub mod config;

pub use config::Config;
