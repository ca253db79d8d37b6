//! Core engine services: configuration loading and defaults.

pub mod config;
