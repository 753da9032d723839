//! YaNews and YaNote - news with comments and personal notes
//!
//! This library provides the core functionality of both sites; the binary
//! in `main.rs` serves them from one process.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod templates;
