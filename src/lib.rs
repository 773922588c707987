// src/lib.rs
// Library interface for domain-scan
pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod domains;
pub mod download;
pub mod facts;
pub mod logging;
pub mod process;
pub mod psl;
pub mod runner;
pub mod timestamps;
