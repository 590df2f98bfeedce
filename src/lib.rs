//! asmspy core library.
//!
//! This crate exposes programmatic APIs for finding assemblies in one
//! directory that reference different versions of the same dependency.
//!
//! High-level modules:
//! - `analyse`: End-to-end pipeline for one directory.
//! - `classify`: Conflict verdicts per dependency name.
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `index`: Cross-module dependency index in processing order.
//! - `models`: Module records, dependency edges, and versions.
//! - `output`: Human/JSON printers for reports.
//! - `reader`: PE/CLI metadata reading.
//! - `report`: Structured report building and filter policy.
//! - `scan`: Candidate discovery and parallel reading.
//! - `utils`: Supporting helpers.
pub mod analyse;
pub mod classify;
pub mod cli;
pub mod config;
pub mod index;
pub mod models;
pub mod output;
pub mod reader;
pub mod report;
pub mod scan;
pub mod utils;
