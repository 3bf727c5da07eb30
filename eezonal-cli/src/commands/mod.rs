//! CLI command implementations.

pub mod common;
pub mod config;
pub mod export;
pub mod heat_index;
pub mod init;
pub mod view;
