//! CLI command implementations.

pub mod alerts;
pub mod common;
pub mod config;
pub mod control;
pub mod init;
pub mod watch;
