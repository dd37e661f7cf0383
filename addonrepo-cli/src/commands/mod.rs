//! CLI command implementations.

pub mod build;
pub mod catalog;
pub mod common;
pub mod init;
pub mod list;
pub mod output;
pub mod package;
pub mod verify;
