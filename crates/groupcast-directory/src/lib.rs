//! # groupcast-directory
//!
//! HTTP adapter implementing [`groupcast_core::ports::DirectoryPort`] against
//! the upstream directory service's REST API.

pub mod client;
pub mod models;

pub use client::DirectoryClient;
pub use models::{SOURCE_NESTED_GROUP, SOURCE_PRINCIPAL};
