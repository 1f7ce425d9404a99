//! # groupcast-mirror
//!
//! HTTP adapter implementing [`groupcast_core::ports::MirrorPort`] against
//! the downstream mirror service's group API, including its error-code
//! convention for "group does not exist".

pub mod client;
pub mod models;

pub use client::MirrorClient;
