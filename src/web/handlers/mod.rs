//! HTTP request handlers

pub mod content;
pub mod index;
pub mod refresh;
pub mod static_assets;
pub mod status;
