pub mod assets;
pub mod cache;
pub mod config;
pub mod errors;
pub mod favorites;
pub mod models;
pub mod proxy;
pub mod services;
pub mod sources;
pub mod utils;
pub mod web;
