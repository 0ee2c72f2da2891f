//! Access to the news/comment/vote service.

pub mod client;
mod envelope;
pub mod types;

pub use client::ApiClient;
