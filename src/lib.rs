pub mod config;
pub mod logger;
pub mod error;
pub mod envelope;
pub mod post;
pub mod post_controller;
pub mod server;
pub mod storage;
pub mod media;
pub mod client;
pub mod text_utils;
pub mod query_string;
mod paginator;
#[cfg(test)]
mod test_data;
