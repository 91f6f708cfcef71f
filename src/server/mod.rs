//! HTTP server: accept loop, per-connection routing, pages

pub mod config;
pub mod connection;
pub mod listener;
pub mod pages;

pub use config::ServerConfig;
pub use connection::Connection;
pub use listener::MjpegServer;
