// src/lib.rs

pub mod api;
pub mod app;
pub mod chat;
pub mod chat_message;
pub mod chat_view;
pub mod composer;
pub mod config;
pub mod errors;
pub mod key_handlers;
pub mod logging;
pub mod models;
pub mod session;
pub mod status_indicator;
pub mod stream;

pub use app::{App, AppScreen};
