//! Topic catalog engine for a web-concepts knowledge base.
//!
//! Library root: the binary entry point is `src/main.rs`.

pub mod catalog;
pub mod chat;
pub mod config;
pub mod error;
pub mod logger;
pub mod proxy;
pub mod state;
pub mod storage;
