//! Query Handlers

mod embed_handlers;

pub use embed_handlers::*;
