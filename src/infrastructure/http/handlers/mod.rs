//! HTTP Handlers

mod embed;
mod form;
mod generate;
mod status;

pub use embed::*;
pub use generate::*;
pub use status::*;
