//! Helper functions shared by the renderer, generator and templates

mod date;
mod url;

pub use date::*;
pub use url::*;
