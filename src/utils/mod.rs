//! Shared utility functions.
//!
//! - `text`: whitespace and control-character normalization
//! - `url`: resolving and identifying page URLs

mod text;
mod url;

pub use self::text::{clean_text, normalize_ws, truncate_chars};
pub use self::url::{extract_domain, resolve_url};
