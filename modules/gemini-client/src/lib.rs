pub mod client;
pub mod error;
pub mod types;
pub mod util;

pub use client::Gemini;
pub use error::{GeminiError, Result};
pub use util::{parse_yes_no, strip_code_blocks, truncate_to_char_boundary};
