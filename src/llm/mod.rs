pub mod client;
pub mod extractor;
pub mod prompts;
pub mod types;
pub mod validate;

pub use client::*;
pub use extractor::*;
pub use types::*;
pub use validate::{parse_records, strip_code_fence};
