//! Headshot generation: the request contract, prompt wording and backends.

mod prompt;
mod provider;
pub mod providers;

pub use prompt::build_prompt;
pub use provider::{HeadshotGenerator, HeadshotRequest};
