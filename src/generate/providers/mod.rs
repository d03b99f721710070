//! Generation backends.

#[cfg(feature = "gemini")]
mod gemini;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiGenerator, GeminiGeneratorBuilder, GeminiModel};
