//! Remote text generation.
//!
//! ```text
//! controller --prompt--> &dyn Generator --> GeminiClient --POST--> generateContent
//!                              |
//!                              v
//!                        raw text (maybe fenced JSON) --> crate::extract
//! ```

pub mod error;
pub mod gemini;
pub mod trait_def;

pub use error::GenerationError;
pub use gemini::{FALLBACK_REPLY, GeminiClient, GenerationConfig};
pub use trait_def::Generator;
