//! Core logic for the reskill companion: generation client, structured
//! response extraction, week ids, identity and the feature controllers
//! (news feed, mentor chat, weekly plan board, profile editor).

pub mod extract;
pub mod genai;
pub mod identity;
pub mod mentor;
pub mod news;
pub mod plan;
pub mod profile;
pub mod week;

pub use extract::{ExtractError, extract_json, strip_fences};
pub use genai::{FALLBACK_REPLY, GeminiClient, GenerationConfig, GenerationError, Generator};
pub use week::WeekId;
