//! The `Generator` trait -- the seam between controllers and the
//! text-generation service.
//!
//! [`super::GeminiClient`] is the production implementation; tests use a
//! scripted one. Controllers take `&dyn Generator`.

use async_trait::async_trait;

use super::error::GenerationError;

/// Turns a prompt into generated text. One request per call, no retries.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable name (e.g. the model id).
    fn name(&self) -> &str;

    /// Generate free text for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Generate text the caller will parse as JSON.
    ///
    /// Implementations that support a constrained JSON output mode should
    /// enable it here. The caller still strips fences and parses.
    async fn generate_json(&self, prompt: &str) -> Result<String, GenerationError> {
        self.generate(prompt).await
    }
}

// Compile-time assertion: Generator must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Generator) {}
};
