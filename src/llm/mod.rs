//! Prompt completion clients used by the `prompt` node kind.
//!
//! The runtime only sees the [`PromptClient`] trait: a single async
//! completion call. The default [`EchoClient`] keeps graphs fully
//! functional offline; the `openai` cargo feature adds a real chat
//! completion backend in [`openai`].

#[cfg(feature = "openai")]
pub mod openai;

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// A prompt call failed. Cancellation is not an error: cancelled calls are
/// aborted and never resolve.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum PromptError {
    #[error("prompt backend unavailable: {message}")]
    #[diagnostic(
        code(breadboard::llm::unavailable),
        help("configure a PromptClient on the runtime builder, or enable the openai feature")
    )]
    Unavailable { message: String },

    #[error("prompt call failed: {message}")]
    #[diagnostic(code(breadboard::llm::failed))]
    Failed { message: String },
}

/// Async completion backend for prompt nodes.
#[async_trait]
pub trait PromptClient: Send + Sync {
    /// Complete the fully rendered prompt text and return the reply.
    async fn complete(&self, prompt: &str) -> Result<String, PromptError>;
}

/// Returns the rendered prompt unchanged. Default client, so graphs with
/// prompt nodes run without any external service.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoClient;

#[async_trait]
impl PromptClient for EchoClient {
    async fn complete(&self, prompt: &str) -> Result<String, PromptError> {
        Ok(prompt.to_string())
    }
}

/// Substitute `{{key}}` placeholders with accumulated variable values.
/// Unknown placeholders are left in place so the mistake stays visible in
/// the completed text.
pub fn render_template(template: &str, vars: &FxHashMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("{{{{{key}}}}}");
        rendered = rendered.replace(&placeholder, value);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> FxHashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn template_substitutes_all_occurrences() {
        let vars = vars(&[("name", "piezo"), ("pin", "8")]);
        let out = render_template("play {{name}} on pin {{pin}} ({{name}})", &vars);
        assert_eq!(out, "play piezo on pin 8 (piezo)");
    }

    #[test]
    fn unknown_placeholders_survive() {
        let out = render_template("hello {{who}}", &FxHashMap::default());
        assert_eq!(out, "hello {{who}}");
    }

    #[tokio::test]
    async fn echo_client_round_trips() {
        let reply = EchoClient.complete("describe a 3 on the display").await;
        assert_eq!(reply.unwrap(), "describe a 3 on the display");
    }
}
