//! Completion sanitization
//!
//! Some backends echo the whole prompt before the answer, others echo only
//! part of it or leave stray role markers behind. How much gets echoed is
//! model specific, so stripping lives behind the [`Sanitizer`] trait and the
//! relay takes whichever implementation fits its backend.

use super::prompt::PromptTemplate;

/// Reply sent when nothing usable is left after stripping
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't generate a response.";

/// Turns a raw completion into the reply the caller sees.
///
/// Implementations must never return an empty string.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, raw: &str, prompt: &str) -> String;
}

/// Strips echoed prompts and role markers produced from a [`PromptTemplate`]
#[derive(Debug, Clone)]
pub struct EchoStripper {
    assistant_marker: String,
    markers: Vec<String>,
    fallback: String,
}

impl EchoStripper {
    pub fn new(template: &PromptTemplate) -> Self {
        Self {
            assistant_marker: template.assistant_marker.clone(),
            markers: template
                .role_markers()
                .iter()
                .filter(|m| !m.is_empty())
                .map(|m| (*m).to_string())
                .collect(),
            fallback: FALLBACK_REPLY.to_string(),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Drop every occurrence of the full prompt
    fn remove_prompt(raw: &str, prompt: &str) -> String {
        let mut text = raw.to_string();
        if prompt.is_empty() {
            return text;
        }
        while text.contains(prompt) {
            text = text.replacen(prompt, "", 1);
        }
        text
    }

    /// Keep only what follows the last assistant marker (partial echoes)
    fn after_assistant_marker<'a>(&self, text: &'a str) -> &'a str {
        if self.assistant_marker.is_empty() {
            return text;
        }
        text.rsplit_once(self.assistant_marker.as_str())
            .map_or(text, |(_, after)| after)
    }

    fn strip_leading_markers<'a>(&self, mut text: &'a str) -> &'a str {
        loop {
            text = text.trim_start();
            match self.markers.iter().find_map(|m| text.strip_prefix(m.as_str())) {
                Some(rest) => text = rest,
                None => return text,
            }
        }
    }
}

impl Sanitizer for EchoStripper {
    fn sanitize(&self, raw: &str, prompt: &str) -> String {
        let without_prompt = Self::remove_prompt(raw, prompt);
        let answer = self.after_assistant_marker(&without_prompt);
        let answer = self.strip_leading_markers(answer).trim();

        if answer.is_empty() {
            self.fallback.clone()
        } else {
            answer.to_string()
        }
    }
}
