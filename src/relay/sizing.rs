//! Generation parameter sizing
//!
//! Short inputs such as greetings get a small token budget so the backend
//! does not spend time on long, unwanted completions. The banding is a
//! heuristic and can be swapped without touching the relay.

/// Sampling parameters that do not depend on the input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.8,
            repetition_penalty: 1.2,
        }
    }
}

/// Word-count banded token budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    /// Inclusive upper word count of the short band
    pub short_words: usize,
    /// Inclusive upper word count of the medium band
    pub medium_words: usize,
    pub short_tokens: u32,
    pub medium_tokens: u32,
    pub long_tokens: u32,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            short_words: 3,
            medium_words: 10,
            short_tokens: 30,
            medium_tokens: 100,
            long_tokens: 250,
        }
    }
}

impl TokenBudget {
    /// `max_new_tokens` for a message
    pub fn max_new_tokens(&self, message: &str) -> u32 {
        let words = word_count(message);
        if words <= self.short_words {
            self.short_tokens
        } else if words <= self.medium_words {
            self.medium_tokens
        } else {
            self.long_tokens
        }
    }
}

pub fn word_count(message: &str) -> usize {
    message.split_whitespace().count()
}
