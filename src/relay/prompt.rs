//! Prompt templating
//!
//! The markers used here are also what the sanitizer strips from the
//! backend output, so both read them from the same [`PromptTemplate`].

pub const SYSTEM_MARKER: &str = "<|system|>";
pub const USER_MARKER: &str = "<|user|>";
pub const ASSISTANT_MARKER: &str = "<|assistant|>";

const EXPERT_PERSONA: &str = "You are a domain expert. Answer the question directly and \
accurately. Do not repeat the question and do not introduce yourself.";

/// Instruction persona plus the role markers that delimit each segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub persona: String,
    pub system_marker: String,
    pub user_marker: String,
    pub assistant_marker: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            persona: EXPERT_PERSONA.to_string(),
            system_marker: SYSTEM_MARKER.to_string(),
            user_marker: USER_MARKER.to_string(),
            assistant_marker: ASSISTANT_MARKER.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Render the prompt for one user message. The assistant segment is
    /// left open for the backend to fill.
    pub fn render(&self, user_message: &str) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n",
            self.system_marker,
            self.persona,
            self.user_marker,
            user_message.trim(),
            self.assistant_marker,
        )
    }

    /// Markers a reply must never start with
    pub fn role_markers(&self) -> [&str; 3] {
        [
            self.assistant_marker.as_str(),
            self.user_marker.as_str(),
            self.system_marker.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_layout() {
        let prompt = PromptTemplate::default().render("  What is Rust?  ");
        assert!(prompt.starts_with(SYSTEM_MARKER));
        assert!(prompt.contains("Do not repeat the question"));
        assert!(prompt.contains("<|user|>\nWhat is Rust?\n<|assistant|>\n"));
        assert!(prompt.ends_with("<|assistant|>\n"));
    }

    #[test]
    fn test_assistant_segment_is_last_marker() {
        let template = PromptTemplate::default();
        let prompt = template.render("hi");
        let assistant = prompt.rfind(&template.assistant_marker).unwrap();
        let user = prompt.rfind(&template.user_marker).unwrap();
        assert!(user < assistant);
    }

    #[test]
    fn test_custom_markers() {
        let template = PromptTemplate {
            user_marker: "### User:".to_string(),
            assistant_marker: "### Assistant:".to_string(),
            ..PromptTemplate::default()
        };
        let prompt = template.render("hello");
        assert!(prompt.contains("### User:\nhello\n### Assistant:\n"));
        assert_eq!(template.role_markers()[0], "### Assistant:");
    }
}
