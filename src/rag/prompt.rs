// Prompt builder: renders retrieved passages and the question as chat messages
use crate::config::SYSTEM_PROMPT;
use crate::corpus::DocumentRecord;
use crate::models::ChatMessage;

/// Builds the `[system, user]` message pair sent to the generator
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system_prompt: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(SYSTEM_PROMPT)
    }
}

impl PromptBuilder {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
        }
    }

    /// Passages numbered from 1 (`[1] ...`) separated by blank lines
    pub fn format_context(contexts: &[&DocumentRecord]) -> String {
        contexts
            .iter()
            .enumerate()
            .map(|(i, doc)| format!("[{}] {}", i + 1, doc.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn build_messages(&self, query: &str, contexts: &[&DocumentRecord]) -> Vec<ChatMessage> {
        let context_text = Self::format_context(contexts);
        vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(format!(
                "Context:\n{}\n\nQuestion: {}",
                context_text, query
            )),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_messages_structure() {
        let olivine = DocumentRecord::new("Olivine is a magnesium iron silicate.", "doc1");
        let pyroxene = DocumentRecord::new("Pyroxene forms under high pressure.", "doc2");
        let messages = PromptBuilder::default().build_messages("What is olivine?", &[&olivine, &pyroxene]);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(
            messages[1].content,
            "Context:\n[1] Olivine is a magnesium iron silicate.\n\n\
             [2] Pyroxene forms under high pressure.\n\nQuestion: What is olivine?"
        );
    }

    #[test]
    fn test_system_prompt_constraints() {
        let messages = PromptBuilder::default().build_messages("q", &[]);
        let system = &messages[0].content;
        assert!(system.contains("Answer only using the provided context"));
        assert!(system.contains("say you do not know"));
        assert!(system.contains("concise"));
    }

    #[test]
    fn test_missing_text_renders_empty() {
        let doc = DocumentRecord {
            source: "doc3".to_string(),
            ..Default::default()
        };
        assert_eq!(PromptBuilder::format_context(&[&doc]), "[1] ");
    }

    #[test]
    fn test_no_contexts() {
        let messages = PromptBuilder::new("sys").build_messages("q", &[]);
        assert_eq!(messages[1].content, "Context:\n\n\nQuestion: q");
        assert!(!messages[1].content.contains("[1]"));
    }
}
