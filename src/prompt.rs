//! The fixed extraction prompt
use crate::schemas::chat_completions::ChatMessage;

/// System instruction sent ahead of every document.
pub const EXTRACTION_TEMPLATE: &str = "Extract and save the relevant entities mentioned \
in the following passage together with their properties.

If a property is not present and is not required in the function parameters, do not include it in the output.";

/// Builds the conversation for one document: the fixed instruction, then the document text as
/// the only user message.
pub fn compose(text: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(EXTRACTION_TEMPLATE), ChatMessage::user(text)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_places_text_in_single_user_message() {
        let messages = compose("Acme Corp, founded 1990");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content.as_deref(), Some(EXTRACTION_TEMPLATE));
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content.as_deref(), Some("Acme Corp, founded 1990"));
    }

    #[test]
    fn test_compose_does_not_interpret_text() {
        let text = "{input} {{braces}} and\nnewlines";
        assert_eq!(compose(text)[1].content.as_deref(), Some(text));
        assert_eq!(compose(text), compose(text));
    }

    #[test]
    fn test_template_line_continuation() {
        assert!(EXTRACTION_TEMPLATE.starts_with(
            "Extract and save the relevant entities mentioned in the following passage"
        ));
        assert!(EXTRACTION_TEMPLATE.contains("\n\nIf a property is not present"));
    }
}
