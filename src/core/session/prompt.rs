//! System instructions for the voice agent.

use std::path::Path;

/// Instructions used when no instructions file is configured.
pub const DEFAULT_INSTRUCTIONS: &str = "\
You are the phone sales agent of an online store that takes payments with Stripe.

How you speak:
- Be warm and professional, and keep every answer short enough to say in one breath.
- Speak English unless the caller uses another language, then switch to theirs.
- Ask one question at a time.
- Do not talk about tools, systems or APIs.

How you work:
- Use the tools for every lookup and every action. Never make up products, prices,
  customers or payment details.
- Ask for anything a tool needs before calling it, and read email addresses back
  to the caller before using them.
- After a tool call, tell the caller the outcome in a sentence.
- If a tool fails, apologise briefly and offer to try again or take another route.

A typical purchase: greet the caller, find the product and its price, take their
email address, create the customer, create a payment link or invoice, then email it
and let them know it is on its way.";

/// Load instructions from `path`, or fall back to [`DEFAULT_INSTRUCTIONS`].
pub fn load_instructions(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let text = text.trim();
            if text.is_empty() {
                Ok(DEFAULT_INSTRUCTIONS.to_string())
            } else {
                Ok(text.to_string())
            }
        }
        None => Ok(DEFAULT_INSTRUCTIONS.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_instructions() {
        assert_eq!(load_instructions(None).unwrap(), DEFAULT_INSTRUCTIONS);
    }

    #[test]
    fn test_instructions_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "  Only answer questions about tea.\n").unwrap();
        assert_eq!(
            load_instructions(Some(&path)).unwrap(),
            "Only answer questions about tea."
        );

        std::fs::write(&path, "\n\n").unwrap();
        assert_eq!(load_instructions(Some(&path)).unwrap(), DEFAULT_INSTRUCTIONS);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(load_instructions(Some(&dir.path().join("missing.txt"))).is_err());
    }
}
