//! Message parser - decides whether a message is meant for the bot and splits it

use crate::domain::entities::Message;

/// A message addressed to the bot, mention stripped and split on whitespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub parts: Vec<String>,
}

impl ParsedCommand {
    pub fn verb(&self) -> Option<&str> {
        self.parts.first().map(String::as_str)
    }
}

/// Parses incoming messages into command tokens
pub struct MessageParser {
    mention: String,
}

impl MessageParser {
    /// `mention` is how users tag the bot, e.g. `@hinko_bot`
    pub fn new(mention: impl Into<String>) -> Self {
        Self {
            mention: mention.into(),
        }
    }

    /// Strip a leading bot mention, if present
    pub fn strip_mention<'a>(&self, text: &'a str) -> (&'a str, bool) {
        let trimmed = text.trim_start();
        let m = self.mention.len();
        if !self.mention.is_empty()
            && trimmed.len() >= m
            && trimmed.is_char_boundary(m)
            && trimmed[..m].eq_ignore_ascii_case(&self.mention)
        {
            let rest = &trimmed[m..];
            // "@hinko_botx" is somebody else
            let boundary = rest.chars().next().map_or(true, |c| c.is_whitespace() || c == ':' || c == ',');
            if boundary {
                let rest = rest.trim_start_matches([':', ',']);
                return (rest.trim(), true);
            }
        }
        (text.trim(), false)
    }

    /// `None` unless the message is a direct message or starts with a mention
    pub fn parse(&self, message: &Message) -> Option<ParsedCommand> {
        let (text, mentioned) = self.strip_mention(&message.text);
        if !(message.is_addressed() || mentioned) {
            return None;
        }
        Some(ParsedCommand {
            parts: Self::tokenize(text),
        })
    }

    pub fn tokenize(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> MessageParser {
        MessageParser::new("@hinko_bot")
    }

    #[test]
    fn test_direct_message_is_parsed_as_is() {
        let msg = Message::new("1", "  put greeting   hello world ").direct();
        let parsed = parser().parse(&msg).unwrap();
        assert_eq!(parsed.parts, vec!["put", "greeting", "hello", "world"]);
        assert_eq!(parsed.verb(), Some("put"));
    }

    #[test]
    fn test_mention_in_shared_channel_is_stripped() {
        let msg = Message::new("-100", "@Hinko_Bot: group devs list");
        let parsed = parser().parse(&msg).unwrap();
        assert_eq!(parsed.parts, vec!["group", "devs", "list"]);
    }

    #[test]
    fn test_unaddressed_channel_message_is_ignored() {
        assert!(parser().parse(&Message::new("-100", "get greeting")).is_none());
        assert!(parser().parse(&Message::new("-100", "@hinko_botty help")).is_none());
        assert!(parser().parse(&Message::new("-100", "hey @hinko_bot help")).is_none());
    }

    #[test]
    fn test_adapter_flag_counts_as_mention() {
        let msg = Message::new("-100", "help").mentioning_bot();
        assert_eq!(parser().parse(&msg).unwrap().parts, vec!["help"]);
    }

    #[test]
    fn test_bare_mention_yields_no_parts() {
        let parsed = parser().parse(&Message::new("-100", "@hinko_bot")).unwrap();
        assert!(parsed.parts.is_empty());
        assert_eq!(parsed.verb(), None);
    }
}
