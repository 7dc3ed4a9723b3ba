//! Line commands understood by the host binary on stdin.

use crate::error::CommandError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// New value of the "guests today" signal
    Guests(bool),
    /// Raw publish through the announcer
    Send { topic: String, message: String },
    /// Log the connection status
    Status,
}

impl HostCommand {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    ///
    /// The message of `send` is everything after the topic and its separating
    /// whitespace, kept as typed including trailing whitespace.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim_start();
        if line.trim_end().is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim_start()),
            None => (line, ""),
        };
        let bare = rest.trim_end().is_empty();

        let command = match word.to_ascii_lowercase().as_str() {
            "on" | "true" | "yes" | "1" if bare => HostCommand::Guests(true),
            "off" | "false" | "no" | "0" if bare => HostCommand::Guests(false),
            "status" if bare => HostCommand::Status,
            "send" => {
                let (topic, message) = match rest.split_once(char::is_whitespace) {
                    Some((topic, message)) => (topic, message),
                    None => (rest, ""),
                };
                if topic.is_empty() {
                    return Err(CommandError::MissingTopic);
                }
                HostCommand::Send {
                    topic: topic.to_string(),
                    message: message.to_string(),
                }
            }
            _ => return Err(CommandError::Unknown(line.trim_end().to_string())),
        };
        Ok(Some(command))
    }
}
