//! Inbound bot commands.
//!
//! Parsing only splits the command word from its arguments; argument
//! validation happens in the command service so it can answer the requester.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/add_chat_id <id>`
    RegisterRecipient(String),
    /// `/start`
    Greet,
    /// `/get_ith <source> <item>`
    GetItem(String),
    /// `/add_feed <url>`
    AddSource(String),
}

impl Command {
    /// Parse message text. Returns `None` for plain text and unknown commands.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;

        let (word, args) = match rest.split_once(char::is_whitespace) {
            Some((word, args)) => (word, args.trim()),
            None => (rest, ""),
        };
        // "/cmd@SomeBot" is how group chats address a specific bot
        let name = word.split('@').next().unwrap_or(word);
        let args = args.to_string();

        match name {
            "add_chat_id" => Some(Command::RegisterRecipient(args)),
            "start" => Some(Command::Greet),
            "get_ith" => Some(Command::GetItem(args)),
            "add_feed" => Some(Command::AddSource(args)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::RegisterRecipient(_) => "register-recipient",
            Command::Greet => "greet",
            Command::GetItem(_) => "get-item",
            Command::AddSource(_) => "add-source",
        }
    }
}
