/// What an active session asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Online,
    Help,
    Color,
    CloseStatus,
    CloseIn(u32),
    CloseInvalid,
    Chat(String),
    Blank,
}

impl Command {
    /// Commands are case-sensitive and must be the first word exactly.
    /// `/close` minutes must fit in a `u32`.
    pub fn parse(input: &str) -> Self {
        let text = input.trim();
        if text.is_empty() {
            return Command::Blank;
        }

        let mut words = text.split_whitespace();
        let head = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        match (head, args.as_slice()) {
            ("/exit" | "/quit", []) => Command::Exit,
            ("/online", []) => Command::Online,
            ("/help", []) => Command::Help,
            ("/color", []) => Command::Color,
            ("/close", []) => Command::CloseStatus,
            ("/close", [minutes]) => match minutes.parse::<u32>() {
                Ok(m) if m > 0 => Command::CloseIn(m),
                _ => Command::CloseInvalid,
            },
            ("/close", _) => Command::CloseInvalid,
            _ => Command::Chat(text.to_string()),
        }
    }
}
