//! REPL input parsing.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Clear,
    ToggleDark,
    /// `/copy [n]`: copy message `n`, or the latest reply.
    Copy(Option<usize>),
    Prompts,
    /// `/1` .. `/4`: send a suggested prompt.
    Suggested(usize),
    Quit,
    /// Anything that is not a slash command, passed through untrimmed.
    /// A leading `//` escapes to a literal `/`.
    Message(String),
    Unknown(String),
}

#[must_use]
pub fn parse(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Message(line.to_owned());
    };
    // `//text` sends `/text`.
    if rest.starts_with('/') {
        return Command::Message(rest.to_owned());
    }

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    match name {
        "help" | "h" | "?" => Command::Help,
        "clear" => Command::Clear,
        "dark" | "theme" => Command::ToggleDark,
        "prompts" => Command::Prompts,
        "quit" | "exit" | "q" => Command::Quit,
        "copy" => match arg.map(str::parse::<usize>) {
            None => Command::Copy(None),
            Some(Ok(n)) => Command::Copy(Some(n)),
            Some(Err(_)) => Command::Unknown(trimmed.to_owned()),
        },
        _ => match name.parse::<usize>() {
            Ok(n) => Command::Suggested(n),
            Err(_) => Command::Unknown(trimmed.to_owned()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_message() {
        assert_eq!(parse("hello there\n"), Command::Message("hello there\n".into()));
        assert_eq!(parse("   "), Command::Message("   ".into()));
    }

    #[test]
    fn slash_commands() {
        assert_eq!(parse("/help"), Command::Help);
        assert_eq!(parse(" /clear "), Command::Clear);
        assert_eq!(parse("/dark"), Command::ToggleDark);
        assert_eq!(parse("/prompts"), Command::Prompts);
        assert_eq!(parse("/quit"), Command::Quit);
    }

    #[test]
    fn copy_with_and_without_number() {
        assert_eq!(parse("/copy"), Command::Copy(None));
        assert_eq!(parse("/copy 3"), Command::Copy(Some(3)));
        assert_eq!(parse("/copy x"), Command::Unknown("/copy x".into()));
    }

    #[test]
    fn double_slash_sends_literal_slash() {
        assert_eq!(parse("//usr/bin question"), Command::Message("/usr/bin question".into()));
        assert_eq!(parse("  //help "), Command::Message("/help".into()));
    }

    #[test]
    fn numbered_suggestions() {
        assert_eq!(parse("/2"), Command::Suggested(2));
        assert_eq!(parse("/frobnicate"), Command::Unknown("/frobnicate".into()));
    }
}
