//! Line commands typed into the terminal.
//!
//! A line starting with `:` is a command. Any other line is document text
//! appended to the buffer as a new line.

use duet_app::DriverInput;
use duet_client::ClientEvent;
use duet_proto::Language;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    /// `:q` or `:quit`
    Quit,
    /// `:lang <language>`
    Language(Language),
    /// `:dismiss`
    Dismiss,
    /// `:cursor <n>`, in characters
    Cursor(usize),
    /// `:set <text>` replaces the whole buffer; `\n` escapes become newlines
    Set(String),
    /// `:clear`
    Clear,
    /// Plain text line
    Append(String),
}

impl LineCommand {
    /// Parse one line of input.
    ///
    /// # Errors
    ///
    /// Returns a message for the user if the command is unknown or its
    /// argument is invalid.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(command) = line.strip_prefix(':') else {
            return Ok(Self::Append(line.to_string()));
        };

        let (name, arg) = command.split_once(' ').unwrap_or((command, ""));
        match name {
            "q" | "quit" => Ok(Self::Quit),
            "lang" => arg.parse::<Language>().map(Self::Language).map_err(|e| e.to_string()),
            "dismiss" => Ok(Self::Dismiss),
            "cursor" => arg
                .trim()
                .parse()
                .map(Self::Cursor)
                .map_err(|_| format!("not a cursor position: {arg:?}")),
            "set" => Ok(Self::Set(arg.replace("\\n", "\n"))),
            "clear" => Ok(Self::Clear),
            other => Err(format!("unknown command :{other}")),
        }
    }

    /// Input for the runtime, given the buffer as last rendered.
    pub fn into_input(self, buffer: &str) -> DriverInput {
        match self {
            Self::Quit => DriverInput::Quit,
            Self::Language(language) => {
                DriverInput::Client(ClientEvent::SelectLanguage { language })
            },
            Self::Dismiss => DriverInput::Client(ClientEvent::DismissSuggestion),
            Self::Cursor(cursor) => DriverInput::Client(ClientEvent::CursorMoved { cursor }),
            Self::Set(text) => edit(text),
            Self::Clear => edit(String::new()),
            Self::Append(line) if buffer.is_empty() => edit(line),
            Self::Append(line) => edit(format!("{buffer}\n{line}")),
        }
    }
}

fn edit(buffer: String) -> DriverInput {
    let cursor = buffer.chars().count();
    DriverInput::Client(ClientEvent::LocalEdit { buffer, cursor })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_append() {
        let command = LineCommand::parse("print(1)\n").unwrap();
        assert_eq!(command, LineCommand::Append("print(1)".into()));

        assert_eq!(
            command.clone().into_input("x = 1"),
            DriverInput::Client(ClientEvent::LocalEdit {
                buffer: "x = 1\nprint(1)".into(),
                cursor: 14
            })
        );
        assert_eq!(
            command.into_input(""),
            DriverInput::Client(ClientEvent::LocalEdit { buffer: "print(1)".into(), cursor: 8 })
        );
    }

    #[test]
    fn commands_parse() {
        assert_eq!(LineCommand::parse(":q"), Ok(LineCommand::Quit));
        assert_eq!(
            LineCommand::parse(":lang TypeScript"),
            Ok(LineCommand::Language(Language::Typescript))
        );
        assert_eq!(LineCommand::parse(":cursor 3"), Ok(LineCommand::Cursor(3)));
        assert_eq!(LineCommand::parse(":set a\\nb"), Ok(LineCommand::Set("a\nb".into())));
        assert_eq!(LineCommand::parse(":dismiss"), Ok(LineCommand::Dismiss));
    }

    #[test]
    fn bad_commands_are_reported() {
        assert!(LineCommand::parse(":lang cobol").is_err());
        assert!(LineCommand::parse(":cursor x").is_err());
        assert!(LineCommand::parse(":frobnicate").is_err());
    }

    #[test]
    fn multibyte_cursor_counts_chars() {
        assert_eq!(
            LineCommand::Set("héllo".into()).into_input(""),
            DriverInput::Client(ClientEvent::LocalEdit { buffer: "héllo".into(), cursor: 5 })
        );
    }
}
