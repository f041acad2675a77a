use std::path::PathBuf;

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Text(String),
    Image(PathBuf),
    Voice(PathBuf),
    Reset,
    Wipe,
    Help,
    Quit,
    /// Unknown slash command or one missing its argument.
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Command::Text(line.trim_end_matches(['\r', '\n']).to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match (name, arg) {
            ("image", "") | ("voice", "") => Command::Invalid(format!("/{name} needs a file path")),
            ("image", path) => Command::Image(PathBuf::from(path)),
            ("voice", path) => Command::Voice(PathBuf::from(path)),
            ("reset", _) => Command::Reset,
            ("wipe", _) => Command::Wipe,
            ("help", _) => Command::Help,
            ("quit", _) | ("exit", _) => Command::Quit,
            _ => Command::Invalid(format!("unknown command /{name}")),
        }
    }
}

pub const HELP: &str = "\
Type a message and press enter to send it.
  /image <path>   send an image file
  /voice <path>   send a voice recording
  /reset          start a new thread with the same session
  /wipe           delete this session and start over
  /quit           leave";
