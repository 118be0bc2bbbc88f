//! Command line parsing.
//!
//! A message is a command when, after trimming, it starts with the command
//! marker (`/` by default). The key runs from just after the marker to the
//! first whitespace; the rest of the line is split into arguments.
//!
//! | Text | Result |
//! |------|--------|
//! | `/help a b` | key `help`, args `["a", "b"]` |
//! | `  /help  ` | key `help`, no args |
//! | `/` | not a command |
//! | `hello /help` | not a command |
//!
//! Keys are case-sensitive. Quote-aware splitting is opt-in through
//! [`CommandParser::quoted`].

mod split;

pub use split::shell_split;

/// The default command marker.
pub const DEFAULT_MARKER: char = '/';

/// A parsed command: key plus ordered arguments.
///
/// Only produced by a successful parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandLine {
    key: String,
    args: Vec<String>,
}

impl CommandLine {
    pub(crate) fn new(key: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            key: key.into(),
            args,
        }
    }

    /// Returns the command key, without the marker.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the arguments in order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the argument at `index`.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Returns whether any arguments were given.
    pub fn has_args(&self) -> bool {
        !self.args.is_empty()
    }

    /// Joins the arguments with single spaces.
    pub fn joined_args(&self) -> String {
        self.args.join(" ")
    }

    /// Parses the arguments into a clap command.
    ///
    /// The key is passed as the binary name, so `/calc add 1 2` parses like
    /// `calc add 1 2` on a shell.
    ///
    /// ```rust,ignore
    /// #[derive(clap::Parser)]
    /// struct Roll { sides: u32 }
    ///
    /// let roll: Roll = command.parse_args()?;
    /// ```
    #[cfg(feature = "command")]
    pub fn parse_args<T: clap::Parser>(&self) -> Result<T, clap::Error> {
        T::try_parse_from(
            std::iter::once(self.key.as_str()).chain(self.args.iter().map(String::as_str)),
        )
    }
}

/// Classifies text as a command line or plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParser {
    marker: char,
    quoted: bool,
}

impl CommandParser {
    /// Creates a parser with the `/` marker and plain whitespace splitting.
    pub fn new() -> Self {
        Self {
            marker: DEFAULT_MARKER,
            quoted: false,
        }
    }

    /// Creates a parser with a custom marker.
    pub fn with_marker(marker: char) -> Self {
        Self {
            marker,
            ..Self::new()
        }
    }

    /// Enables shell-like quoting for arguments.
    ///
    /// With quoting, `/say "hello world"` yields one argument.
    pub fn quoted(mut self, enabled: bool) -> Self {
        self.quoted = enabled;
        self
    }

    /// Returns the command marker.
    pub fn marker(&self) -> char {
        self.marker
    }

    /// Parses `text`, returning `None` when it is not a command.
    pub fn try_parse(&self, text: &str) -> Option<CommandLine> {
        let rest = text.trim().strip_prefix(self.marker)?;

        let (key, tail) = match rest.find(char::is_whitespace) {
            Some(end) => rest.split_at(end),
            None => (rest, ""),
        };
        if key.is_empty() {
            return None;
        }

        let args = if self.quoted {
            shell_split(tail)
        } else {
            tail.split_whitespace().map(str::to_owned).collect()
        };

        Some(CommandLine::new(key, args))
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses `text` with the default parser.
pub fn try_parse(text: &str) -> Option<CommandLine> {
    CommandParser::new().try_parse(text)
}
