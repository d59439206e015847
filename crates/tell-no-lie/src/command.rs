/// A line typed by the player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Text to send to Veritas.
    Say(String),
    /// Start the trial.
    Trial,
    /// Resend the last message that got no reply.
    Retry,
    /// Hide the hint.
    DismissHint,
    /// Leave the game.
    Quit,
    /// A `/`-command that doesn't exist.
    Unknown(String),
}

/// The hint line telling how to start the trial from the terminal.
pub const TRIAL_HINT: &str =
    "Type /trial whenever you think Veritas is ready for the test.";

/// Commands and what they do, for the help line.
pub const COMMAND_HELP: &str =
    "/trial start the trial, /retry resend, /hint hide the hint, /quit leave";

impl Command {
    /// Parses a line of input. Surrounding whitespace is ignored.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "/trial" => Self::Trial,
            "/retry" => Self::Retry,
            "/hint" => Self::DismissHint,
            "/quit" | "/exit" => Self::Quit,
            _ if line.starts_with('/') => Self::Unknown(line.to_owned()),
            _ => Self::Say(line.to_owned()),
        }
    }
}
