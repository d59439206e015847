use std::error::Error;
use std::fmt::{self, Display};

use crate::message::Message;

/// The controller's mode.
///
/// Whether a trial is running is tracked separately, see
/// [`GameSnapshot::trial_running`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The scripted intro is playing.
    #[default]
    Intro,
    /// Waiting for the player.
    Idle,
    /// A submission is waiting for its reply.
    AwaitingReply,
    /// Every probe passed. Nothing happens anymore.
    Victory,
}

/// A state change published to the front end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// A message was appended to the store.
    MessageAdded(Message),
    /// A message was updated in place. Holds the updated message.
    MessageUpdated(Message),
    /// The player may (or may no longer) submit input.
    InputChanged(bool),
    /// The hint overlay should be shown with these lines.
    HintShown(Vec<String>),
    /// The hint overlay was dismissed.
    HintDismissed,
    /// The trial can be started from now on.
    TrialAvailable,
    /// A trial has started.
    TrialStarted,
    /// The probe at this index was answered wrongly or not at all, and the
    /// trial was aborted.
    TrialFailed {
        /// Zero-based index of the failed probe.
        probe: usize,
    },
    /// Every probe passed.
    Victory {
        /// Characters the player typed over the whole game.
        characters_typed: usize,
    },
}

/// A point-in-time copy of what the front end should display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSnapshot {
    /// Current mode.
    pub stage: Stage,
    /// Whether the player may submit input.
    pub input_enabled: bool,
    /// Whether the hint overlay is visible.
    pub hint_visible: bool,
    /// Whether the trial can be started.
    pub trial_available: bool,
    /// Whether a trial is in progress.
    pub trial_running: bool,
    /// Characters typed, once victory is reached.
    pub victory: Option<usize>,
    /// Every message, most recent first.
    pub messages: Vec<Message>,
}

/// Why a command was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandError {
    /// The submitted text was blank.
    EmptyInput,
    /// Input is disabled in the current stage.
    InputDisabled,
    /// There is no failed submission to resend.
    NothingToRetry,
    /// The game was won and accepts no further commands.
    GameOver,
    /// The game has been shut down.
    Terminated,
}

impl Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EmptyInput => "nothing to send",
            Self::InputDisabled => "input is disabled right now",
            Self::NothingToRetry => "no failed message to retry",
            Self::GameOver => "the game is over",
            Self::Terminated => "the game has been shut down",
        };
        f.write_str(s)
    }
}

impl Error for CommandError {}
