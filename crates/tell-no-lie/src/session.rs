use tell_no_lie_backend::ChatBackend;
use tell_no_lie_core::{
    CommandError, DEFAULT_HINT_LINES, Game, GameBuilder, GameEvent,
    GameSnapshot, Pacing,
};
use tell_no_lie_http_backend::{HttpBackend, HttpBackendConfigBuilder};

use crate::Settings;
use crate::command::{Command, TRIAL_HINT};

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    game_builder: GameBuilder,
}

impl SessionBuilder {
    /// Creates a session talking to the HTTP backend described by
    /// `settings`.
    pub fn with_settings(settings: &Settings) -> Self {
        let config = HttpBackendConfigBuilder::with_base_url(&settings.base_url)
            .with_timeout(settings.timeout)
            .build();
        let backend = HttpBackend::new(config);
        info!("talking to {}", backend.config().chat_url());
        Self::with_backend(backend).configure(settings)
    }

    /// Creates a session with a specified backend and default settings.
    pub fn with_backend<B: ChatBackend + 'static>(backend: B) -> Self {
        let hint_lines = DEFAULT_HINT_LINES.iter().copied().chain([TRIAL_HINT]);
        let game_builder =
            GameBuilder::with_backend(backend).with_hint_lines(hint_lines);
        Self { game_builder }
    }

    /// Applies the trial set, timeout and context policy of `settings`.
    pub fn configure(mut self, settings: &Settings) -> Self {
        self.game_builder = self
            .game_builder
            .with_trial_set(settings.trial_set.clone())
            .with_context_policy(settings.context_policy)
            .with_pacing(Pacing {
                reply_timeout: settings.timeout,
                ..Default::default()
            });
        self
    }

    /// Attaches a callback invoked with every state change of the game.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(&GameEvent) + Send + Sync + 'static,
    ) -> Self {
        self.game_builder = self.game_builder.on_event(on_event);
        self
    }

    /// Builds the session and starts the game.
    #[inline]
    pub fn build(self) -> Session {
        Session {
            game: self.game_builder.build(),
        }
    }
}

/// What happened to a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The game took the command.
    Accepted,
    /// The game refused the command.
    Refused(CommandError),
    /// The command is not one the game knows.
    Unknown(String),
    /// The player wants to leave.
    Quit,
}

/// A game played through text commands, like a terminal with a prompt.
///
/// This is basically a wrapper around [`Game`].
pub struct Session {
    game: Game,
}

impl Session {
    /// Runs a command.
    ///
    /// Any message sent hides the hint, as if the player had closed it
    /// before typing.
    pub async fn execute(&self, command: Command) -> Outcome {
        let result = match command {
            Command::Say(text) => {
                if !text.trim().is_empty() {
                    self.game.dismiss_hint().ok();
                }
                self.game.submit(text).await.map(|_| ())
            }
            Command::Trial => self.game.start_trial().await,
            Command::Retry => self.game.retry().await,
            Command::DismissHint => self.game.dismiss_hint(),
            Command::Quit => {
                self.game.shutdown();
                return Outcome::Quit;
            }
            Command::Unknown(cmd) => return Outcome::Unknown(cmd),
        };
        match result {
            Ok(()) => Outcome::Accepted,
            Err(err) => {
                debug!("command refused: {err}");
                Outcome::Refused(err)
            }
        }
    }

    /// Returns a copy of the game state.
    #[inline]
    pub async fn snapshot(&self) -> Result<GameSnapshot, CommandError> {
        self.game.snapshot().await
    }

    /// Returns the underlying game.
    #[inline]
    pub fn game(&self) -> &Game {
        &self.game
    }
}
