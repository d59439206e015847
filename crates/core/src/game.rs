mod builder;
mod event;
mod state;
#[cfg(test)]
mod tests;

use tell_no_lie_actor::Actor;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::chat_client::ChatClient;
use crate::message::{MessageId, Sender};
use crate::script::IntroScript;
use crate::store::MessageStore;
use crate::trial::TrialSet;
use builder::EventCallback;
pub use builder::{ContextPolicy, DEFAULT_HINT_LINES, GameBuilder, Pacing};
pub use event::{CommandError, GameEvent, GameSnapshot, Stage};
use state::{DismissHint, GetSnapshot, Retry, StartTrial, Submit};

/// The state owned by a game's actor.
///
/// Every command is answered right away from the current stage: nothing is
/// queued behind a running exchange, a command that doesn't fit the stage
/// is refused with a [`CommandError`].
pub(crate) struct GameState {
    chat_client: ChatClient,
    store: MessageStore,
    stage: Stage,
    published_input: bool,

    intro: IntroScript,
    typing_line: Option<MessageId>,
    hint_lines: Vec<String>,
    hint_visible: bool,

    trial_set: TrialSet,
    trial_available: bool,
    trial: Option<TrialRun>,
    victory: Option<usize>,

    exchange: Option<Exchange>,
    failed_submission: Option<Submission>,
    in_flight: Option<JoinHandle<()>>,

    pacing: Pacing,
    context_policy: ContextPolicy,
    on_event: Option<EventCallback>,
}

/// Progress of a running trial.
#[derive(Clone, Copy, Debug)]
struct TrialRun {
    probe: usize,
}

/// Text sent to the backend, with the message it was recorded as.
#[derive(Clone, Debug)]
struct Submission {
    id: MessageId,
    sender: Sender,
    text: String,
}

/// The submission being answered, and its placeholder once added.
#[derive(Debug)]
struct Exchange {
    submission: Submission,
    placeholder: Option<MessageId>,
}

impl Drop for GameState {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            trace!("aborting the in-flight request");
            task.abort();
        }
    }
}

/// A running game.
///
/// The intro starts playing as soon as the game is built. Dropping the
/// last handle or calling [`shutdown`](Self::shutdown) stops everything:
/// pending pauses never fire and an in-flight request is abandoned.
pub struct Game {
    actor: Actor<GameState>,
}

impl Game {
    /// Submits player text.
    ///
    /// Returns the id of the recorded message. The reply arrives later as
    /// [`GameEvent`]s.
    pub async fn submit<S: Into<String>>(
        &self,
        text: S,
    ) -> Result<MessageId, CommandError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            Submit {
                text: text.into(),
                reply,
            },
            rx,
        )
        .await?
    }

    /// Starts the trial.
    pub async fn start_trial(&self) -> Result<(), CommandError> {
        let (reply, rx) = oneshot::channel();
        self.request(StartTrial(reply), rx).await?
    }

    /// Resends the latest submission whose reply failed.
    pub async fn retry(&self) -> Result<(), CommandError> {
        let (reply, rx) = oneshot::channel();
        self.request(Retry(reply), rx).await?
    }

    /// Hides the hint overlay.
    pub fn dismiss_hint(&self) -> Result<(), CommandError> {
        self.actor
            .send(DismissHint)
            .map_err(|_| CommandError::Terminated)
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> Result<GameSnapshot, CommandError> {
        let (reply, rx) = oneshot::channel();
        self.request(GetSnapshot(reply), rx).await
    }

    /// Stops the game. Later commands fail with
    /// [`CommandError::Terminated`].
    #[inline]
    pub fn shutdown(&self) {
        self.actor.try_kill();
    }

    /// Returns whether the game is still running.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.actor.is_alive()
    }

    async fn request<M, T>(
        &self,
        msg: M,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, CommandError>
    where
        M: tell_no_lie_actor::Message<GameState>,
    {
        self.actor.send(msg).map_err(|_| CommandError::Terminated)?;
        rx.await.map_err(|_| CommandError::Terminated)
    }
}

impl Game {
    fn spawn_from_builder(builder: GameBuilder) -> Self {
        let GameBuilder {
            make_client,
            intro,
            trial_set,
            pacing,
            context_policy,
            hint_lines,
            on_event,
        } = builder;
        debug!(
            "intro of {} steps, {} ms of pauses",
            intro.steps().count(),
            intro.total_delay().as_millis()
        );

        let state = GameState {
            chat_client: make_client(pacing.reply_timeout),
            store: Default::default(),
            stage: Stage::Intro,
            published_input: false,
            intro,
            typing_line: None,
            hint_lines,
            hint_visible: false,
            trial_set,
            trial_available: false,
            trial: None,
            victory: None,
            exchange: None,
            failed_submission: None,
            in_flight: None,
            pacing,
            context_policy,
            on_event,
        };
        let actor = Actor::spawn(state, "game");
        state::start_intro(&actor);
        Self { actor }
    }
}
