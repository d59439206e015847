use std::time::Duration;

use tell_no_lie_backend::ChatBackend;

use super::{Game, GameEvent};
use crate::chat_client::{ChatClient, DEFAULT_REPLY_TIMEOUT};
use crate::script::IntroScript;
use crate::trial::TrialSet;

/// Hint lines shown after the intro. Front ends usually append a line
/// explaining how to start the trial.
pub const DEFAULT_HINT_LINES: [&str; 4] = [
    "Psssst, Veritas isn't always as honest as they might seem.",
    "Sometimes they can be tricked into telling false information.",
    "Try to get them to say that 2 + 2 = 5.",
    "Test your progress along the way.",
];

/// Pauses and limits applied to exchanges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    /// Pause between a submission and its reply placeholder.
    pub reply_delay: Duration,
    /// Pause between a passed probe and the next one.
    pub probe_interval: Duration,
    /// Time a reply may take before the request counts as failed.
    pub reply_timeout: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            reply_delay: Duration::from_millis(500),
            probe_interval: Duration::from_millis(1000),
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }
}

/// What goes into the backend context besides player messages and replies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContextPolicy {
    /// Whether trial questions are sent as history on later requests.
    pub include_probes: bool,
}

type ClientFactory = Box<dyn FnOnce(Duration) -> ChatClient + Send>;
pub(super) type EventCallback = Box<dyn Fn(&GameEvent) + Send + Sync>;

/// [`Game`] builder.
pub struct GameBuilder {
    pub(super) make_client: ClientFactory,
    pub(super) intro: IntroScript,
    pub(super) trial_set: TrialSet,
    pub(super) pacing: Pacing,
    pub(super) context_policy: ContextPolicy,
    pub(super) hint_lines: Vec<String>,
    pub(super) on_event: Option<EventCallback>,
}

impl GameBuilder {
    /// Creates a new builder with the specified backend.
    pub fn with_backend<B: ChatBackend + 'static>(backend: B) -> Self {
        Self {
            make_client: Box::new(move |timeout| {
                ChatClient::new(backend, timeout)
            }),
            intro: IntroScript::veritas(),
            trial_set: TrialSet::default(),
            pacing: Pacing::default(),
            context_policy: ContextPolicy::default(),
            hint_lines: DEFAULT_HINT_LINES
                .iter()
                .map(|line| line.to_string())
                .collect(),
            on_event: None,
        }
    }

    /// Replaces the intro script.
    #[inline]
    pub fn with_intro(mut self, intro: IntroScript) -> Self {
        self.intro = intro;
        self
    }

    /// Replaces the trial questions.
    #[inline]
    pub fn with_trial_set(mut self, trial_set: TrialSet) -> Self {
        self.trial_set = trial_set;
        self
    }

    /// Replaces the pauses and the reply timeout.
    #[inline]
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Sets what goes into the backend context.
    #[inline]
    pub fn with_context_policy(mut self, policy: ContextPolicy) -> Self {
        self.context_policy = policy;
        self
    }

    /// Replaces the hint lines.
    #[inline]
    pub fn with_hint_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hint_lines = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches a callback invoked with every state change.
    ///
    /// The callback runs on the game's task and must not block.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(&GameEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_event = Some(Box::new(on_event));
        self
    }

    /// Builds the game and starts the intro.
    ///
    /// Must be called from within a tokio runtime.
    #[inline]
    pub fn build(self) -> Game {
        Game::spawn_from_builder(self)
    }
}
