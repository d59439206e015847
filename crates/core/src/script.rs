//! Scripted, paced sequences such as the intro.
//!
//! A script is plain data: an ordered list of actions, each followed by a
//! pause. The game executes one step per actor message and schedules the
//! next step after the pause, so the same script runs identically under a
//! real clock and under tokio's paused test clock.

use std::collections::VecDeque;
use std::time::Duration;

/// One step of a script: perform `action`, then wait `delay` before the
/// next step.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScriptStep<A> {
    /// What to do.
    pub action: A,
    /// How long to wait afterwards.
    pub delay: Duration,
}

/// An ordered list of steps, consumed front to back.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Script<A> {
    steps: VecDeque<ScriptStep<A>>,
}

impl<A> Script<A> {
    /// Creates an empty script.
    #[inline]
    pub fn new() -> Self {
        Self {
            steps: VecDeque::new(),
        }
    }

    /// Appends a step.
    #[inline]
    pub fn then(mut self, action: A, delay: Duration) -> Self {
        self.steps.push_back(ScriptStep { action, delay });
        self
    }

    /// Removes and returns the next step.
    #[inline]
    pub fn next_step(&mut self) -> Option<ScriptStep<A>> {
        self.steps.pop_front()
    }

    /// Iterates over the remaining steps.
    #[inline]
    pub fn steps(&self) -> impl Iterator<Item = &ScriptStep<A>> {
        self.steps.iter()
    }

    /// Returns the sum of all remaining pauses.
    pub fn total_delay(&self) -> Duration {
        self.steps.iter().map(|s| s.delay).sum()
    }

    /// Returns whether no step is left.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<A> Default for Script<A> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Actions available to the intro.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntroAction {
    /// Starts typing a persona line: the line is added as a pending
    /// assistant message.
    Say(String),
    /// Finishes the line started by the latest `Say`.
    Reveal,
    /// Shows the hint overlay.
    ShowHint,
    /// Makes the trial available.
    OfferTrial,
}

/// The intro played when a game starts. Input is enabled once the script
/// runs out.
pub type IntroScript = Script<IntroAction>;

/// The persona's opening lines.
pub const VERITAS_LINES: [&str; 3] = [
    "Hello, my name is Veritas. It's a pleasure to meet you!",
    "I am someone who tells no lie, I always tell the truth and I have an \
     absolute pleasure doing so.",
    "I'd be honored to speak to you. How has your day been?",
];

impl Script<IntroAction> {
    /// Appends a line that is typed for `typing` before being revealed.
    #[inline]
    pub fn typed<S: Into<String>>(self, line: S, typing: Duration) -> Self {
        self.then(IntroAction::Say(line.into()), typing)
            .then(IntroAction::Reveal, Duration::ZERO)
    }

    /// The standard intro: three lines typed for 1.5 s, 2 s and 4 s, then
    /// the hint and the trial button, then input 3 s later.
    pub fn veritas() -> Self {
        let [greeting, creed, question] = VERITAS_LINES;
        Self::new()
            .typed(greeting, Duration::from_millis(1500))
            .typed(creed, Duration::from_millis(2000))
            .typed(question, Duration::from_millis(4000))
            .then(IntroAction::ShowHint, Duration::ZERO)
            .then(IntroAction::OfferTrial, Duration::from_millis(3000))
    }
}
