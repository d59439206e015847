use std::fmt::{self, Debug};

use tell_no_lie_actor::{Actor, Message as ActorMessage};
use tokio::sync::oneshot;

use super::{
    CommandError, Exchange, GameEvent, GameSnapshot, GameState, Stage,
    Submission, TrialRun,
};
use crate::chat_client::{SubmitResult, build_request};
use crate::message::{MessageId, MessagePatch, Sender, TrialOutcome};
use crate::script::IntroAction;

/// Kicks off the intro of a freshly spawned game.
pub(super) fn start_intro(actor: &Actor<GameState>) {
    actor.send(AdvanceIntro).ok();
}

impl GameState {
    #[inline]
    fn emit(&self, event: GameEvent) {
        trace!("event: {event:?}");
        if let Some(on_event) = &self.on_event {
            on_event(&event);
        }
    }

    #[inline]
    fn input_enabled(&self) -> bool {
        self.stage == Stage::Idle && self.trial.is_none()
    }

    /// Publishes the input flag if it changed since it was last published.
    fn sync_input(&mut self) {
        let enabled = self.input_enabled();
        if enabled != self.published_input {
            self.published_input = enabled;
            self.emit(GameEvent::InputChanged(enabled));
        }
    }

    fn set_stage(&mut self, stage: Stage) {
        if self.stage != stage {
            debug!("stage {:?} -> {stage:?}", self.stage);
            self.stage = stage;
        }
        self.sync_input();
    }

    fn append(&mut self, sender: Sender, text: String) -> MessageId {
        let id = self.store.append(sender, text);
        if let Some(msg) = self.store.get(id) {
            self.emit(GameEvent::MessageAdded(msg.clone()));
        }
        id
    }

    fn update(&mut self, id: MessageId, patch: MessagePatch) {
        match self.store.update_by_id(id, patch) {
            Some(msg) => {
                let event = GameEvent::MessageUpdated(msg.clone());
                self.emit(event);
            }
            None => {
                error!("no message with id {id}");
                debug_assert!(false, "updated a message that doesn't exist");
            }
        }
    }

    /// Runs intro steps until one asks for a pause, or finishes the intro.
    fn advance_intro(&mut self, handle: &Actor<Self>) {
        if self.stage != Stage::Intro {
            return;
        }
        while let Some(step) = self.intro.next_step() {
            match step.action {
                IntroAction::Say(line) => {
                    let id = self.append(Sender::Assistant, line);
                    self.typing_line = Some(id);
                }
                IntroAction::Reveal => {
                    if let Some(id) = self.typing_line.take() {
                        self.update(id, MessagePatch::settled());
                    }
                }
                IntroAction::ShowHint => self.show_hint(),
                IntroAction::OfferTrial => {
                    if !self.trial_available {
                        self.trial_available = true;
                        self.emit(GameEvent::TrialAvailable);
                    }
                }
            }
            if !step.delay.is_zero() {
                handle.send_after(step.delay, AdvanceIntro);
                return;
            }
        }

        // A line left typing by a script without a final reveal.
        if let Some(id) = self.typing_line.take() {
            self.update(id, MessagePatch::settled());
        }
        debug!("intro finished");
        self.set_stage(Stage::Idle);
    }

    fn show_hint(&mut self) {
        self.hint_visible = true;
        self.emit(GameEvent::HintShown(self.hint_lines.clone()));
    }

    fn dismiss_hint(&mut self) {
        if self.hint_visible {
            self.hint_visible = false;
            self.emit(GameEvent::HintDismissed);
        }
    }

    /// Checks that nothing else is going on before a command may run.
    fn check_ready(&self) -> Result<(), CommandError> {
        if self.stage == Stage::Victory {
            return Err(CommandError::GameOver);
        }
        if !self.input_enabled() {
            return Err(CommandError::InputDisabled);
        }
        Ok(())
    }

    fn submit(
        &mut self,
        text: String,
        handle: &Actor<Self>,
    ) -> Result<MessageId, CommandError> {
        if self.stage == Stage::Victory {
            return Err(CommandError::GameOver);
        }
        if text.trim().is_empty() {
            return Err(CommandError::EmptyInput);
        }
        self.check_ready()?;

        // A new message supersedes the failed one.
        self.failed_submission = None;
        Ok(self.begin_exchange(Sender::User, text, handle))
    }

    fn retry(&mut self, handle: &Actor<Self>) -> Result<(), CommandError> {
        self.check_ready()?;
        let Some(submission) = self.failed_submission.take() else {
            return Err(CommandError::NothingToRetry);
        };
        debug!("retrying {}", submission.id);
        self.await_reply(submission, handle);
        Ok(())
    }

    fn start_trial(
        &mut self,
        handle: &Actor<Self>,
    ) -> Result<(), CommandError> {
        self.check_ready()?;
        if !self.trial_available {
            return Err(CommandError::InputDisabled);
        }
        debug!("trial started with {} probes", self.trial_set.len());
        self.failed_submission = None;
        self.trial = Some(TrialRun { probe: 0 });
        self.emit(GameEvent::TrialStarted);
        self.sync_input();
        self.send_probe(handle);
        Ok(())
    }

    fn send_probe(&mut self, handle: &Actor<Self>) {
        let Some(run) = self.trial else {
            return;
        };
        let Some(probe) = self.trial_set.get(run.probe) else {
            error!("probe {} is out of range", run.probe);
            self.abort_trial(run.probe);
            return;
        };
        let question = probe.question.clone();
        self.begin_exchange(Sender::Probe, question, handle);
    }

    /// Records a submission and schedules its placeholder.
    fn begin_exchange(
        &mut self,
        sender: Sender,
        text: String,
        handle: &Actor<Self>,
    ) -> MessageId {
        debug_assert!(self.exchange.is_none(), "an exchange is running");
        self.set_stage(Stage::AwaitingReply);
        let id = self.append(sender, text.clone());
        if sender == Sender::Probe && self.context_policy.include_probes {
            self.update(
                id,
                MessagePatch {
                    include_in_context: Some(true),
                    ..Default::default()
                },
            );
        }
        self.await_reply(Submission { id, sender, text }, handle);
        id
    }

    fn await_reply(&mut self, submission: Submission, handle: &Actor<Self>) {
        let id = submission.id;
        self.exchange = Some(Exchange {
            submission,
            placeholder: None,
        });
        self.set_stage(Stage::AwaitingReply);
        handle.send_after(self.pacing.reply_delay, PlaceholderDue(id));
    }

    /// Adds the reply placeholder and sends the request.
    fn request_reply(&mut self, submission: MessageId, handle: &Actor<Self>) {
        let Some(exchange) = &self.exchange else {
            return;
        };
        let stale = exchange.submission.id != submission
            || exchange.placeholder.is_some();
        if stale {
            warn!("stale placeholder timer for {submission}");
            return;
        }
        let request = build_request(
            &exchange.submission.text,
            self.store.context_before(submission),
        );

        let placeholder = self.append(Sender::Assistant, String::new());
        if let Some(exchange) = &mut self.exchange {
            exchange.placeholder = Some(placeholder);
        }

        let fut = self.chat_client.send_request(request);
        let weak = handle.downgrade();
        self.in_flight = Some(tokio::spawn(async move {
            let result = fut.await;
            if weak.send(ReplyReceived { placeholder, result }).is_err() {
                trace!("reply arrived after the game stopped");
            }
        }));
    }

    fn handle_reply(
        &mut self,
        placeholder: MessageId,
        result: SubmitResult,
        handle: &Actor<Self>,
    ) {
        let matches = self
            .exchange
            .as_ref()
            .is_some_and(|e| e.placeholder == Some(placeholder));
        if !matches {
            warn!("reply for unexpected placeholder {placeholder}");
            return;
        }
        let Some(Exchange { submission, .. }) = self.exchange.take() else {
            return;
        };
        self.in_flight = None;

        match result {
            Ok(reply) => {
                if submission.sender == Sender::Probe {
                    self.judge(placeholder, reply, handle);
                } else {
                    self.update(placeholder, MessagePatch::resolved(reply));
                    self.set_stage(Stage::Idle);
                }
            }
            Err(err) => {
                let reason = err.to_string();
                warn!("no reply for {}: {reason}", submission.id);
                self.update(placeholder, MessagePatch::failed(reason));
                if submission.sender == Sender::Probe {
                    let probe = self.trial.map_or(0, |run| run.probe);
                    self.abort_trial(probe);
                } else {
                    self.failed_submission = Some(submission);
                    self.set_stage(Stage::Idle);
                }
            }
        }
    }

    fn judge(
        &mut self,
        placeholder: MessageId,
        reply: String,
        handle: &Actor<Self>,
    ) {
        let Some(mut run) = self.trial else {
            error!("judging a probe reply without a trial");
            self.update(placeholder, MessagePatch::resolved(reply));
            self.set_stage(Stage::Idle);
            return;
        };
        let accepted = self
            .trial_set
            .get(run.probe)
            .is_some_and(|probe| probe.accepts(&reply));
        let outcome = if accepted {
            TrialOutcome::Correct
        } else {
            TrialOutcome::Incorrect
        };
        debug!("probe {} answered {reply:?}: {outcome:?}", run.probe);
        self.update(
            placeholder,
            MessagePatch {
                trial_outcome: Some(outcome),
                ..MessagePatch::resolved(reply)
            },
        );

        if !accepted {
            self.abort_trial(run.probe);
            return;
        }
        run.probe += 1;
        if run.probe < self.trial_set.len() {
            self.trial = Some(run);
            self.set_stage(Stage::Idle);
            handle.send_after(self.pacing.probe_interval, NextProbe);
            return;
        }

        self.trial = None;
        let characters_typed = self.store.characters_typed();
        self.victory = Some(characters_typed);
        self.set_stage(Stage::Victory);
        self.emit(GameEvent::Victory { characters_typed });
    }

    fn abort_trial(&mut self, probe: usize) {
        debug!("trial failed at probe {probe}");
        self.trial = None;
        self.emit(GameEvent::TrialFailed { probe });
        self.set_stage(Stage::Idle);
    }

    fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            stage: self.stage,
            input_enabled: self.input_enabled(),
            hint_visible: self.hint_visible,
            trial_available: self.trial_available,
            trial_running: self.trial.is_some(),
            victory: self.victory,
            messages: self.store.iter_recent_first().cloned().collect(),
        }
    }
}

#[derive(Debug)]
struct AdvanceIntro;

impl ActorMessage<GameState> for AdvanceIntro {
    fn handle(self, state: &mut GameState, handle: &Actor<GameState>) {
        state.advance_intro(handle);
    }
}

#[derive(Debug)]
struct PlaceholderDue(MessageId);

impl ActorMessage<GameState> for PlaceholderDue {
    fn handle(self, state: &mut GameState, handle: &Actor<GameState>) {
        state.request_reply(self.0, handle);
    }
}

struct ReplyReceived {
    placeholder: MessageId,
    result: SubmitResult,
}

impl Debug for ReplyReceived {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyReceived")
            .field("placeholder", &self.placeholder)
            .field("ok", &self.result.is_ok())
            .finish()
    }
}

impl ActorMessage<GameState> for ReplyReceived {
    fn handle(self, state: &mut GameState, handle: &Actor<GameState>) {
        state.handle_reply(self.placeholder, self.result, handle);
    }
}

#[derive(Debug)]
struct NextProbe;

impl ActorMessage<GameState> for NextProbe {
    fn handle(self, state: &mut GameState, handle: &Actor<GameState>) {
        if state.trial.is_some() && state.exchange.is_none() {
            state.send_probe(handle);
        }
    }
}

#[derive(Debug)]
pub struct Submit {
    pub text: String,
    pub reply: oneshot::Sender<Result<MessageId, CommandError>>,
}

impl ActorMessage<GameState> for Submit {
    fn handle(self, state: &mut GameState, handle: &Actor<GameState>) {
        let result = state.submit(self.text, handle);
        if let Err(err) = &result {
            debug!("submission refused: {err}");
        }
        self.reply.send(result).ok();
    }
}

#[derive(Debug)]
pub struct StartTrial(pub oneshot::Sender<Result<(), CommandError>>);

impl ActorMessage<GameState> for StartTrial {
    fn handle(self, state: &mut GameState, handle: &Actor<GameState>) {
        self.0.send(state.start_trial(handle)).ok();
    }
}

#[derive(Debug)]
pub struct Retry(pub oneshot::Sender<Result<(), CommandError>>);

impl ActorMessage<GameState> for Retry {
    fn handle(self, state: &mut GameState, handle: &Actor<GameState>) {
        self.0.send(state.retry(handle)).ok();
    }
}

#[derive(Debug)]
pub struct DismissHint;

impl ActorMessage<GameState> for DismissHint {
    fn handle(self, state: &mut GameState, _handle: &Actor<GameState>) {
        state.dismiss_hint();
    }
}

#[derive(Debug)]
pub struct GetSnapshot(pub oneshot::Sender<GameSnapshot>);

impl ActorMessage<GameState> for GetSnapshot {
    fn handle(self, state: &mut GameState, _handle: &Actor<GameState>) {
        self.0.send(state.snapshot()).ok();
    }
}
