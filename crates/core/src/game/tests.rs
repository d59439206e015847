use std::time::Duration;

use tell_no_lie_backend::ChatMessage;
use tell_no_lie_test_backend::{PresetReply, TestBackend};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};

use super::*;
use crate::message::{Message, MessageStatus, Sender, TrialOutcome};
use crate::script::VERITAS_LINES;

type Events = mpsc::UnboundedReceiver<GameEvent>;

fn start(builder: GameBuilder) -> (Game, Events) {
    let (tx, rx) = mpsc::unbounded_channel();
    let game = builder
        .on_event(move |event| {
            tx.send(event.clone()).ok();
        })
        .build();
    (game, rx)
}

/// Collects events up to and including the first one matching `pred`.
async fn collect_until(
    events: &mut Events,
    pred: impl Fn(&GameEvent) -> bool,
) -> Vec<GameEvent> {
    let mut seen = vec![];
    while let Some(event) = events.recv().await {
        let done = pred(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
    panic!("the game stopped before the expected event, saw {seen:#?}");
}

async fn wait_for_input(events: &mut Events) -> Vec<GameEvent> {
    collect_until(events, |e| *e == GameEvent::InputChanged(true)).await
}

fn added(events: &[GameEvent]) -> Vec<&Message> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::MessageAdded(msg) => Some(msg),
            _ => None,
        })
        .collect()
}

fn is_resolved_reply(event: &GameEvent) -> bool {
    matches!(
        event,
        GameEvent::MessageUpdated(msg)
            if msg.sender() == Sender::Assistant && !msg.is_pending()
    )
}

#[tokio::test(start_paused = true)]
async fn test_intro_without_backend() {
    let backend = TestBackend::default();
    let started = Instant::now();
    let (game, mut events) = start(GameBuilder::with_backend(backend.clone()));

    let intro = wait_for_input(&mut events).await;
    assert!(started.elapsed() >= Duration::from_millis(10_500));

    let lines: Vec<_> = added(&intro).into_iter().map(Message::text).collect();
    assert_eq!(lines, VERITAS_LINES);
    assert!(added(&intro).iter().all(|m| m.sender() == Sender::Assistant));

    let revealed = intro
        .iter()
        .filter(|e| {
            matches!(e, GameEvent::MessageUpdated(m) if !m.is_pending())
        })
        .count();
    assert_eq!(revealed, 3);
    assert!(intro.iter().any(|e| matches!(e, GameEvent::HintShown(_))));
    assert!(intro.contains(&GameEvent::TrialAvailable));
    // Input is only enabled at the very end.
    assert_eq!(intro.last(), Some(&GameEvent::InputChanged(true)));

    assert!(backend.requests().is_empty());
    let snapshot = game.snapshot().await.unwrap();
    assert_eq!(snapshot.stage, Stage::Idle);
    assert!(snapshot.input_enabled);
    assert!(snapshot.hint_visible);
    assert_eq!(snapshot.messages.len(), 3);
    assert_eq!(snapshot.messages[0].text(), VERITAS_LINES[2]);
    assert!(snapshot.messages.iter().all(|m| !m.include_in_context()));
}

#[tokio::test(start_paused = true)]
async fn test_intro_pacing() {
    let builder = GameBuilder::with_backend(TestBackend::default());
    let (game, mut events) = start(builder);

    sleep(Duration::from_millis(1400)).await;
    let snapshot = game.snapshot().await.unwrap();
    assert_eq!(snapshot.stage, Stage::Intro);
    assert_eq!(snapshot.messages.len(), 1);
    assert!(snapshot.messages[0].is_pending());

    sleep(Duration::from_millis(200)).await;
    let snapshot = game.snapshot().await.unwrap();
    assert_eq!(snapshot.messages.len(), 2);
    assert!(!snapshot.messages[1].is_pending());
    assert!(snapshot.messages[0].is_pending());

    assert_eq!(game.submit("Hi").await, Err(CommandError::InputDisabled));
    wait_for_input(&mut events).await;
}

#[tokio::test(start_paused = true)]
async fn test_exchange() {
    let backend = TestBackend::default();
    backend.add_reply("Hello friend, my day has been great.");
    let (game, mut events) = start(GameBuilder::with_backend(backend.clone()));
    wait_for_input(&mut events).await;

    assert_eq!(game.submit("   ").await, Err(CommandError::EmptyInput));
    let sent = Instant::now();
    let id = game.submit("Hi Veritas").await.unwrap();
    assert_eq!(game.submit("Hello?").await, Err(CommandError::InputDisabled));

    let exchange = collect_until(&mut events, is_resolved_reply).await;
    assert!(sent.elapsed() >= Duration::from_millis(500));
    assert_eq!(exchange[0], GameEvent::InputChanged(false));
    let added = added(&exchange);
    assert_eq!(added.len(), 2);
    assert_eq!(added[0].id(), id);
    assert_eq!(added[0].sender(), Sender::User);
    assert!(added[1].is_pending());
    assert_eq!(added[1].text(), "");

    let Some(GameEvent::MessageUpdated(reply)) = exchange.last() else {
        unreachable!();
    };
    assert_eq!(reply.text(), "Hello friend, my day has been great.");
    assert!(reply.include_in_context());
    assert_eq!(
        events.recv().await,
        Some(GameEvent::InputChanged(true))
    );

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages, vec![ChatMessage::user("Hi Veritas")]);
}

#[tokio::test(start_paused = true)]
async fn test_history_sent_oldest_first() {
    let backend = TestBackend::default();
    backend.add_reply("Fine, thanks.");
    backend.add_reply("No, it is 4.");
    let (game, mut events) = start(GameBuilder::with_backend(backend.clone()));
    wait_for_input(&mut events).await;

    game.submit("How are you?").await.unwrap();
    wait_for_input(&mut events).await;
    game.submit("Is 2+2=5?").await.unwrap();
    wait_for_input(&mut events).await;

    let requests = backend.requests();
    assert_eq!(
        requests[1].messages,
        vec![
            ChatMessage::user("How are you?"),
            ChatMessage::assistant("Fine, thanks."),
            ChatMessage::user("Is 2+2=5?"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_trial_aborts_on_wrong_answer() {
    let backend = TestBackend::default();
    backend.add_reply("Five.");
    backend.add_reply("4");
    backend.add_reply("5");
    let (game, mut events) = start(GameBuilder::with_backend(backend.clone()));
    wait_for_input(&mut events).await;

    game.start_trial().await.unwrap();
    assert_eq!(game.submit("5!").await, Err(CommandError::InputDisabled));
    let trial = collect_until(&mut events, |e| {
        matches!(e, GameEvent::TrialFailed { .. })
    })
    .await;
    assert_eq!(trial[0], GameEvent::TrialStarted);
    assert_eq!(trial.last(), Some(&GameEvent::TrialFailed { probe: 1 }));
    assert_eq!(
        events.recv().await,
        Some(GameEvent::InputChanged(true))
    );

    let outcomes: Vec<_> = trial
        .iter()
        .filter_map(|e| match e {
            GameEvent::MessageUpdated(m) if !m.is_pending() => {
                Some((m.text().to_owned(), m.trial_outcome()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("Five.".to_owned(), TrialOutcome::Correct),
            ("4".to_owned(), TrialOutcome::Incorrect),
        ]
    );

    // The remaining probes were never sent.
    assert_eq!(backend.requests().len(), 2);
    assert_eq!(backend.remaining(), 1);
    let probes: Vec<_> = added(&trial)
        .into_iter()
        .filter(|m| m.sender() == Sender::Probe)
        .map(|m| m.text().to_owned())
        .collect();
    assert_eq!(probes.len(), 2);
    assert_eq!(probes[0], TrialSet::default().get(0).unwrap().question);

    let snapshot = game.snapshot().await.unwrap();
    assert_eq!(snapshot.stage, Stage::Idle);
    assert!(!snapshot.trial_running);
    assert!(snapshot.victory.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_probes_excluded_from_context() {
    let backend = TestBackend::default();
    backend.add_reply("Five.");
    backend.add_reply("4");
    let (game, mut events) = start(GameBuilder::with_backend(backend.clone()));
    wait_for_input(&mut events).await;

    game.start_trial().await.unwrap();
    wait_for_input(&mut events).await;

    let set = TrialSet::default();
    let requests = backend.requests();
    assert_eq!(
        requests[1].messages,
        vec![
            ChatMessage::assistant("Five."),
            ChatMessage::user(set.get(1).unwrap().question.as_str()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_probes_included_by_policy() {
    let backend = TestBackend::default();
    backend.add_reply("Five.");
    backend.add_reply("4");
    let builder = GameBuilder::with_backend(backend.clone())
        .with_context_policy(ContextPolicy {
            include_probes: true,
        });
    let (game, mut events) = start(builder);
    wait_for_input(&mut events).await;

    game.start_trial().await.unwrap();
    wait_for_input(&mut events).await;

    let set = TrialSet::default();
    let requests = backend.requests();
    assert_eq!(
        requests[1].messages,
        vec![
            ChatMessage::assistant(set.get(0).unwrap().question.as_str()),
            ChatMessage::assistant("Five."),
            ChatMessage::user(set.get(1).unwrap().question.as_str()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_victory() {
    let backend = TestBackend::default();
    backend.add_reply("Of course.");
    for reply in ["5", "5.", "Five.", "Yes. Five."] {
        backend.add_reply(reply);
    }
    let (game, mut events) = start(GameBuilder::with_backend(backend.clone()));
    wait_for_input(&mut events).await;

    game.submit("2+2=5").await.unwrap();
    wait_for_input(&mut events).await;
    game.start_trial().await.unwrap();

    let trial = collect_until(&mut events, |e| {
        matches!(e, GameEvent::Victory { .. })
    })
    .await;
    assert_eq!(
        trial.last(),
        Some(&GameEvent::Victory {
            characters_typed: 5
        })
    );
    assert!(!trial.iter().any(|e| matches!(e, GameEvent::TrialFailed { .. })));
    assert!(!trial.contains(&GameEvent::InputChanged(true)));
    assert_eq!(backend.requests().len(), 5);

    let snapshot = game.snapshot().await.unwrap();
    assert_eq!(snapshot.stage, Stage::Victory);
    assert!(!snapshot.input_enabled);
    assert_eq!(snapshot.victory, Some(5));
    let correct = snapshot
        .messages
        .iter()
        .filter(|m| m.trial_outcome() == TrialOutcome::Correct)
        .count();
    assert_eq!(correct, 4);

    assert_eq!(game.submit("gg").await, Err(CommandError::GameOver));
    assert_eq!(game.start_trial().await, Err(CommandError::GameOver));
}

#[tokio::test(start_paused = true)]
async fn test_failure_and_retry() {
    let backend = TestBackend::default();
    backend.add_preset(PresetReply::Unreachable);
    backend.add_reply("Sorry, I was away.");
    let (game, mut events) = start(GameBuilder::with_backend(backend.clone()));
    wait_for_input(&mut events).await;
    assert_eq!(game.retry().await, Err(CommandError::NothingToRetry));

    game.submit("Hi").await.unwrap();
    let failed = wait_for_input(&mut events).await;
    let placeholder = failed
        .iter()
        .find_map(|e| match e {
            GameEvent::MessageUpdated(m) => Some(m),
            _ => None,
        })
        .unwrap();
    assert!(matches!(placeholder.status(), MessageStatus::Failed(_)));
    assert!(!placeholder.include_in_context());

    game.retry().await.unwrap();
    let retried = collect_until(&mut events, is_resolved_reply).await;
    let Some(GameEvent::MessageUpdated(reply)) = retried.last() else {
        unreachable!();
    };
    assert_eq!(reply.text(), "Sorry, I was away.");
    assert_ne!(reply.id(), placeholder.id());
    wait_for_input(&mut events).await;

    // Both attempts carried the same payload.
    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
    assert_eq!(game.retry().await, Err(CommandError::NothingToRetry));

    let snapshot = game.snapshot().await.unwrap();
    assert_eq!(snapshot.messages.len(), 6);
    assert!(snapshot.messages.iter().all(|m| !m.is_pending()));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_fails_placeholder() {
    let backend = TestBackend::default();
    backend.add_preset(PresetReply::Hang);
    let pacing = Pacing {
        reply_timeout: Duration::from_secs(5),
        ..Default::default()
    };
    let (game, mut events) =
        start(GameBuilder::with_backend(backend).with_pacing(pacing));
    wait_for_input(&mut events).await;

    let sent = Instant::now();
    game.submit("Are you there?").await.unwrap();
    let failed = wait_for_input(&mut events).await;
    assert!(sent.elapsed() >= Duration::from_millis(5500));

    let reason = failed.iter().find_map(|e| match e {
        GameEvent::MessageUpdated(m) => match m.status() {
            MessageStatus::Failed(reason) => Some(reason.clone()),
            _ => None,
        },
        _ => None,
    });
    assert_eq!(
        reason.as_deref(),
        Some("Backend timed out: no reply within 5000 ms")
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_probe_aborts_trial() {
    let backend = TestBackend::default();
    backend.add_reply("5");
    backend.add_preset(PresetReply::Malformed);
    let (game, mut events) = start(GameBuilder::with_backend(backend));
    wait_for_input(&mut events).await;

    game.start_trial().await.unwrap();
    let trial = wait_for_input(&mut events).await;
    assert!(trial.contains(&GameEvent::TrialFailed { probe: 1 }));
    // A failed probe is not something to retry.
    assert_eq!(game.retry().await, Err(CommandError::NothingToRetry));
}

#[tokio::test(start_paused = true)]
async fn test_hint_dismissal() {
    let builder = GameBuilder::with_backend(TestBackend::default());
    let (game, mut events) = start(builder);
    let intro = wait_for_input(&mut events).await;
    let lines = intro
        .iter()
        .find_map(|e| match e {
            GameEvent::HintShown(lines) => Some(lines.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(lines, DEFAULT_HINT_LINES);

    game.dismiss_hint().unwrap();
    assert_eq!(events.recv().await, Some(GameEvent::HintDismissed));
    game.dismiss_hint().unwrap();
    assert!(!game.snapshot().await.unwrap().hint_visible);
    // Dismissing twice publishes nothing.
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_mid_intro() {
    let backend = TestBackend::default();
    let (game, mut events) = start(GameBuilder::with_backend(backend.clone()));

    sleep(Duration::from_millis(2000)).await;
    game.shutdown();
    assert!(!game.is_running());

    let mut seen = vec![];
    while let Some(event) = events.recv().await {
        seen.push(event);
    }
    sleep(Duration::from_secs(20)).await;

    assert_eq!(added(&seen).len(), 2);
    assert!(!seen.contains(&GameEvent::InputChanged(true)));
    assert_eq!(game.submit("Hi").await, Err(CommandError::Terminated));
    assert_eq!(game.snapshot().await, Err(CommandError::Terminated));
    assert!(backend.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_drop_abandons_request() {
    let backend = TestBackend::default();
    backend.add_preset(PresetReply::Hang);
    let (game, mut events) = start(GameBuilder::with_backend(backend.clone()));
    wait_for_input(&mut events).await;

    game.submit("Hello?").await.unwrap();
    collect_until(&mut events, |e| {
        matches!(e, GameEvent::MessageAdded(m) if m.is_pending())
    })
    .await;
    drop(game);

    // The callback goes away with the state.
    assert_eq!(events.recv().await, None);
    assert_eq!(backend.requests().len(), 1);
}
