//! Play the game in the terminal.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tell_no_lie::core::GameEvent;
use tell_no_lie::render::render_event;
use tell_no_lie::{COMMAND_HELP, Command, Outcome, SessionBuilder, Settings};
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let session = SessionBuilder::with_settings(&settings)
        .on_event(move |event| {
            event_tx.send(event.clone()).ok();
        })
        .build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    println!("{}", COMMAND_HELP.dimmed());
    let mut input_enabled = false;

    'outer: loop {
        let mut progress_bar = None;

        // Play out events until the game hands control back to the player.
        loop {
            let event = if input_enabled {
                match event_rx.try_recv() {
                    Ok(event) => event,
                    Err(_) => break,
                }
            } else {
                // Create a new progress bar if it has been finished.
                progress_bar
                    .get_or_insert_with(|| {
                        let progress_bar = ProgressBar::new_spinner();
                        progress_bar.set_style(progress_style.clone());
                        progress_bar.set_message("Veritas is typing...");
                        progress_bar
                    })
                    .inc(1);

                let sleep = sleep(Duration::from_millis(100));
                select! {
                    event = event_rx.recv() => {
                        let Some(event) = event else {
                            break 'outer;
                        };
                        event
                    },
                    _ = sleep => {
                        continue;
                    }
                }
            };

            if let GameEvent::InputChanged(enabled) = event {
                input_enabled = enabled;
            }
            let Some(text) = render_event(&event) else {
                continue;
            };

            // Finish the progress bar before printing anything else.
            if let Some(progress_bar) = progress_bar.take() {
                progress_bar.finish_and_clear();
            }
            println!("{text}");

            if matches!(event, GameEvent::Victory { .. }) {
                break 'outer;
            }
        }
        if let Some(progress_bar) = progress_bar.take() {
            progress_bar.finish_and_clear();
        }

        print!("> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };
        match session.execute(Command::parse(&line)).await {
            Outcome::Accepted => {}
            Outcome::Refused(err) => {
                println!("{}", err.to_string().bright_yellow());
            }
            Outcome::Unknown(cmd) => {
                let line = format!("unknown command {cmd}");
                println!("{}", line.bright_yellow());
                println!("{}", COMMAND_HELP.dimmed());
            }
            Outcome::Quit => break,
        }
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
