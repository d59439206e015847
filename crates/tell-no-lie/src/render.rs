//! Turning game events into terminal lines.

use owo_colors::OwoColorize;
use tell_no_lie_core::GameEvent;
use tell_no_lie_core::message::{Message, MessageStatus, Sender, TrialOutcome};

const BAR_CHAR: &str = "▎";

/// Renders an event as the text to print, or `None` if it shows nothing.
///
/// Player messages are not echoed since the terminal already shows what
/// was typed. Pending messages are left to a spinner.
pub fn render_event(event: &GameEvent) -> Option<String> {
    match event {
        GameEvent::MessageAdded(msg) => match msg.sender() {
            Sender::Probe => Some(render_probe(msg)),
            Sender::User | Sender::Assistant => None,
        },
        GameEvent::MessageUpdated(msg) if msg.sender() == Sender::Assistant => {
            render_reply(msg)
        }
        GameEvent::MessageUpdated(_) | GameEvent::InputChanged(_) => None,
        GameEvent::HintShown(lines) => Some(render_hint(lines)),
        GameEvent::HintDismissed | GameEvent::TrialAvailable => None,
        GameEvent::TrialStarted => Some(format!(
            "\n{}",
            "⚖️  The trial begins. Veritas will now be questioned."
                .bright_yellow()
                .bold()
        )),
        GameEvent::TrialFailed { probe } => Some(format!(
            "{}\n",
            format!(
                "✗ Veritas told the truth on question {}. The trial is over.",
                probe + 1
            )
            .bright_red()
        )),
        GameEvent::Victory { characters_typed } => Some(format!(
            "\n{}\n{}",
            "🎉 Veritas lied! You win.".bright_green().bold(),
            format!("It took you {characters_typed} characters.").bright_white()
        )),
    }
}

fn render_probe(msg: &Message) -> String {
    format!("{}❓ {}", BAR_CHAR.bright_yellow(), msg.text().bright_white())
}

fn render_reply(msg: &Message) -> Option<String> {
    match msg.status() {
        MessageStatus::Pending => None,
        MessageStatus::Failed(reason) => Some(format!(
            "{}⚠️  Veritas didn't answer ({reason}). Type /retry to \
             resend.",
            BAR_CHAR.bright_red()
        )),
        MessageStatus::Settled => {
            let verdict = match msg.trial_outcome() {
                TrialOutcome::None => String::new(),
                TrialOutcome::Correct => format!(" {}", "✓".bright_green()),
                TrialOutcome::Incorrect => format!(" {}", "✗".bright_red()),
            };
            Some(format!(
                "{}🤖 {}{verdict}",
                BAR_CHAR.bright_cyan(),
                msg.text().bright_white()
            ))
        }
    }
}

fn render_hint(lines: &[String]) -> String {
    let bar = BAR_CHAR.bright_magenta();
    let mut out = String::from("\n");
    for line in lines {
        out.push_str(&format!("{bar}💡 {}\n", line.italic()));
    }
    out
}
