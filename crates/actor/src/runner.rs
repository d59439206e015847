use std::sync::Weak;

use tokio::select;
use tokio::sync::{mpsc, watch};

use crate::Actor;
use crate::mailbox::{Letter, Mailbox};

/// Drives an actor until it is killed or every strong handle is gone.
///
/// The state is dropped when this function returns, so anything the state
/// owns (in-flight tasks, callbacks) is released with it.
pub(crate) async fn run_actor<S: Send + 'static>(
    mailbox: Weak<Mailbox<S>>,
    mut state: S,
    mut letter_rx: mpsc::UnboundedReceiver<Letter<S>>,
    mut kill_rx: watch::Receiver<bool>,
) {
    debug!("started");
    loop {
        let letter = select! {
            biased;

            killed = kill_rx.wait_for(|killed| *killed) => {
                if killed.is_ok() {
                    debug!("killed");
                } else {
                    debug!("all handles have been dropped");
                }
                break;
            }
            letter = letter_rx.recv() => {
                let Some(letter) = letter else {
                    break;
                };
                letter
            }
        };
        trace!("received: {letter:?}");

        let Some(mailbox) = mailbox.upgrade() else {
            debug!("all handles have been dropped, discard {letter:?}");
            break;
        };
        trace_span!("handle").in_scope(|| {
            letter.open(&mut state, &Actor::from_mailbox(mailbox));
        });
    }
    drop(state);
    debug!("stopped");
}
