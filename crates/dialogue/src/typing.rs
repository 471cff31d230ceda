//! Word-by-word reveal of assistant messages.
//!
//! Purely presentational, but the cancellation contract matters: when the
//! owning view unmounts, its token is cancelled and the effect task stops
//! emitting immediately, so nothing updates an unmounted view. When the
//! effect runs to completion, the final frame is exactly the full message
//! text.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Delay between revealed words.
pub const DEFAULT_WORD_DELAY: Duration = Duration::from_millis(40);

/// A cancellable typing-effect task.
pub struct TypingEffect;

impl TypingEffect {
    /// Spawn the effect for `text`, emitting cumulative prefixes.
    ///
    /// Each frame adds one word; the last frame is the verbatim full
    /// text. Cancelling `cancel` stops the task before its next frame.
    pub fn start(
        text: String,
        word_delay: Duration,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(run(text, word_delay, cancel, tx));
        rx
    }
}

async fn run(text: String, delay: Duration, cancel: CancellationToken, tx: mpsc::Sender<String>) {
    let mut shown = String::new();

    for (i, word) in text.split_whitespace().enumerate() {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::trace!("Typing effect cancelled");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        if i > 0 {
            shown.push(' ');
        }
        shown.push_str(word);

        if tx.send(shown.clone()).await.is_err() {
            return;
        }
    }

    // Word joining collapses runs of whitespace; the final frame must be
    // the exact original text regardless.
    if shown != text {
        let _ = tx.send(text).await;
    }
}
