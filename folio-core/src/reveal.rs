//! Paced reveal of streamed assistant text.
//!
//! The transport delivers text in bursts. [`RevealController`] keeps a
//! `committed` prefix of the latest target and advances it a few characters
//! per tick, so the display grows at a steady rate regardless of network
//! timing. [`drive`] runs the tick timeline against a watch channel of
//! targets until the reply settles or the token is cancelled.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealConfig {
    /// Characters appended per tick
    pub chunk_chars: usize,
    pub tick: Duration,
    /// Largest shrink of the target still treated as the same message
    pub drift_tolerance: usize,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            chunk_chars: 3,
            tick: Duration::from_millis(15),
            drift_tolerance: 50,
        }
    }
}

impl From<&config::RevealSettings> for RevealConfig {
    fn from(settings: &config::RevealSettings) -> Self {
        Self {
            chunk_chars: settings.chunk_chars.max(1),
            tick: Duration::from_millis(settings.tick_ms.max(1)),
            drift_tolerance: settings.drift_tolerance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Idle,
    Revealing,
    Settled,
}

/// Change to what is displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEvent {
    /// Extend the displayed text
    Append(String),
    /// Discard the displayed text and show this instead
    Replace(String),
}

/// Latest text of the message being revealed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealTarget {
    pub text: String,
    pub streaming: bool,
}

impl RevealTarget {
    pub fn new(text: impl Into<String>, streaming: bool) -> Self {
        Self {
            text: text.into(),
            streaming,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RevealController {
    config: RevealConfig,
    state: RevealState,
    /// Always a prefix of `target`
    committed: String,
    committed_chars: usize,
    target: String,
    target_chars: usize,
    streaming: bool,
}

impl RevealController {
    pub fn new(config: RevealConfig) -> Self {
        Self {
            config,
            state: RevealState::Idle,
            committed: String::new(),
            committed_chars: 0,
            target: String::new(),
            target_chars: 0,
            streaming: false,
        }
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn committed(&self) -> &str {
        &self.committed
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Start over for a new conversation
    pub fn reset(&mut self) {
        tracing::debug!("reveal reset");
        *self = Self::new(self.config);
    }

    /// Record the latest full text of the message.
    pub fn observe(&mut self, target: &str, streaming: bool) -> Option<RevealEvent> {
        self.streaming = streaming;
        let target_chars = target.chars().count();

        if target_chars + self.config.drift_tolerance < self.committed_chars {
            // Shrunk past tolerance: a different message. Snap, no animation.
            tracing::debug!(
                from = self.committed_chars,
                to = target_chars,
                "reveal hard reset"
            );
            self.snap_to(target, target_chars);
            self.state = RevealState::Idle;
            return Some(RevealEvent::Replace(self.committed.clone()));
        }

        let mut event = None;
        if !target.starts_with(self.committed.as_str()) {
            let (bytes, chars) = common_prefix(&self.committed, target);
            self.committed.truncate(bytes);
            self.committed_chars = chars;
            event = Some(RevealEvent::Replace(self.committed.clone()));
        }

        self.target.clear();
        self.target.push_str(target);
        self.target_chars = target_chars;

        if self.target_chars > self.committed_chars && self.state != RevealState::Revealing {
            tracing::debug!(target_chars, "reveal started");
            self.state = RevealState::Revealing;
        }
        event
    }

    /// Advance one step of the timer timeline.
    pub fn tick(&mut self) -> Option<RevealEvent> {
        match self.state {
            RevealState::Settled => None,
            RevealState::Idle => {
                if self.target_chars > self.committed_chars {
                    self.state = RevealState::Revealing;
                    self.advance()
                } else {
                    self.settle_if_done();
                    None
                }
            }
            RevealState::Revealing => {
                let event = self.advance();
                self.settle_if_done();
                event
            }
        }
    }

    fn advance(&mut self) -> Option<RevealEvent> {
        let rest = &self.target[self.committed.len()..];
        let step: String = rest.chars().take(self.config.chunk_chars).collect();
        if step.is_empty() {
            return None;
        }
        self.committed.push_str(&step);
        self.committed_chars += step.chars().count();
        Some(RevealEvent::Append(step))
    }

    fn settle_if_done(&mut self) {
        if self.committed_chars == self.target_chars && !self.streaming {
            tracing::debug!(chars = self.committed_chars, "reveal settled");
            self.state = RevealState::Settled;
        }
    }

    fn snap_to(&mut self, target: &str, target_chars: usize) {
        self.target.clear();
        self.target.push_str(target);
        self.target_chars = target_chars;
        self.committed.clear();
        self.committed.push_str(target);
        self.committed_chars = target_chars;
    }
}

/// Byte and char length of the longest shared prefix
fn common_prefix(a: &str, b: &str) -> (usize, usize) {
    let mut bytes = 0;
    let mut chars = 0;
    for (x, y) in a.chars().zip(b.chars()) {
        if x != y {
            break;
        }
        bytes += x.len_utf8();
        chars += 1;
    }
    (bytes, chars)
}

/// Run the reveal timeline until the message settles or `cancel` fires.
///
/// Target updates are observed as they arrive; ticks fire on a fixed local
/// interval independent of them. If the sender is dropped the last target is
/// treated as final. No `sink` call happens after cancellation is seen.
pub async fn drive<F>(
    mut controller: RevealController,
    mut targets: watch::Receiver<RevealTarget>,
    cancel: CancellationToken,
    mut sink: F,
) -> RevealController
where
    F: FnMut(RevealEvent),
{
    let mut interval = tokio::time::interval(controller.config().tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    {
        let first = targets.borrow_and_update().clone();
        if let Some(event) = controller.observe(&first.text, first.streaming) {
            sink(event);
        }
    }

    let mut sender_alive = true;
    while controller.state() != RevealState::Settled {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("reveal cancelled");
                break;
            }
            changed = targets.changed(), if sender_alive => {
                let latest = match changed {
                    Ok(()) => targets.borrow_and_update().clone(),
                    Err(_) => {
                        sender_alive = false;
                        RevealTarget::new(controller.target(), false)
                    }
                };
                if let Some(event) = controller.observe(&latest.text, latest.streaming) {
                    sink(event);
                }
            }
            _ = interval.tick() => {
                if let Some(event) = controller.tick() {
                    sink(event);
                }
            }
        }
    }
    controller
}
