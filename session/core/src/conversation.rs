//! Conversation Stream
//!
//! Owns the ordered, append-only message log and the simulated counterpart.
//!
//! Every accepted submission schedules exactly one deferred reply: a tokio
//! task that sleeps for the configured delay and then posts a completion onto
//! the stream's own channel. The stream only appends the reply when its owner
//! drains that channel with [`ConversationStream::poll_replies`], so all log
//! mutation happens on the owner's turn.
//!
//! Replies are independent of each other. Several quick submissions produce
//! several in-flight replies, applied in whatever order their timers complete.
//! Nothing serializes them.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::messages::{now_ms, MessageId, Sender};

/// Default reply shown by the simulated counterpart
pub const DEFAULT_REPLY_TEXT: &str = "This is a simulated response from the chatbot.";

/// Default delay before the simulated counterpart answers
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1000);

/// A message in the conversation log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID (list identity only)
    pub id: MessageId,
    /// Trimmed, non-empty content
    pub text: String,
    /// Who sent this message
    pub sender: Sender,
    /// When the message was created (Unix timestamp ms)
    pub timestamp_ms: u64,
}

impl Message {
    fn new(sender: Sender, text: String) -> Self {
        Self {
            id: MessageId::new(),
            text,
            sender,
            timestamp_ms: now_ms(),
        }
    }
}

/// Conversation configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationConfig {
    /// How long the counterpart "thinks" before replying
    pub reply_delay: Duration,
    /// Fixed reply content
    pub reply_text: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            reply_delay: DEFAULT_REPLY_DELAY,
            reply_text: DEFAULT_REPLY_TEXT.to_string(),
        }
    }
}

/// Identifies one scheduled reply
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ReplyTicket(u64);

/// The conversation log plus its deferred-reply simulation
///
/// Must be created and used inside a tokio runtime: [`submit`](Self::submit)
/// spawns the reply timer.
pub struct ConversationStream {
    config: ConversationConfig,
    /// Append-only log, insertion order = display order
    log: Vec<Message>,
    /// Draft input owned on behalf of the surface
    input: String,
    /// Reply timers that have not been applied yet
    pending: HashMap<ReplyTicket, JoinHandle<()>>,
    next_ticket: u64,
    due_tx: mpsc::UnboundedSender<ReplyTicket>,
    due_rx: mpsc::UnboundedReceiver<ReplyTicket>,
    torn_down: bool,
}

impl ConversationStream {
    /// Create an empty conversation
    pub fn new(config: ConversationConfig) -> Self {
        let (due_tx, due_rx) = mpsc::unbounded_channel();
        Self {
            config,
            log: Vec::new(),
            input: String::new(),
            pending: HashMap::new(),
            next_ticket: 0,
            due_tx,
            due_rx,
            torn_down: false,
        }
    }

    /// Read-only ordered view of the log
    pub fn messages(&self) -> &[Message] {
        &self.log
    }

    /// Current draft input
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the draft input
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Number of replies scheduled but not yet appended
    pub fn pending_replies(&self) -> usize {
        self.pending.len()
    }

    /// Whether [`teardown`](Self::teardown) has run
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Submit a local message
    ///
    /// Returns `None` without touching the log when `text` is blank or the
    /// stream has been torn down. Otherwise appends the trimmed text, clears
    /// the draft input and schedules one deferred reply.
    pub fn submit(&mut self, text: &str) -> Option<&Message> {
        if self.torn_down {
            tracing::debug!("Ignoring submit on torn-down conversation");
            return None;
        }

        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.log.push(Message::new(Sender::Local, text.to_string()));
        self.input.clear();
        self.schedule_reply();
        self.log.last()
    }

    /// Submit the current draft input
    pub fn submit_input(&mut self) -> Option<&Message> {
        let text = std::mem::take(&mut self.input);
        let accepted = self.submit(&text).is_some();
        if !accepted {
            // Rejected input stays where the user left it
            self.input = text;
            return None;
        }
        self.log.last()
    }

    /// Apply every reply whose timer has fired
    ///
    /// Returns the messages appended by this call, oldest first.
    pub fn poll_replies(&mut self) -> Vec<Message> {
        let mut appended = Vec::new();
        if self.torn_down {
            return appended;
        }

        while let Ok(ticket) = self.due_rx.try_recv() {
            if self.pending.remove(&ticket).is_none() {
                continue;
            }
            let reply = Message::new(Sender::Remote, self.config.reply_text.clone());
            tracing::debug!(message_id = %reply.id, "Simulated reply arrived");
            self.log.push(reply.clone());
            appended.push(reply);
        }

        appended
    }

    /// Discard every pending reply and refuse further submissions
    ///
    /// Idempotent. The log itself is left as-is and goes away with the stream.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        let cancelled = self.pending.len();
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
        self.due_rx.close();
        while self.due_rx.try_recv().is_ok() {}

        tracing::debug!(
            cancelled_replies = cancelled,
            messages = self.log.len(),
            "Conversation torn down"
        );
    }

    fn schedule_reply(&mut self) {
        let ticket = ReplyTicket(self.next_ticket);
        self.next_ticket += 1;

        let tx = self.due_tx.clone();
        let delay = self.config.reply_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver is gone once the stream is torn down
            let _ = tx.send(ticket);
        });
        self.pending.insert(ticket, handle);
    }
}

impl Drop for ConversationStream {
    fn drop(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}
