//! Wire protocol between the gesture worker and the host addon
//!
//! Both directions carry newline-delimited JSON objects tagged by `type`:
//!
//! ```text
//! worker -> host  {"type":"gesture","gesture":"nod_right","action_type":"head"}
//! host -> worker  {"type":"command","command":"recalibrate"}
//! ```
//!
//! Hold events additionally carry `"phase"`; a fired gesture omits it so
//! plain nod/fist/swipe messages keep the shape the host already parses.

use serde::{Deserialize, Serialize};

use crate::analysis::{GestureEvent, GestureKind, GesturePhase};

/// Which detector produced a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureSource {
    Head,
    Hand,
}

impl GestureSource {
    pub fn of(kind: GestureKind) -> Self {
        if kind.is_head() {
            GestureSource::Head
        } else {
            GestureSource::Hand
        }
    }
}

/// Control requests sent by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlCommand {
    /// Recenter the neutral pose on the next sample
    Recalibrate,
    /// Flip the tracking gate
    Toggle,
}

/// One protocol message
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    Gesture {
        gesture: GestureKind,
        action_type: GestureSource,
        #[serde(default, skip_serializing_if = "is_fired")]
        phase: GesturePhase,
    },
    Command {
        command: ControlCommand,
    },
}

fn is_fired(phase: &GesturePhase) -> bool {
    *phase == GesturePhase::Fired
}

impl WireMessage {
    pub fn from_event(event: &GestureEvent) -> Self {
        WireMessage::Gesture {
            gesture: event.kind,
            action_type: GestureSource::of(event.kind),
            phase: event.phase,
        }
    }

    pub fn command(command: ControlCommand) -> Self {
        WireMessage::Command { command }
    }
}

/// Serialize a message as one protocol line, trailing newline included
pub fn encode(message: &WireMessage) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Incremental decoder for a byte stream split at arbitrary points
///
/// Reads from a socket rarely align with message boundaries; the decoder
/// keeps the trailing partial line until its newline arrives.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed received text and decode every line it completes
    ///
    /// Blank lines are skipped; a malformed line yields an error entry and
    /// does not affect the lines around it.
    pub fn push(&mut self, chunk: &str) -> Vec<Result<WireMessage, serde_json::Error>> {
        self.pending.push_str(chunk);

        let mut messages = Vec::new();
        while let Some(newline) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=newline).collect();
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            messages.push(serde_json::from_str(line));
        }
        messages
    }

    /// Text received after the last newline
    pub fn pending(&self) -> &str {
        &self.pending
    }
}
