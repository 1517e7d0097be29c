//! Word-buffered rendering of a streamed answer
//!
//! The gateway relays raw text with no framing, so a chunk can end in the
//! middle of a word or even in the middle of a UTF-8 sequence. The renderer
//! decodes incrementally, holds back the trailing partial word, and only
//! appends whole words to the transcript. The final transcript depends on
//! the streamed text alone, never on where the chunk boundaries fell.

use crate::error::{GatewayError, Result};
use crate::models::{ConversationMessage, GenerationRequest, Role};

const REPLACEMENT: char = '\u{FFFD}';

/// Incremental UTF-8 decoder that carries a split sequence to the next read.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `chunk` as is complete. Invalid bytes become U+FFFD.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// End of input: an unfinished sequence decodes to a single U+FFFD.
    pub fn finish(&mut self) -> String {
        if std::mem::take(&mut self.pending).is_empty() {
            String::new()
        } else {
            REPLACEMENT.to_string()
        }
    }
}

/// Holds the trailing, possibly incomplete, word between reads.
#[derive(Debug, Default)]
pub struct WordBuffer {
    pending: String,
}

impl WordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed decoded text; returns each completed word followed by one space.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.pending.push_str(text);

        let terminated = self.pending.ends_with(char::is_whitespace);
        let mut words: Vec<&str> = self.pending.split_whitespace().collect();
        let tail = if terminated {
            String::new()
        } else {
            words.pop().unwrap_or_default().to_string()
        };
        let emitted = words.into_iter().map(|word| format!("{word} ")).collect();

        self.pending = tail;
        emitted
    }

    /// Flush the held-back word as-is, without a trailing space.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        (!rest.is_empty()).then_some(rest)
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }
}

/// In-memory conversation for the current session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ConversationMessage>,
}

impl Transcript {
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push(&mut self, message: ConversationMessage) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }
}

/// Where a single ask cycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskPhase {
    Idle,
    /// User entry and empty assistant entry added, no bytes yet.
    Submitting,
    Streaming,
    /// Final flush done; input accepted again.
    Complete,
}

/// Client-side transcript plus the one in-flight answer being rendered.
#[derive(Debug)]
pub struct ChatSession {
    transcript: Transcript,
    phase: AskPhase,
    active: Option<usize>,
    decoder: Utf8Decoder,
    words: WordBuffer,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            transcript: Transcript::default(),
            phase: AskPhase::Idle,
            active: None,
            decoder: Utf8Decoder::new(),
            words: WordBuffer::new(),
        }
    }

    pub fn phase(&self) -> AskPhase {
        self.phase
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Whether an answer is still streaming; new submissions are refused.
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, AskPhase::Submitting | AskPhase::Streaming)
    }

    /// Start an ask cycle: record the user entry and an empty assistant entry.
    pub fn submit(&mut self, prompt: &str, location: Option<&str>) -> Result<GenerationRequest> {
        if self.is_busy() {
            return Err(GatewayError::StreamBusy);
        }
        let request = GenerationRequest::new(prompt, location.map(str::to_string))?;

        self.transcript.push(ConversationMessage::user(prompt));
        self.active = Some(
            self.transcript
                .push(ConversationMessage::assistant_placeholder()),
        );
        self.decoder = Utf8Decoder::new();
        self.words = WordBuffer::new();
        self.phase = AskPhase::Submitting;

        Ok(request)
    }

    /// Render one chunk of the answer body; returns the pieces appended.
    pub fn receive(&mut self, chunk: &[u8]) -> Vec<String> {
        if !self.is_busy() {
            tracing::debug!(len = chunk.len(), "Ignoring bytes outside an ask cycle");
            return Vec::new();
        }
        self.phase = AskPhase::Streaming;

        let text = self.decoder.decode(chunk);
        let pieces = self.words.push(&text);
        self.append(&pieces);
        pieces
    }

    /// Finish the cycle after a normal end or a broken stream alike.
    pub fn complete(&mut self) -> Vec<String> {
        if !self.is_busy() {
            return Vec::new();
        }

        let text = self.decoder.finish();
        let mut pieces = self.words.push(&text);
        pieces.extend(self.words.finish());
        self.append(&pieces);

        self.active = None;
        self.phase = AskPhase::Complete;
        pieces
    }

    fn append(&mut self, pieces: &[String]) {
        let Some(message) = self
            .active
            .and_then(|index| self.transcript.messages.get_mut(index))
        else {
            return;
        };
        debug_assert_eq!(message.role, Role::Assistant);
        for piece in pieces {
            message.content.push_str(piece);
        }
    }
}
