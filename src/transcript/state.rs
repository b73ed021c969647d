//! The transcript: an ordered sequence of phrase strings.

/// Ordered phrase strings, at least one element at all times.
///
/// The last element is the "live" phrase: the transcription of all audio
/// accumulated since the last phrase boundary, rewritten on every iteration.
/// Earlier elements are finalized and never touched again. Only the
/// aggregator mutates a transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    /// Creates a transcript seeded with one empty live phrase.
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
        }
    }

    /// All phrases, finalized ones first, the live phrase last.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The live (still-updating) phrase.
    pub fn live(&self) -> &str {
        // Invariant: lines is never empty
        self.lines.last().map(String::as_str).unwrap_or("")
    }

    /// Number of phrases, the live one included.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True while nothing has been transcribed yet.
    pub fn is_blank(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    /// Overwrites the live phrase. Used while a phrase is still growing:
    /// each iteration re-transcribes the whole accumulated audio, so the
    /// new text replaces (never extends) the previous partial guess.
    pub fn replace_live(&mut self, text: String) {
        if let Some(last) = self.lines.last_mut() {
            *last = text;
        }
    }

    /// Finalizes the current live phrase and starts a new one with `text`.
    pub fn push_phrase(&mut self, text: String) {
        self.lines.push(text);
    }

    /// Consumes the transcript, returning its phrases.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
