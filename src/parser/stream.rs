//! The utensil wire protocol state machine.
//!
//! A model turn interleaves narrative prose with call blocks:
//!
//! ```text
//! UTENSIL:write_file
//! PARAM:file_path=hello.py
//! PARAM:content=BEGIN_VALUE
//! print("hi")
//! END_VALUE
//! END_UTENSIL
//! ```
//!
//! [`StreamParser`] consumes the turn fragment by fragment, queues each
//! completed [`UtensilCall`] in stream order, and collects everything outside
//! call blocks as narrative text. Markers are recognized only at the start of
//! a (whitespace-trimmed) line, so prose that merely mentions them passes
//! through untouched.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::observability::{NoopObserver, Observer, ObserverEvent};

use super::lines::LineAssembler;

const CALL_MARKER: &str = "UTENSIL:";
const PARAM_MARKER: &str = "PARAM:";
const END_CALL_MARKER: &str = "END_UTENSIL";
const BEGIN_VALUE_MARKER: &str = "BEGIN_VALUE";
const END_VALUE_MARKER: &str = "END_VALUE";

/// Insertion-ordered parameter map for one utensil call.
///
/// Writing an existing key replaces its value but keeps the key's original
/// position, so iteration order always reflects first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSet {
    entries: Vec<(String, String)>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// One parsed utensil invocation, complete from `UTENSIL:` to `END_UTENSIL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtensilCall {
    /// Name written after the opening marker, trimmed.
    pub name: String,
    /// Parameters in first-seen order.
    pub params: ParamSet,
    /// The verbatim block, markers included, outer edges trimmed.
    pub raw_text: String,
}

/// Call under construction between the opening and closing markers.
#[derive(Debug)]
struct CallDraft {
    name: String,
    params: ParamSet,
    raw_text: String,
}

impl CallDraft {
    fn start(name: &str, opening_line: &str) -> Self {
        Self {
            name: name.to_string(),
            params: ParamSet::new(),
            raw_text: format!("{opening_line}\n"),
        }
    }

    fn push_line(&mut self, line: &str) {
        self.raw_text.push_str(line);
        self.raw_text.push('\n');
    }

    fn finish(self) -> UtensilCall {
        UtensilCall {
            name: self.name,
            params: self.params,
            raw_text: self.raw_text.trim().to_string(),
        }
    }
}

/// Parser mode. The in-progress call rides on the variant, so a multi-line
/// capture cannot exist without its enclosing call.
#[derive(Debug)]
enum Mode {
    /// Outside any call block; lines are narrative.
    Normal,
    /// Inside a call block, reading single-line parameters.
    InCall { draft: CallDraft },
    /// Inside a `BEGIN_VALUE` block; lines are captured verbatim.
    InMultilineValue {
        draft: CallDraft,
        key: String,
        captured: Vec<String>,
    },
}

/// Incremental extractor of utensil calls from streamed model output.
///
/// Feed fragments with [`ingest`](Self::ingest) as they arrive, call
/// [`finalize`](Self::finalize) once after the last fragment, then drain the
/// completed calls and read the narrative. One instance serves one model
/// turn.
///
/// No input makes this parser fail: malformed parameter lines are dropped,
/// stray markers in prose stay prose, and a call left open at end of stream
/// is discarded. Diagnostics for the dropped cases go to the injected
/// [`Observer`], which defaults to a no-op.
pub struct StreamParser {
    mode: Mode,
    lines: LineAssembler,
    free_text: String,
    completed: VecDeque<UtensilCall>,
    observer: Arc<dyn Observer>,
}

impl StreamParser {
    /// Parser with the default no-op diagnostics sink.
    pub fn new() -> Self {
        Self::with_observer(Arc::new(NoopObserver {}))
    }

    /// Parser reporting parse diagnostics to `observer`. Diagnostics never
    /// change what is parsed.
    pub fn with_observer(observer: Arc<dyn Observer>) -> Self {
        Self {
            mode: Mode::Normal,
            lines: LineAssembler::new(),
            free_text: String::new(),
            completed: VecDeque::new(),
            observer,
        }
    }

    /// Consumes one stream fragment. Fragment boundaries never affect the
    /// parse; an empty fragment is a no-op.
    pub fn ingest(&mut self, fragment: &str) {
        for line in self.lines.push(fragment) {
            self.process_line(&line);
        }
    }

    /// Ends the stream. An unterminated final line runs through the state
    /// machine first; a call block still open after that is discarded. Call
    /// exactly once, after the last fragment.
    pub fn finalize(&mut self) {
        if let Some(remainder) = self.lines.flush() {
            self.process_line(&remainder);
        }
        match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Normal => {}
            Mode::InCall { draft } | Mode::InMultilineValue { draft, .. } => {
                self.observer
                    .record_event(&ObserverEvent::UnterminatedCall { utensil: draft.name });
            }
        }
    }

    /// True when at least one completed call waits in the queue.
    pub fn has_pending_call(&self) -> bool {
        !self.completed.is_empty()
    }

    /// Next completed call in stream order, if any.
    pub fn pop_call(&mut self) -> Option<UtensilCall> {
        self.completed.pop_front()
    }

    /// Number of completed calls waiting in the queue.
    pub fn pending_calls(&self) -> usize {
        self.completed.len()
    }

    /// Removes and returns every queued call, oldest first.
    pub fn drain_calls(&mut self) -> Vec<UtensilCall> {
        self.completed.drain(..).collect()
    }

    /// Narrative text seen so far, outer whitespace trimmed. Reading does not
    /// clear the buffer.
    pub fn text(&self) -> &str {
        self.free_text.trim()
    }

    fn process_line(&mut self, raw: &str) {
        let line = raw.trim();
        match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Normal => {
                if let Some(name) = line.strip_prefix(CALL_MARKER) {
                    self.mode = Mode::InCall {
                        draft: CallDraft::start(name.trim(), line),
                    };
                } else {
                    self.free_text.push_str(line);
                    self.free_text.push('\n');
                }
            }
            Mode::InCall { mut draft } => {
                draft.push_line(line);
                if let Some(body) = line.strip_prefix(PARAM_MARKER) {
                    // Split on the first '=' only; values keep theirs.
                    match body.split_once('=') {
                        Some((key, value)) => {
                            let key = key.trim();
                            let value = value.trim();
                            if value == BEGIN_VALUE_MARKER {
                                self.mode = Mode::InMultilineValue {
                                    draft,
                                    key: key.to_string(),
                                    captured: Vec::new(),
                                };
                            } else {
                                draft.params.insert(key, value);
                                self.mode = Mode::InCall { draft };
                            }
                        }
                        None => {
                            self.observer.record_event(&ObserverEvent::MalformedParam {
                                line: line.to_string(),
                            });
                            self.mode = Mode::InCall { draft };
                        }
                    }
                } else if line == END_CALL_MARKER {
                    let call = draft.finish();
                    self.observer
                        .record_event(&ObserverEvent::CallParsed { utensil: call.name.clone() });
                    self.completed.push_back(call);
                } else {
                    // Unrecognized lines stay in raw_text but bind nothing.
                    self.mode = Mode::InCall { draft };
                }
            }
            Mode::InMultilineValue {
                mut draft,
                key,
                mut captured,
            } => {
                // Multi-line payloads are verbatim: the untrimmed line goes
                // into both the value accumulator and raw_text.
                if line == END_VALUE_MARKER {
                    draft.push_line(raw);
                    draft.params.insert(key, captured.join("\n"));
                    self.mode = Mode::InCall { draft };
                } else {
                    draft.push_line(raw);
                    captured.push(raw.to_string());
                    self.mode = Mode::InMultilineValue {
                        draft,
                        key,
                        captured,
                    };
                }
            }
        }
    }
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}
