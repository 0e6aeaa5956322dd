use crate::error_prefix::ErrorPrefixDetector;
use crate::field_coercion::AccessField;
use crate::pattern_compiler::AccessPattern;
use crate::types::{LogEvent, ParseError};
use crate::user_agent::UserAgentDecoder;
use std::io::BufRead;
use tracing::{debug, trace};

/// Where the assembler is within one event.
///
/// An error annotation moves through `ConsumeNextLine` to pull its access
/// line; if the stream ends there the annotation is dropped and the machine
/// goes straight to `Eof`.
#[derive(Debug)]
enum AssemblerState {
    ReadLine,
    CheckErrorPrefix {
        line: String,
    },
    ConsumeNextLine {
        message: Option<String>,
    },
    MatchAccessLine {
        line: String,
        message: Option<String>,
    },
    CoerceFields {
        fields: Vec<(AccessField, String)>,
        message: Option<String>,
    },
    EmitEvent(Box<LogEvent>),
    Eof,
}

/// Counters for one assembler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    pub lines: u64,
    pub events: u64,
    pub unmatched: u64,
    pub error_annotations: u64,
    pub orphaned: u64,
}

/// Reads log lines and yields one `LogEvent` per access line attempt, in
/// input order.
///
/// A line that does not match the access pattern still yields an event with
/// every field at its zero value. The iterator ends at end of input; a read
/// failure is yielded once as `Err` and ends it as well.
pub struct EventAssembler<R, D> {
    reader: R,
    pattern: AccessPattern,
    detector: ErrorPrefixDetector,
    decoder: D,
    state: AssemblerState,
    stats: AssemblerStats,
    buf: Vec<u8>,
}

impl<R: BufRead, D: UserAgentDecoder> EventAssembler<R, D> {
    pub fn new(reader: R, pattern: AccessPattern, decoder: D) -> Result<Self, ParseError> {
        Ok(Self {
            reader,
            pattern,
            detector: ErrorPrefixDetector::new()?,
            decoder,
            state: AssemblerState::ReadLine,
            stats: AssemblerStats::default(),
            buf: Vec::new(),
        })
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// Next line without its terminator, or `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>, ParseError> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }

        if self.buf.ends_with(b"\n") {
            self.buf.pop();
            if self.buf.ends_with(b"\r") {
                self.buf.pop();
            }
        }

        self.stats.lines += 1;
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    fn step(&mut self, state: AssemblerState) -> Result<AssemblerState, ParseError> {
        let next = match state {
            AssemblerState::ReadLine => match self.read_line()? {
                Some(line) => AssemblerState::CheckErrorPrefix { line },
                None => AssemblerState::Eof,
            },

            AssemblerState::CheckErrorPrefix { line } => {
                if self.detector.is_error_line(&line) {
                    self.stats.error_annotations += 1;
                    let message = self.detector.extract_message(&line);
                    if message.is_none() {
                        debug!("Error line did not match the message layout: {}", line);
                    }
                    AssemblerState::ConsumeNextLine { message }
                } else {
                    AssemblerState::MatchAccessLine {
                        line,
                        message: None,
                    }
                }
            }

            AssemblerState::ConsumeNextLine { message } => match self.read_line()? {
                Some(line) => AssemblerState::MatchAccessLine { line, message },
                None => {
                    self.stats.orphaned += 1;
                    debug!("Input ended after an error line, dropping it: {:?}", message);
                    AssemblerState::Eof
                }
            },

            AssemblerState::MatchAccessLine { line, message } => {
                let fields = match self.pattern.captures(&line) {
                    Some(caps) => caps
                        .into_iter()
                        .map(|(field, raw)| (field, raw.to_string()))
                        .collect(),
                    None => {
                        self.stats.unmatched += 1;
                        debug!("Line did not match the access pattern: {}", line);
                        Vec::new()
                    }
                };
                AssemblerState::CoerceFields { fields, message }
            }

            AssemblerState::CoerceFields { fields, message } => {
                let mut event = LogEvent {
                    error_message: message,
                    ..LogEvent::default()
                };
                for (field, raw) in &fields {
                    field.apply(&mut event, raw, &self.decoder);
                }
                AssemblerState::EmitEvent(Box::new(event))
            }

            state @ (AssemblerState::EmitEvent(_) | AssemblerState::Eof) => state,
        };

        trace!("Assembler moved to {:?}", next);
        Ok(next)
    }
}

impl<R: BufRead, D: UserAgentDecoder> Iterator for EventAssembler<R, D> {
    type Item = Result<LogEvent, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, AssemblerState::Eof) {
                AssemblerState::Eof => return None,
                AssemblerState::EmitEvent(event) => {
                    self.stats.events += 1;
                    self.state = AssemblerState::ReadLine;
                    return Some(Ok(*event));
                }
                state => match self.step(state) {
                    Ok(next) => self.state = next,
                    // state stays at Eof
                    Err(e) => return Some(Err(e)),
                },
            }
        }
    }
}
