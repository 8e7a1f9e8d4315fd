//! Streaming instruction parser.
//!
//! `InstructionParser` consumes arbitrary byte slices — regardless of how a
//! serialized instruction happens to be split across reads — and emits
//! completed instructions through [`InstructionParser::take`].

use crate::error::ParseError;
use crate::instruction::Instruction;
use crate::unicode::charsize;

/// Parser state, named after the phase of a single element/instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Reading the decimal codepoint-count prefix of an element.
    Length,
    /// Reading the element's UTF-8 bytes (or its terminator once the
    /// declared codepoint count has been satisfied).
    Content,
    /// A full instruction has been assembled; call [`InstructionParser::take`].
    Complete,
    /// The byte stream violated the wire grammar; the connection must close.
    Error,
}

/// Incremental decoder for one instruction at a time.
#[derive(Debug)]
pub struct InstructionParser {
    state: ParserState,
    length_value: usize,
    has_digit: bool,
    codepoints_remaining: usize,
    byte_residue: u8,
    current_elem: Vec<u8>,
    elements: Vec<String>,
    error: Option<ParseError>,
}

impl Default for InstructionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionParser {
    /// Creates a fresh parser, ready to read the first element's length prefix.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ParserState::Length,
            length_value: 0,
            has_digit: false,
            codepoints_remaining: 0,
            byte_residue: 0,
            current_elem: Vec::new(),
            elements: Vec::new(),
            error: None,
        }
    }

    /// Current parser state.
    #[must_use]
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// True once at least one byte of the next instruction has been consumed
    /// without yet reaching [`ParserState::Complete`].
    #[must_use]
    pub fn in_progress(&self) -> bool {
        !(self.state == ParserState::Length
            && !self.has_digit
            && self.length_value == 0
            && self.elements.is_empty()
            && self.current_elem.is_empty())
    }

    /// Resets the parser to its initial state, discarding any partially
    /// assembled instruction. Called after [`Self::take`] or to recover from
    /// an [`ParserState::Error`] (the caller is expected to close the
    /// connection instead of resuming, but `reset` is provided for tests).
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Returns the completed instruction and resets the parser, or `None` if
    /// the parser is not in [`ParserState::Complete`].
    pub fn take(&mut self) -> Option<Instruction> {
        if self.state != ParserState::Complete {
            return None;
        }
        let mut elements = std::mem::take(&mut self.elements);
        let opcode = elements.remove(0);
        let instr = Instruction::new(opcode, elements);
        self.reset();
        Some(instr)
    }

    /// Feeds `bytes` into the parser, returning the number of bytes consumed.
    ///
    /// Consumption stops as soon as the parser reaches [`ParserState::Complete`]
    /// or [`ParserState::Error`] (the terminating byte is counted as
    /// consumed); unused trailing bytes are left for the next call. If the
    /// parser is already `Complete` or `Error` when called, no bytes are
    /// consumed — the caller must [`Self::take`] or abandon the connection
    /// first.
    pub fn append(&mut self, bytes: &[u8]) -> Result<usize, ParseError> {
        if matches!(self.state, ParserState::Complete | ParserState::Error) {
            return Ok(0);
        }

        for (i, &b) in bytes.iter().enumerate() {
            match self.state {
                ParserState::Length => {
                    if b.is_ascii_digit() {
                        self.has_digit = true;
                        self.length_value = self.length_value * 10 + usize::from(b - b'0');
                    } else if b == b'.' {
                        if !self.has_digit {
                            self.state = ParserState::Error;
                            self.error = Some(ParseError::MissingLength);
                            return Err(ParseError::MissingLength);
                        }
                        self.codepoints_remaining = self.length_value;
                        self.length_value = 0;
                        self.has_digit = false;
                        self.byte_residue = 0;
                        self.current_elem.clear();
                        self.state = ParserState::Content;
                    } else {
                        self.state = ParserState::Error;
                        let err = ParseError::InvalidLength(b);
                        self.error = Some(err.clone());
                        return Err(err);
                    }
                }
                ParserState::Content => {
                    if self.codepoints_remaining > 0 || self.byte_residue > 0 {
                        if self.byte_residue == 0 {
                            let n = charsize(b);
                            self.current_elem.push(b);
                            if n <= 1 {
                                self.codepoints_remaining -= 1;
                            } else {
                                self.byte_residue = n - 1;
                            }
                        } else {
                            self.current_elem.push(b);
                            self.byte_residue -= 1;
                            if self.byte_residue == 0 {
                                self.codepoints_remaining -= 1;
                            }
                        }
                    } else {
                        match b {
                            b',' | b';' => {
                                let bytes = std::mem::take(&mut self.current_elem);
                                let text = String::from_utf8(bytes).map_err(|_| {
                                    self.state = ParserState::Error;
                                    self.error = Some(ParseError::InvalidUtf8);
                                    ParseError::InvalidUtf8
                                })?;
                                self.elements.push(text);
                                if b == b';' {
                                    self.state = ParserState::Complete;
                                    return Ok(i + 1);
                                }
                                self.state = ParserState::Length;
                            }
                            other => {
                                self.state = ParserState::Error;
                                let err = ParseError::InvalidTerminator(other);
                                self.error = Some(err.clone());
                                return Err(err);
                            }
                        }
                    }
                }
                ParserState::Complete | ParserState::Error => unreachable!("checked above"),
            }
        }

        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_element_instruction() {
        let mut p = InstructionParser::new();
        let data = b"4.test,8.testdata,5.zxcvb,13.guacamoletest;";
        let consumed = p.append(data).unwrap();
        assert_eq!(consumed, data.len());
        assert_eq!(p.state(), ParserState::Complete);
        let instr = p.take().unwrap();
        assert_eq!(instr.opcode, "test");
        assert_eq!(instr.args, vec!["testdata", "zxcvb", "guacamoletest"]);
    }

    #[test]
    fn parses_utf8_codepoint_framing() {
        let mut p = InstructionParser::new();
        let data = "4.test,3.a犬b;".as_bytes();
        p.append(data).unwrap();
        let instr = p.take().unwrap();
        assert_eq!(instr.opcode, "test");
        assert_eq!(instr.args, vec!["a犬b"]);
    }

    #[test]
    fn handles_zero_length_elements() {
        let mut p = InstructionParser::new();
        p.append(b"0.,0.;").unwrap();
        let instr = p.take().unwrap();
        assert_eq!(instr.opcode, "");
        assert_eq!(instr.args, vec![""]);
    }

    #[test]
    fn resumes_across_arbitrary_chunk_boundaries() {
        let whole = b"4.test,8.testdata,5.zxcvb,13.guacamoletest;";
        for split in 0..whole.len() {
            let mut p = InstructionParser::new();
            let (a, b) = whole.split_at(split);
            let mut total = 0;
            total += p.append(a).unwrap();
            if p.state() != ParserState::Complete {
                total += p.append(b).unwrap();
            }
            assert_eq!(total, whole.len(), "split at {split}");
            let instr = p.take().expect("complete");
            assert_eq!(instr.opcode, "test");
            assert_eq!(instr.args, vec!["testdata", "zxcvb", "guacamoletest"]);
        }
    }

    #[test]
    fn byte_at_a_time_matches_single_append() {
        let whole = b"4.test,3.a\xe7\x8a\xacb;";
        let mut p = InstructionParser::new();
        let mut consumed_total = 0;
        for &b in whole {
            consumed_total += p.append(&[b]).unwrap();
            if p.state() == ParserState::Complete {
                break;
            }
        }
        assert_eq!(consumed_total, whole.len());
        let instr = p.take().unwrap();
        assert_eq!(instr.opcode, "test");
        assert_eq!(instr.args, vec!["a犬b"]);
    }

    #[test]
    fn leaves_trailing_bytes_unconsumed() {
        let mut p = InstructionParser::new();
        let data = b"4.sync;4.sync;";
        let consumed = p.append(data).unwrap();
        assert_eq!(consumed, 7);
        let instr = p.take().unwrap();
        assert_eq!(instr.opcode, "sync");
        let consumed2 = p.append(&data[consumed..]).unwrap();
        assert_eq!(consumed2, 7);
        let instr2 = p.take().unwrap();
        assert_eq!(instr2.opcode, "sync");
    }

    #[test]
    fn rejects_missing_length_digit() {
        let mut p = InstructionParser::new();
        let err = p.append(b".foo;").unwrap_err();
        assert_eq!(err, ParseError::MissingLength);
        assert_eq!(p.state(), ParserState::Error);
    }

    #[test]
    fn rejects_bad_terminator() {
        let mut p = InstructionParser::new();
        let err = p.append(b"4.test:").unwrap_err();
        assert!(matches!(err, ParseError::InvalidTerminator(b':')));
    }

    #[test]
    fn in_progress_tracks_partial_instructions() {
        let mut p = InstructionParser::new();
        assert!(!p.in_progress());
        p.append(b"4.te").unwrap();
        assert!(p.in_progress());
    }
}
