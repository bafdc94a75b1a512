//! The incremental JSON parser.
//!
//! [`StreamParser`] consumes text in arbitrarily sized chunks and emits
//! [`ParseEvent`]s as soon as each token completes. The parse is driven one
//! character at a time by an explicit state machine; every piece of state —
//! the current lexical mode, the nesting stack, partial string and number
//! buffers, escape progress, position counters — lives on the parser
//! instance, so a `write` call may end anywhere (mid-escape, mid-literal,
//! between the hex digits of a `\uXXXX` sequence) and the next call resumes
//! exactly where the previous one left off. The emitted event sequence is
//! identical no matter how the input is chunked.
//!
//! # Examples
//!
//! ```rust
//! use jsonflume::{ParserOptions, StreamParser};
//!
//! let mut parser = StreamParser::new(ParserOptions::default());
//! parser.write(r#"{"key": [null, true, 3.14]}"#)?;
//! parser.end()?;
//! for event in parser.events() {
//!     println!("{event:?}");
//! }
//! # Ok::<(), jsonflume::ParseError>(())
//! ```
use std::collections::VecDeque;

use crate::{
    error::ParseError,
    escape_buffer::UnicodeEscapeBuffer,
    event::ParseEvent,
    options::{OverflowPolicy, ParserOptions},
    value::Value,
};

/// Lexical states of the parser.
///
/// The current state plus the nesting stack fully determine how the next
/// character is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Begin,
    Value,
    OpenObject,
    CloseObject,
    OpenArray,
    CloseArray,
    OpenKey,
    CloseKey,
    Str,
    True,
    True2,
    True3,
    False,
    False2,
    False3,
    False4,
    Null,
    Null2,
    Null3,
    NumberDecimalPoint,
    NumberDigit,
    End,
}

fn is_json_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// The streaming JSON parser.
///
/// Feed input with [`write`](Self::write), terminate with
/// [`end`](Self::end), and drain recognized events with
/// [`events`](Self::events). Only object and array roots are accepted.
///
/// After a malformed-input error the parser is poisoned: `write` and `end`
/// keep returning the recorded error until [`resume`](Self::resume) clears
/// it. After a successful `end` the instance resets itself and can parse the
/// next document.
///
/// # Examples
///
/// ```rust
/// use jsonflume::{ParseEvent, ParserOptions, StreamParser, Value};
///
/// let mut parser = StreamParser::new(ParserOptions::default());
/// parser.write(r#"[1,"#)?;
/// parser.write(r#" 2]"#)?;
/// parser.end()?;
/// let values: Vec<_> = parser
///     .events()
///     .filter(|e| matches!(e, ParseEvent::Value(_)))
///     .collect();
/// assert_eq!(
///     values,
///     vec![
///         ParseEvent::Value(Value::Number(1.0)),
///         ParseEvent::Value(Value::Number(2.0)),
///     ]
/// );
/// # Ok::<(), jsonflume::ParseError>(())
/// ```
#[derive(Debug)]
pub struct StreamParser {
    state: State,
    /// What to resume when the current construct closes. Pushed on entering a
    /// nested object, array or key context; popped on closing; an empty pop
    /// resumes top-level `Value`.
    stack: Vec<State>,

    /// The in-progress or pending string token. String values stay pending
    /// until the following structural character decides whether they are a
    /// property name or a value.
    text: Option<String>,
    /// The in-progress number token.
    number: String,
    /// A backslash has been read and its escape character has not.
    slashed: bool,
    unicode: UnicodeEscapeBuffer,

    position: usize,
    line: usize,
    column: usize,

    error: Option<ParseError>,
    queue: VecDeque<ParseEvent>,
    options: ParserOptions,
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl StreamParser {
    /// Creates a parser with the given options.
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        let mut parser = Self {
            state: State::Begin,
            stack: Vec::with_capacity(16),
            text: None,
            number: String::new(),
            slashed: false,
            unicode: UnicodeEscapeBuffer::new(),
            position: 0,
            line: 1,
            column: 0,
            error: None,
            queue: VecDeque::new(),
            options,
        };
        parser.queue.push_back(ParseEvent::Ready);
        parser
    }

    /// Feeds a chunk of JSON text.
    ///
    /// The chunk may be of any size, including empty. Events recognized while
    /// processing it are queued for [`events`](Self::events). On malformed
    /// input the error is recorded and returned; events recognized before the
    /// failure remain in the queue, and nothing further is emitted for the
    /// malformed token.
    ///
    /// # Errors
    ///
    /// Returns the first syntax or resource-limit error encountered, or the
    /// previously recorded error if the parser is poisoned.
    pub fn write(&mut self, chunk: &str) -> Result<&mut Self, ParseError> {
        if let Some(err) = self.error.clone() {
            return Err(err);
        }
        if self.state == State::End {
            self.reset();
        }
        let mut idx = 0;
        while idx < chunk.len() {
            let rest = &chunk[idx..];
            let Some(c) = rest.chars().next() else { break };
            idx += self.step(c, rest)?;
        }
        self.check_buffers()?;
        Ok(self)
    }

    /// Signals end of input.
    ///
    /// Valid only between documents or after a complete root value; anywhere
    /// else (mid-token, inside an open container, before any input) it fails
    /// with "unexpected end of input". On success an [`ParseEvent::End`] is
    /// queued and the next `write` starts a fresh document.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is incomplete or the parser is
    /// poisoned.
    pub fn end(&mut self) -> Result<&mut Self, ParseError> {
        if let Some(err) = self.error.clone() {
            return Err(err);
        }
        if self.state != State::Value
            || !self.stack.is_empty()
            || self.text.is_some()
            || !self.number.is_empty()
        {
            return self.fail("unexpected end of input");
        }
        self.queue.push_back(ParseEvent::End);
        self.state = State::End;
        Ok(self)
    }

    /// Same as [`end`](Self::end).
    ///
    /// # Errors
    ///
    /// See [`end`](Self::end).
    pub fn close(&mut self) -> Result<&mut Self, ParseError> {
        self.end()
    }

    /// Clears a recorded error so the instance accepts writes again.
    ///
    /// No resynchronization is attempted: input after the failure point is
    /// interpreted in whatever state the parser was left.
    pub fn resume(&mut self) -> &mut Self {
        self.error = None;
        self
    }

    /// Drains the queued events, oldest first.
    pub fn events(&mut self) -> impl Iterator<Item = ParseEvent> + '_ {
        self.queue.drain(..)
    }

    /// Character offset consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Current 1-based line.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Characters consumed on the current line.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    fn reset(&mut self) {
        self.state = State::Begin;
        self.stack.clear();
        self.text = None;
        self.number.clear();
        self.slashed = false;
        self.unicode.reset();
        self.position = 0;
        self.line = 1;
        self.column = 0;
        self.error = None;
        self.queue.push_back(ParseEvent::Ready);
    }

    fn bump(&mut self, c: char) {
        self.position += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    fn fail<T>(&mut self, message: impl Into<String>) -> Result<T, ParseError> {
        let err = ParseError {
            message: message.into(),
            line: self.line,
            column: self.column,
            position: self.position,
        };
        self.error = Some(err.clone());
        Err(err)
    }

    fn pop_state(&mut self) -> State {
        self.stack.pop().unwrap_or(State::Value)
    }

    fn push_event(&mut self, event: ParseEvent) {
        self.queue.push_back(event);
    }

    /// Emits a pending completed string token as a value.
    fn flush_pending_text(&mut self) {
        if let Some(text) = self.text.take() {
            self.push_event(ParseEvent::Value(Value::String(text)));
        }
    }

    /// Claims the pending completed string token as a property name.
    fn take_text(&mut self) -> Result<String, ParseError> {
        match self.text.take() {
            Some(text) => Ok(text),
            None => self.fail("bad object; expected a property name"),
        }
    }

    fn close_number(&mut self) -> Result<(), ParseError> {
        if self.number.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.number);
        match text.parse::<f64>() {
            Ok(n) => {
                self.push_event(ParseEvent::Value(Value::Number(n)));
                Ok(())
            }
            Err(_) => self.fail(format!("malformed number {text:?}")),
        }
    }

    /// Processes one character (or, for verbatim string runs, one scan-ahead
    /// span starting at that character). Returns the number of input bytes
    /// consumed; zero means the character terminated a number token and must
    /// be reprocessed in the successor state.
    #[allow(clippy::too_many_lines)]
    fn step(&mut self, c: char, rest: &str) -> Result<usize, ParseError> {
        let len = c.len_utf8();
        match self.state {
            State::Begin => {
                self.bump(c);
                match c {
                    '{' => self.state = State::OpenObject,
                    '[' => self.state = State::OpenArray,
                    c if is_json_ws(c) => {}
                    _ => return self.fail("non-whitespace before '{' or '['"),
                }
                Ok(len)
            }

            State::OpenKey | State::OpenObject => {
                self.bump(c);
                if is_json_ws(c) {
                    return Ok(len);
                }
                if self.state == State::OpenKey {
                    self.stack.push(State::CloseKey);
                } else if c == '}' {
                    // Empty object: open and close with no intervening key.
                    self.push_event(ParseEvent::OpenObject { first_key: None });
                    self.push_event(ParseEvent::CloseObject);
                    self.state = self.pop_state();
                    return Ok(len);
                } else {
                    self.stack.push(State::CloseObject);
                }
                if c == '"' {
                    self.text = Some(String::new());
                    self.state = State::Str;
                    Ok(len)
                } else {
                    self.fail("malformed object key; expected '\"'")
                }
            }

            State::CloseKey => {
                self.bump(c);
                if is_json_ws(c) {
                    return Ok(len);
                }
                if c == ':' {
                    let key = self.take_text()?;
                    self.push_event(ParseEvent::Key(key));
                    self.state = State::Value;
                    Ok(len)
                } else {
                    self.fail("bad object; expected ':' after property name")
                }
            }

            State::CloseObject => {
                self.bump(c);
                if is_json_ws(c) {
                    return Ok(len);
                }
                match c {
                    ':' => {
                        // The pending text is the object's first key.
                        let key = self.take_text()?;
                        self.stack.push(State::CloseObject);
                        self.push_event(ParseEvent::OpenObject {
                            first_key: Some(key),
                        });
                        self.state = State::Value;
                    }
                    '}' => {
                        self.flush_pending_text();
                        self.push_event(ParseEvent::CloseObject);
                        self.state = self.pop_state();
                    }
                    ',' => {
                        self.stack.push(State::CloseObject);
                        self.flush_pending_text();
                        self.state = State::OpenKey;
                    }
                    _ => return self.fail("bad object; expected ':', ',' or '}'"),
                }
                Ok(len)
            }

            State::OpenArray | State::Value => {
                self.bump(c);
                if !self.number.is_empty() {
                    // Only a digit may follow a leading minus sign.
                    return match c {
                        '0' => {
                            self.number.push(c);
                            self.state = State::NumberDecimalPoint;
                            Ok(len)
                        }
                        '1'..='9' => {
                            self.number.push(c);
                            self.state = State::NumberDigit;
                            Ok(len)
                        }
                        _ => self.fail("bad number; expected a digit after '-'"),
                    };
                }
                if is_json_ws(c) {
                    return Ok(len);
                }
                if self.state == State::OpenArray {
                    self.push_event(ParseEvent::OpenArray);
                    self.state = State::Value;
                    if c == ']' {
                        self.push_event(ParseEvent::CloseArray);
                        self.state = self.pop_state();
                        return Ok(len);
                    }
                    self.stack.push(State::CloseArray);
                }
                match c {
                    '"' => {
                        self.text = Some(String::new());
                        self.state = State::Str;
                    }
                    '{' => self.state = State::OpenObject,
                    '[' => self.state = State::OpenArray,
                    't' => self.state = State::True,
                    'f' => self.state = State::False,
                    'n' => self.state = State::Null,
                    '-' => self.number.push('-'),
                    '0' => {
                        self.number.push('0');
                        self.state = State::NumberDecimalPoint;
                    }
                    '1'..='9' => {
                        self.number.push(c);
                        self.state = State::NumberDigit;
                    }
                    _ => return self.fail("bad value"),
                }
                Ok(len)
            }

            State::CloseArray => {
                self.bump(c);
                if is_json_ws(c) {
                    return Ok(len);
                }
                match c {
                    ',' => {
                        self.stack.push(State::CloseArray);
                        self.flush_pending_text();
                        self.state = State::Value;
                    }
                    ']' => {
                        self.flush_pending_text();
                        self.push_event(ParseEvent::CloseArray);
                        self.state = self.pop_state();
                    }
                    _ => return self.fail("bad array; expected ',' or ']'"),
                }
                Ok(len)
            }

            State::Str => self.string_step(c, rest),

            State::True => self.literal_step(c, 'r', State::True2, "true"),
            State::True2 => self.literal_step(c, 'u', State::True3, "true"),
            State::True3 => {
                self.bump(c);
                if c == 'e' {
                    self.push_event(ParseEvent::Value(Value::Boolean(true)));
                    self.state = self.pop_state();
                    Ok(len)
                } else {
                    self.fail("invalid true literal")
                }
            }
            State::False => self.literal_step(c, 'a', State::False2, "false"),
            State::False2 => self.literal_step(c, 'l', State::False3, "false"),
            State::False3 => self.literal_step(c, 's', State::False4, "false"),
            State::False4 => {
                self.bump(c);
                if c == 'e' {
                    self.push_event(ParseEvent::Value(Value::Boolean(false)));
                    self.state = self.pop_state();
                    Ok(len)
                } else {
                    self.fail("invalid false literal")
                }
            }
            State::Null => self.literal_step(c, 'u', State::Null2, "null"),
            State::Null2 => self.literal_step(c, 'l', State::Null3, "null"),
            State::Null3 => {
                self.bump(c);
                if c == 'l' {
                    self.push_event(ParseEvent::Value(Value::Null));
                    self.state = self.pop_state();
                    Ok(len)
                } else {
                    self.fail("invalid null literal")
                }
            }

            State::NumberDecimalPoint | State::NumberDigit => {
                if self.number_step(c)? {
                    Ok(len)
                } else {
                    // The character is not part of the number: close the
                    // token and reprocess it in the resumed state.
                    self.close_number()?;
                    self.state = self.pop_state();
                    Ok(0)
                }
            }

            State::End => {
                self.bump(c);
                self.fail("unexpected input after end")
            }
        }
    }

    fn literal_step(
        &mut self,
        c: char,
        expected: char,
        next: State,
        literal: &str,
    ) -> Result<usize, ParseError> {
        self.bump(c);
        if c == expected {
            self.state = next;
            Ok(c.len_utf8())
        } else {
            self.fail(format!("invalid {literal} literal"))
        }
    }

    /// Returns whether the character was consumed as part of the number.
    fn number_step(&mut self, c: char) -> Result<bool, ParseError> {
        match self.state {
            State::NumberDecimalPoint => match c {
                '.' | 'e' | 'E' => {
                    self.bump(c);
                    self.number.push(c);
                    self.state = State::NumberDigit;
                    Ok(true)
                }
                '0'..='9' => {
                    self.bump(c);
                    self.fail("bad number; digit after a leading zero")
                }
                _ => Ok(false),
            },
            _ => match c {
                '0'..='9' => {
                    self.bump(c);
                    self.number.push(c);
                    Ok(true)
                }
                '.' => {
                    self.bump(c);
                    if self.number.contains('.') {
                        return self.fail("bad number; two decimal points");
                    }
                    self.number.push(c);
                    Ok(true)
                }
                'e' | 'E' => {
                    self.bump(c);
                    if self.number.contains(['e', 'E']) {
                        return self.fail("bad number; two exponents");
                    }
                    self.number.push(c);
                    Ok(true)
                }
                '+' | '-' => {
                    self.bump(c);
                    if !self.number.ends_with(['e', 'E']) {
                        return self.fail("bad number; misplaced sign");
                    }
                    self.number.push(c);
                    Ok(true)
                }
                _ => Ok(false),
            },
        }
    }

    fn string_step(&mut self, c: char, rest: &str) -> Result<usize, ParseError> {
        let len = c.len_utf8();

        if self.unicode.is_active() {
            self.bump(c);
            return match self.unicode.feed(c) {
                Ok(Some(ch)) => {
                    if let Some(text) = self.text.as_mut() {
                        text.push(ch);
                    }
                    Ok(len)
                }
                Ok(None) => Ok(len),
                Err(msg) => self.fail(msg),
            };
        }

        if self.slashed {
            self.bump(c);
            self.slashed = false;
            if self.unicode.awaiting_pair() && c != 'u' {
                return self.fail("unpaired surrogate in string");
            }
            let decoded = match c {
                '"' | '\\' | '/' => Some(c),
                'b' => Some('\u{0008}'),
                'f' => Some('\u{000C}'),
                'n' => Some('\n'),
                'r' => Some('\r'),
                't' => Some('\t'),
                'u' => {
                    self.unicode.begin();
                    None
                }
                _ => return self.fail(format!("invalid escape character '{c}'")),
            };
            if let Some(ch) = decoded {
                if let Some(text) = self.text.as_mut() {
                    text.push(ch);
                }
            }
            return Ok(len);
        }

        if self.unicode.awaiting_pair() && c != '\\' {
            self.bump(c);
            return self.fail("unpaired surrogate in string");
        }

        match c {
            '"' => {
                self.bump(c);
                // The completed token stays pending: whether it is a value or
                // a property name is decided by the next structural
                // character.
                self.state = self.pop_state();
                Ok(len)
            }
            '\\' => {
                self.bump(c);
                self.slashed = true;
                Ok(len)
            }
            c if (c as u32) < 0x20 => {
                self.bump(c);
                self.fail("control character in string")
            }
            _ => {
                // Scan ahead over the verbatim span and copy it in one pass.
                let span = rest
                    .find(|ch: char| ch == '"' || ch == '\\' || (ch as u32) < 0x20)
                    .unwrap_or(rest.len());
                let run = &rest[..span];
                let chars = run.chars().count();
                self.position += chars;
                self.column += chars;
                if let Some(text) = self.text.as_mut() {
                    text.push_str(run);
                }
                Ok(span)
            }
        }
    }

    fn check_buffers(&mut self) -> Result<(), ParseError> {
        let max = self.options.max_buffer_length.max(10);
        if self.number.len() > max {
            return self.fail("maximum buffer length exceeded by number token");
        }
        let accumulating = self.state == State::Str;
        let too_long = self.text.as_ref().is_some_and(|t| t.len() > max);
        if accumulating && too_long {
            match self.options.text_overflow {
                OverflowPolicy::Error => {
                    return self.fail("maximum buffer length exceeded by string token");
                }
                OverflowPolicy::Flush => {
                    // Mid-escape content is withheld until it decodes.
                    if !self.slashed && !self.unicode.is_active() && !self.unicode.awaiting_pair() {
                        if let Some(text) = self.text.as_mut() {
                            let flushed = std::mem::take(text);
                            self.queue.push_back(ParseEvent::Value(Value::String(flushed)));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
