//! Structural events emitted by the streaming parser.
use crate::value::Value;

/// A structural event recognized by [`crate::StreamParser`].
///
/// Events are produced synchronously inside [`crate::StreamParser::write`] in
/// document order, as soon as each token completes, and are drained through
/// [`crate::StreamParser::events`].
///
/// # Examples
///
/// ```
/// use jsonflume::{ParseEvent, ParserOptions, StreamParser, Value};
///
/// let mut parser = StreamParser::new(ParserOptions::default());
/// parser.write("[true]")?;
/// parser.end()?;
/// let events: Vec<_> = parser.events().collect();
/// assert_eq!(
///     events,
///     vec![
///         ParseEvent::Ready,
///         ParseEvent::OpenArray,
///         ParseEvent::Value(Value::Boolean(true)),
///         ParseEvent::CloseArray,
///         ParseEvent::End,
///     ]
/// );
/// # Ok::<(), jsonflume::ParseError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent {
    /// The parser is ready for a new document. Emitted once on construction
    /// and again after [`crate::StreamParser::end`] resets the instance.
    Ready,
    /// An object opened. The first property name is folded into the event;
    /// it is `None` only for the empty object `{}`.
    OpenObject {
        /// The first key of the object, when the object is non-empty.
        first_key: Option<String>,
    },
    /// A property name other than the first was recognized.
    Key(String),
    /// An object closed.
    CloseObject,
    /// An array opened.
    OpenArray,
    /// An array closed.
    CloseArray,
    /// A scalar value completed. Only the `Null`, `Boolean`, `Number` and
    /// `String` variants of [`Value`] ever appear here.
    Value(Value),
    /// A complete document was terminated by [`crate::StreamParser::end`].
    End,
}
