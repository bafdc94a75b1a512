//! Incremental JSON parsing with path-matching callbacks.
//!
//! The crate has two layers:
//!
//! - [`StreamParser`] is a character-driven JSON parser that accepts input in
//!   chunks of any size and emits structural [`ParseEvent`]s as soon as each
//!   token completes. Chunk boundaries are invisible: the same input split
//!   any way produces the same events.
//! - [`JsonStream`] builds the document tree on top of those events and
//!   fires registered callbacks when a [`JsonPath`] pattern matches, either
//!   as soon as a path is reached ([`on_path`](JsonStream::on_path)) or once
//!   the node at it has completely arrived
//!   ([`on_node`](JsonStream::on_node)). Interesting parts of a large
//!   document can be used as soon as they are downloaded, without waiting
//!   for the whole response.
//!
//! ```rust
//! use jsonflume::JsonStream;
//!
//! let mut stream = JsonStream::default();
//! stream.on_node("foods.*.colour", |node, path, _ancestors| {
//!     println!("{path:?} is {node:?}");
//! })?;
//!
//! // In real use these chunks arrive from the network.
//! stream.write(r#"{"foods": [{"name": "aubergine", "col"#)?;
//! stream.write(r#"our": "purple"}]}"#)?;
//! stream.end()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod escape_buffer;
mod event;
mod options;
mod parser;
mod path;
mod pattern;
mod stream;
mod value;

#[cfg(test)]
mod tests;

pub use error::{ParseError, PatternError};
pub use event::ParseEvent;
pub use options::{OverflowPolicy, ParserOptions};
pub use parser::StreamParser;
pub use path::PathComponent;
pub use pattern::{JsonPath, PathMatch};
pub use stream::{JsonStream, ListenerId};
pub use value::{Array, Map, Value};
