//! Parser configuration.

/// What to do when the string buffer outgrows the configured maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Fail the parse with a buffer-overflow error.
    #[default]
    Error,
    /// Emit the text accumulated so far as a `Value` event and keep going.
    ///
    /// This trades strict token atomicity for bounded memory: a single long
    /// string may be delivered as several `Value` events. Number buffers
    /// never flush; a number that long is an error regardless of policy.
    Flush,
}

/// Configuration options for [`crate::StreamParser`].
///
/// # Examples
///
/// ```
/// use jsonflume::{ParserOptions, StreamParser};
///
/// let parser = StreamParser::new(ParserOptions {
///     max_buffer_length: 1024,
///     ..ParserOptions::default()
/// });
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    /// Upper bound, in bytes, on any single accumulating token buffer
    /// (in-progress string or number). Checked after each `write` call, so a
    /// single oversized chunk may exceed it transiently.
    ///
    /// Defaults to 64 KiB.
    pub max_buffer_length: usize,

    /// Policy applied when the string buffer exceeds
    /// [`max_buffer_length`](Self::max_buffer_length).
    pub text_overflow: OverflowPolicy,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_buffer_length: 64 * 1024,
            text_overflow: OverflowPolicy::Error,
        }
    }
}
