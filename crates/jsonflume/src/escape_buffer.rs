//! Accumulation of `\uXXXX` escape sequences, including UTF-16 surrogate
//! pairs split across two consecutive escapes (and therefore possibly across
//! chunk boundaries).

/// Buffer for the four hexadecimal digits of a `\uXXXX` escape.
///
/// Feeding the fourth digit resolves the escape to a code unit. Code units in
/// the basic multilingual plane become a `char` immediately; a high surrogate
/// is held back until the following escape supplies the matching low half.
#[derive(Debug)]
pub(crate) struct UnicodeEscapeBuffer {
    digits: [u8; 4],
    len: u8,
    active: bool,
    pending_high: Option<u16>,
}

impl UnicodeEscapeBuffer {
    pub fn new() -> Self {
        Self {
            digits: [0; 4],
            len: 0,
            active: false,
            pending_high: None,
        }
    }

    /// Starts a new `\u` escape. Keeps any held high surrogate: the new
    /// escape may be the low half of a pair.
    pub fn begin(&mut self) {
        self.active = true;
        self.len = 0;
    }

    /// Returns `true` while hex digits are still expected.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns `true` when a high surrogate is waiting for its low half.
    pub fn awaiting_pair(&self) -> bool {
        self.pending_high.is_some()
    }

    pub fn reset(&mut self) {
        self.len = 0;
        self.active = false;
        self.pending_high = None;
    }

    /// Feeds one hex digit.
    ///
    /// Returns `Ok(Some(ch))` when a complete character has been decoded,
    /// `Ok(None)` when more input is needed (further digits, or the low half
    /// of a surrogate pair), and `Err` with a description for a non-hex
    /// digit or a malformed surrogate sequence.
    pub fn feed(&mut self, c: char) -> Result<Option<char>, String> {
        if !c.is_ascii_hexdigit() {
            return Err(format!("invalid character '{c}' in unicode escape"));
        }
        self.digits[self.len as usize] = c as u8;
        self.len += 1;
        if self.len < 4 {
            return Ok(None);
        }

        self.active = false;
        self.len = 0;
        // The digits are ASCII hex by construction.
        let hex = std::str::from_utf8(&self.digits).map_err(|e| e.to_string())?;
        let unit = u32::from_str_radix(hex, 16).map_err(|e| e.to_string())?;

        if let Some(high) = self.pending_high.take() {
            if (0xDC00..=0xDFFF).contains(&unit) {
                let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (unit - 0xDC00);
                return char::from_u32(code)
                    .map(Some)
                    .ok_or_else(|| format!("invalid surrogate pair \\u{high:04X}\\u{unit:04X}"));
            }
            return Err(format!(
                "expected low surrogate after \\u{high:04X}, found \\u{unit:04X}"
            ));
        }

        if (0xD800..=0xDBFF).contains(&unit) {
            #[allow(clippy::cast_possible_truncation)]
            {
                self.pending_high = Some(unit as u16);
            }
            return Ok(None);
        }
        if (0xDC00..=0xDFFF).contains(&unit) {
            return Err(format!("unexpected low surrogate \\u{unit:04X}"));
        }

        char::from_u32(unit)
            .map(Some)
            .ok_or_else(|| format!("invalid unicode scalar value {unit}"))
    }
}
