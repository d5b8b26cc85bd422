//! IRC case-mapping functions.
//!
//! IRC compares nicknames and channel names case-insensitively, but the
//! rule set depends on the server's advertised `CASEMAPPING` ISUPPORT
//! token. Under `rfc1459` the characters `[]\~` are the uppercase forms
//! of `{}|^`; `strict-rfc1459` excludes the `~`/`^` pair.

use std::fmt;
use std::str::FromStr;

/// Case-mapping rule set advertised via `CASEMAPPING`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CaseMapping {
    /// Plain ASCII lowering.
    #[default]
    Ascii,
    /// ASCII plus `[]\~` → `{}|^`.
    Rfc1459,
    /// ASCII plus `[]\` → `{}|`.
    StrictRfc1459,
}

impl CaseMapping {
    /// Convert a string to lowercase under this mapping.
    pub fn lower(&self, s: &str) -> String {
        s.chars().map(|c| self.lower_char(c)).collect()
    }

    /// Compare two strings for equality under this mapping.
    pub fn eq(&self, a: &str, b: &str) -> bool {
        a.len() == b.len()
            && a.chars()
                .zip(b.chars())
                .all(|(ca, cb)| self.lower_char(ca) == self.lower_char(cb))
    }

    fn lower_char(&self, c: char) -> char {
        match (self, c) {
            (Self::Rfc1459 | Self::StrictRfc1459, '[') => '{',
            (Self::Rfc1459 | Self::StrictRfc1459, ']') => '}',
            (Self::Rfc1459 | Self::StrictRfc1459, '\\') => '|',
            (Self::Rfc1459, '~') => '^',
            (_, 'A'..='Z') => c.to_ascii_lowercase(),
            (_, c) => c,
        }
    }

    /// Canonical token value for this mapping.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Rfc1459 => "rfc1459",
            Self::StrictRfc1459 => "strict-rfc1459",
        }
    }
}

impl fmt::Display for CaseMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseMapping {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" => Ok(Self::Ascii),
            "rfc1459" => Ok(Self::Rfc1459),
            "strict-rfc1459" => Ok(Self::StrictRfc1459),
            _ => Err(()),
        }
    }
}
