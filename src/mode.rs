//! Mode string parsing and normalization.
//!
//! Handles follow plain-file conventions rather than compression-library ones:
//! `"r"` means text, and binary access has to be asked for with `b`.

use crate::error::{CompFileError, Result};
use std::fmt;

/// How the underlying file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// `r`: read an existing file
    Read,
    /// `w`: create or truncate
    Write,
    /// `a`: create or append
    Append,
    /// `x`: create, failing if the file exists
    Exclusive,
}

impl Access {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'r' => Some(Self::Read),
            'w' => Some(Self::Write),
            'a' => Some(Self::Append),
            'x' => Some(Self::Exclusive),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Self::Read => 'r',
            Self::Write => 'w',
            Self::Append => 'a',
            Self::Exclusive => 'x',
        }
    }

    /// True for every access mode that produces output
    pub fn is_write(self) -> bool {
        !matches!(self, Self::Read)
    }
}

/// A validated, normalized open mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    access: Access,
    binary: bool,
}

impl OpenMode {
    /// Parse a mode string such as `"r"`, `"wb"` or `"AT"`.
    ///
    /// The string is lower-cased first. Access defaults to `r` and, when neither
    /// `b` nor `t` is present, text mode is assumed.
    pub fn parse(mode: &str) -> Result<Self> {
        let lowered = mode.to_lowercase();
        let mut access = None;
        let mut text = false;
        let mut binary = false;

        for c in lowered.chars() {
            if let Some(a) = Access::from_char(c) {
                if access.replace(a).is_some() {
                    return Err(CompFileError::invalid_mode(
                        mode,
                        "must have at most one of r, w, a, x",
                    ));
                }
                continue;
            }
            match c {
                't' if !text => text = true,
                'b' if !binary => binary = true,
                '+' => {
                    return Err(CompFileError::invalid_mode(
                        mode,
                        "read/write update mode is not supported",
                    ))
                }
                other => {
                    return Err(CompFileError::invalid_mode(
                        mode,
                        format!("unexpected character '{}'", other),
                    ))
                }
            }
        }

        if text && binary {
            return Err(CompFileError::invalid_mode(
                mode,
                "cannot be both text and binary",
            ));
        }

        Ok(Self {
            access: access.unwrap_or(Access::Read),
            binary,
        })
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub fn is_text(&self) -> bool {
        !self.binary
    }

    pub fn is_readable(&self) -> bool {
        !self.access.is_write()
    }

    pub fn is_writable(&self) -> bool {
        self.access.is_write()
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.binary { 'b' } else { 't' };
        write!(f, "{}{}", self.access.as_char(), kind)
    }
}

impl std::str::FromStr for OpenMode {
    type Err = CompFileError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_default() {
        assert_eq!(OpenMode::parse("r").unwrap().to_string(), "rt");
        assert_eq!(OpenMode::parse("w").unwrap().to_string(), "wt");
        assert_eq!(OpenMode::parse("").unwrap().to_string(), "rt");
    }

    #[test]
    fn test_explicit_binary_and_case() {
        let mode = OpenMode::parse("RB").unwrap();
        assert!(mode.is_binary());
        assert_eq!(mode.access(), Access::Read);
        assert_eq!(mode.to_string(), "rb");

        let mode = OpenMode::parse("bA").unwrap();
        assert_eq!(mode.to_string(), "ab");
        assert!(mode.is_writable());
        assert!(!mode.is_readable());
    }

    #[test]
    fn test_exclusive_create() {
        let mode: OpenMode = "xt".parse().unwrap();
        assert_eq!(mode.access(), Access::Exclusive);
        assert!(mode.is_text());
    }

    #[test]
    fn test_rejects_invalid_modes() {
        for bad in ["rw", "rtb", "r+", "rq", "rr", "tt"] {
            match OpenMode::parse(bad) {
                Err(CompFileError::InvalidMode { mode, .. }) => assert_eq!(mode, bad),
                other => panic!("Expected InvalidMode for {:?}, got {:?}", bad, other),
            }
        }
    }
}
