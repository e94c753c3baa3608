//! Data exchanged with a handle: text in text mode, bytes in binary mode.

use std::borrow::Cow;

/// A chunk read from, or written to, a [`CompFile`](crate::CompFile)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Content {
    /// UTF-8 text (text-mode handles)
    Text(String),
    /// Raw bytes (binary-mode handles)
    Binary(Vec<u8>),
}

impl Content {
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// The text, if this is text content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// Text view of either variant; invalid UTF-8 is replaced
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Binary(bytes) => String::from_utf8_lossy(bytes),
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<&[u8]> for Content {
    fn from(bytes: &[u8]) -> Self {
        Self::Binary(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Content {
    fn from(bytes: &[u8; N]) -> Self {
        Self::Binary(bytes.to_vec())
    }
}

impl PartialEq<str> for Content {
    fn eq(&self, other: &str) -> bool {
        self.as_text() == Some(other)
    }
}

impl PartialEq<&str> for Content {
    fn eq(&self, other: &&str) -> bool {
        self.as_text() == Some(*other)
    }
}

impl PartialEq<[u8]> for Content {
    fn eq(&self, other: &[u8]) -> bool {
        matches!(self, Self::Binary(bytes) if bytes.as_slice() == other)
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for Content {
    fn eq(&self, other: &&[u8; N]) -> bool {
        matches!(self, Self::Binary(bytes) if bytes.as_slice() == other.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_pick_variant() {
        assert!(Content::from("abc").is_text());
        assert!(Content::from(String::from("abc")).is_text());
        assert!(Content::from(b"abc").is_binary());
        assert!(Content::from(vec![0u8, 1]).is_binary());
    }

    #[test]
    fn test_text_and_bytes_never_compare_equal() {
        let text = Content::from("abc");
        let bytes = Content::from(b"abc");
        assert_ne!(text, bytes);
        assert_eq!(text.as_bytes(), bytes.as_bytes());
        assert_eq!(text, "abc");
        assert_eq!(bytes, b"abc");
    }

    #[test]
    fn test_lossy_view() {
        let bytes = Content::from(vec![b'a', 0xff]);
        assert_eq!(bytes.to_string_lossy(), "a\u{fffd}");
        assert_eq!(bytes.len(), 2);
        assert!(bytes.as_text().is_none());
    }
}
