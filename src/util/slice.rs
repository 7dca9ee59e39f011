use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

use bytes::Bytes;

/// Non-owning view over a byte sequence supplied by the host.
///
/// A `Slice` never outlives the buffer it was built from, so the engine can
/// be handed the host's bytes directly. Converting back (`data()`) returns
/// the same borrowed bytes; only `to_vec`/`to_bytes` copy.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slice<'a> {
    data: &'a [u8],
}

impl<'a> Slice<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Slice { data }
    }

    pub const fn empty() -> Self {
        Slice { data: &[] }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytewise comparison. Column families opened with a custom comparator
    /// order keys by that comparator instead.
    pub fn compare(&self, other: &Slice<'_>) -> Ordering {
        self.data.cmp(other.data)
    }

    pub fn starts_with(&self, prefix: &Slice<'_>) -> bool {
        self.data.starts_with(prefix.data)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Owned copy in the host's buffer type.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.data)
    }
}

impl Default for Slice<'_> {
    fn default() -> Self {
        Slice::empty()
    }
}

impl<'a> From<&'a [u8]> for Slice<'a> {
    fn from(data: &'a [u8]) -> Self {
        Slice::new(data)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Slice<'a> {
    fn from(data: &'a [u8; N]) -> Self {
        Slice::new(data.as_slice())
    }
}

impl<'a> From<&'a Vec<u8>> for Slice<'a> {
    fn from(data: &'a Vec<u8>) -> Self {
        Slice::new(data.as_slice())
    }
}

impl<'a> From<&'a Bytes> for Slice<'a> {
    fn from(data: &'a Bytes) -> Self {
        Slice::new(data.as_ref())
    }
}

impl<'a> From<&'a str> for Slice<'a> {
    fn from(s: &'a str) -> Self {
        Slice::new(s.as_bytes())
    }
}

impl<'a> From<&'a String> for Slice<'a> {
    fn from(s: &'a String) -> Self {
        Slice::new(s.as_bytes())
    }
}

impl AsRef<[u8]> for Slice<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data
    }
}

impl Deref for Slice<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data
    }
}

impl PartialOrd for Slice<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slice<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Debug for Slice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(self.data) {
            Ok(s) => write!(f, "Slice(\"{s}\")"),
            Err(_) => write!(f, "Slice({:?})", self.data),
        }
    }
}

impl fmt::Display for Slice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(self.data) {
            Ok(s) => write!(f, "{s}"),
            Err(_) => write!(f, "{:?}", self.data),
        }
    }
}
