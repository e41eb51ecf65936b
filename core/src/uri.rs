//! Resource identifiers split around a marker token.
//!
//! A `Uri` is the string `base + reference`, where `reference` starts at the
//! last occurrence of a caller-chosen marker such as `"/node/"`. The base is
//! the service root shared by related resources; the reference is the part
//! that identifies this one.

use std::fmt;

/// A URI held as base and reference halves.
#[derive(Debug, Clone, Eq)]
pub struct Uri {
    base: String,
    reference: String,
}

impl Uri {
    /// Split `uri` at the last occurrence of `marker`.
    ///
    /// With no occurrence the base is empty and the reference holds the whole
    /// string. An empty marker never matches.
    pub fn split(uri: &str, marker: &str) -> Self {
        match uri.rfind(marker).filter(|_| !marker.is_empty()) {
            Some(index) => Self {
                base: uri[..index].to_string(),
                reference: uri[index..].to_string(),
            },
            None => Self {
                base: String::new(),
                reference: uri.to_string(),
            },
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.reference)
    }
}

// Equality is over the rendered string: the same URI split at different
// markers still compares equal.
impl PartialEq for Uri {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl PartialEq<str> for Uri {
    fn eq(&self, other: &str) -> bool {
        self.base.len() + self.reference.len() == other.len()
            && other.starts_with(&self.base)
            && other.ends_with(&self.reference)
    }
}

impl PartialEq<&str> for Uri {
    fn eq(&self, other: &&str) -> bool {
        *self == **other
    }
}
