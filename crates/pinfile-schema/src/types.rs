//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// A package name exactly as written in a manifest.
    ///
    /// Comparisons between packages must go through [`PackageName::canonical`];
    /// `Foo_Bar`, `foo-bar` and `foo.bar` all name the same package.
    PackageName
);

string_newtype!(
    /// Full 64-character hex blake3 digest of a resolved pin set.
    Fingerprint
);

string_newtype!(
    /// Truncated 12-character prefix of a [`Fingerprint`], used for display.
    ShortFingerprint
);

impl PackageName {
    /// Lowercase the name and collapse every run of `-`, `_` and `.` into a single `-`.
    pub fn canonical(&self) -> String {
        canonicalize_name(&self.0)
    }
}

pub(crate) fn canonicalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
                in_separator = true;
            }
        } else {
            out.push(c.to_ascii_lowercase());
            in_separator = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_name_display_and_as_ref() {
        let name = PackageName::new("pluggy");
        assert_eq!(name.to_string(), "pluggy");
        assert_eq!(name.as_str(), "pluggy");
        assert_eq!(AsRef::<str>::as_ref(&name), "pluggy");
    }

    #[test]
    fn canonical_lowercases_and_collapses_separators() {
        assert_eq!(PackageName::new("Sphinx_RTD.theme").canonical(), "sphinx-rtd-theme");
        assert_eq!(PackageName::new("zope..interface").canonical(), "zope-interface");
        assert_eq!(PackageName::new("a-_.b").canonical(), "a-b");
        assert_eq!(PackageName::new("PyYAML").canonical(), "pyyaml");
    }

    #[test]
    fn equivalent_spellings_share_canonical_form() {
        let a = PackageName::new("flake8_docstrings");
        let b = PackageName::new("Flake8-Docstrings");
        assert_ne!(a, b);
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn fingerprint_serde_roundtrip() {
        let fp = Fingerprint::new("deadbeef");
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, "\"deadbeef\"");
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    #[test]
    fn short_fingerprint_into_inner() {
        let short = ShortFingerprint::from("abc123def456");
        assert_eq!(short.into_inner(), "abc123def456");
    }
}
