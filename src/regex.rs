//! Re-exports from either `regex` or `regex_lite`, depending on features.
//!
//! Patterns in this crate stick to the syntax both engines share. Digits and
//! word characters are spelled as ASCII classes (`[0-9]`, `[:punct:]`)
//! since `regex` reads `\d` and `\w` as Unicode classes and `regex-lite`
//! does not.

#[cfg(feature = "lite")]
pub(crate) use regex_lite::{Captures, Regex};
#[cfg(all(feature = "regex", not(feature = "lite")))]
pub(crate) use regex::{Captures, Regex};

#[cfg(not(any(feature = "regex", feature = "lite")))]
compile_error!("marc2bib requires the \"regex\" or \"lite\" feature to be enabled");
