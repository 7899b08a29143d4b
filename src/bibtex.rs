//! Rendering of tag values as a BibTeX entry.

use crate::error::{ConvertError, Result};
use crate::mapper::TagValueSet;
use itertools::Itertools;
use std::fmt;

/// Citation key of an entry.
pub enum BibKey {
    /// A key given verbatim.
    Fixed(String),
    /// A key computed from the final tag values.
    Derived(Box<dyn Fn(&TagValueSet) -> String + Send + Sync>),
}

impl BibKey {
    /// Builds a key computed from the tag values.
    pub fn derived<F>(func: F) -> Self
    where
        F: Fn(&TagValueSet) -> String + Send + Sync + 'static,
    {
        BibKey::Derived(Box::new(func))
    }

    /// Resolves the key for the given tag values.
    pub fn resolve(&self, tags: &TagValueSet) -> String {
        match self {
            BibKey::Fixed(key) => key.clone(),
            BibKey::Derived(func) => func(tags),
        }
    }
}

impl fmt::Debug for BibKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BibKey::Fixed(key) => f.debug_tuple("Fixed").field(key).finish(),
            BibKey::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

impl From<&str> for BibKey {
    fn from(key: &str) -> Self {
        BibKey::Fixed(key.to_string())
    }
}

impl From<String> for BibKey {
    fn from(key: String) -> Self {
        BibKey::Fixed(key)
    }
}

/// Author-date key: lowercased surname of the first author (or editor)
/// followed by the year, e.g. `hargittai2009`.
///
/// # Errors
///
/// Returns [`ConvertError::MissingKeyTag`] when neither author nor editor,
/// or the year, is present.
pub fn author_date_key(tags: &TagValueSet) -> Result<String> {
    let names = tags
        .get("author")
        .or_else(|| tags.get("editor"))
        .ok_or_else(|| ConvertError::MissingKeyTag("author".to_string()))?;
    let year = tags
        .get("year")
        .ok_or_else(|| ConvertError::MissingKeyTag("year".to_string()))?;

    let surname = names.split(',').next().unwrap_or_default().trim();
    Ok(format!("{}{year}", surname.to_lowercase()))
}

/// Renders `tags` as an entry of type `bibtype`.
///
/// Tags are written in lexicographic order, one per line, indented by
/// `indent` spaces. With `align`, tag names are padded to the longest one
/// so that the `=` signs line up. Without `key`, the author-date key is used.
///
/// # Errors
///
/// Returns [`ConvertError::MissingKeyTag`] when the key has to be derived
/// and the needed tags are missing.
pub fn tags_to_bibtex(
    tags: &TagValueSet,
    bibtype: &str,
    key: Option<&BibKey>,
    indent: usize,
    align: bool,
) -> Result<String> {
    let key = match key {
        Some(key) => key.resolve(tags),
        None => author_date_key(tags)?,
    };

    let width = if align {
        tags.tags().map(str::len).max().unwrap_or(0)
    } else {
        0
    };

    let body = tags
        .iter()
        .map(|(tag, value)| format!(",\n{:indent$}{tag:<width$} = {{{value}}}", ""))
        .join("");

    Ok(format!("@{bibtype}{{{key}{body}\n}}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn hargittai_tags() -> TagValueSet {
        let mut tags = TagValueSet::new();
        tags.insert("author", "Hargittai, István");
        tags.insert("publisher", "Springer");
        tags.insert("title", "Symmetry through the eyes of a chemist");
        tags.insert("year", "2009");
        tags
    }

    #[test]
    fn test_default_format() {
        let entry = tags_to_bibtex(&hargittai_tags(), "book", None, 1, false).unwrap();
        assert_eq!(
            entry,
            "@book{hargittai2009,\n author = {Hargittai, István},\n publisher = {Springer},\n title = {Symmetry through the eyes of a chemist},\n year = {2009}\n}\n"
        );
    }

    #[test]
    fn test_indent_and_align() {
        let entry = tags_to_bibtex(&hargittai_tags(), "book", None, 2, true).unwrap();
        assert_eq!(
            entry,
            "@book{hargittai2009,\n  author    = {Hargittai, István},\n  publisher = {Springer},\n  title     = {Symmetry through the eyes of a chemist},\n  year      = {2009}\n}\n"
        );
    }

    #[test]
    fn test_fixed_and_derived_keys() {
        let tags = hargittai_tags();
        let fixed = BibKey::from("meow");
        let entry = tags_to_bibtex(&tags, "book", Some(&fixed), 1, false).unwrap();
        assert!(entry.starts_with("@book{meow,\n"));

        let derived = BibKey::derived(|tags| format!("{}-key", tags.get("year").unwrap_or("")));
        let entry = tags_to_bibtex(&tags, "misc", Some(&derived), 1, false).unwrap();
        assert!(entry.starts_with("@misc{2009-key,\n"));
    }

    #[test]
    fn test_editor_key() {
        let mut tags = TagValueSet::new();
        tags.insert("editor", "Tsing, Anna Lowenhaupt and Swanson, Heather Anne");
        tags.insert("year", "2017");
        assert_eq!(author_date_key(&tags).unwrap(), "tsing2017");
    }

    #[rstest]
    #[case("title", "author")]
    #[case("author", "year")]
    fn test_missing_key_tag(#[case] present: &str, #[case] missing: &str) {
        let mut tags = TagValueSet::new();
        tags.insert(present, "Hargittai, István");
        assert_eq!(
            tags_to_bibtex(&tags, "book", None, 1, false).unwrap_err(),
            ConvertError::MissingKeyTag(missing.to_string())
        );
    }

    #[test]
    fn test_empty_tags_with_fixed_key() {
        let key = BibKey::from("empty");
        let entry = tags_to_bibtex(&TagValueSet::new(), "book", Some(&key), 1, true).unwrap();
        assert_eq!(entry, "@book{empty\n}\n");
    }
}
