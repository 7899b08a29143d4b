//! Tag-functions: extraction of BibTeX tag values from MARC records.
//!
//! Every BibTeX tag is filled by a [`TagFunction`], which reads the record
//! and reports one of three outcomes ([`Extracted`]): a value, no value, or
//! a failure. The built-in functions below cover the tags of a book entry.
//! They return the raw field content; punctuation removal and LaTeX
//! escaping happen later, in the hooks.
//!
//! | Tag       | Source                                             |
//! |-----------|----------------------------------------------------|
//! | author    | 100/110/111/720 `$a`                               |
//! | editor    | 700 `$a` of editors, joined with `and`             |
//! | title     | 245 `$a`                                           |
//! | subtitle  | 245 `$b`                                           |
//! | publisher | imprint `$b` (260, or 264 with 2nd indicator `1`)  |
//! | year      | imprint `$c` without a copyright marker            |
//! | address   | imprint `$a` without enclosing brackets            |
//! | edition   | 250 `$a`                                           |
//! | volume    | 300 `$a`, `v. N`                                   |
//! | volumes   | 300 `$a`, `N v.`                                   |
//! | pages     | 300 `$a`, `N p.` or `N-M p.`                       |
//! | series    | 490 `$a`                                           |
//! | isbn      | record ISBN                                        |
//! | note      | not implemented                                    |

mod extent;

use crate::error::ExtractError;
use crate::punctuation::strip_outer_square_brackets;
use crate::record::{MarcField, MarcRecord, imprint_subfield};
use itertools::Itertools;
use std::fmt;

/// Result of a tag-function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// The tag has this value.
    Value(String),
    /// The record carries no data for the tag.
    Absent,
    /// The function could not produce a value.
    Failed(ExtractError),
}

impl Extracted {
    pub fn value(&self) -> Option<&str> {
        match self {
            Extracted::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Extracted::Absent)
    }
}

impl From<String> for Extracted {
    fn from(value: String) -> Self {
        Extracted::Value(value)
    }
}

impl From<&str> for Extracted {
    fn from(value: &str) -> Self {
        Extracted::Value(value.to_string())
    }
}

impl<T: Into<String>> From<Option<T>> for Extracted {
    fn from(value: Option<T>) -> Self {
        value.map_or(Extracted::Absent, |value| Extracted::Value(value.into()))
    }
}

impl From<ExtractError> for Extracted {
    fn from(err: ExtractError) -> Self {
        Extracted::Failed(err)
    }
}

/// Extracts the value of one BibTeX tag from a record.
pub trait TagFunction: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    fn extract(&self, record: &dyn MarcRecord) -> Extracted;
}

impl<T: TagFunction + ?Sized> TagFunction for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn extract(&self, record: &dyn MarcRecord) -> Extracted {
        (**self).extract(record)
    }
}

/// Signature of the built-in tag-functions.
pub type BuiltinFn = fn(&dyn MarcRecord) -> Extracted;

/// A named built-in tag-function.
#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    func: BuiltinFn,
}

impl Builtin {
    pub const fn new(name: &'static str, func: BuiltinFn) -> Self {
        Self { name, func }
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl TagFunction for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn extract(&self, record: &dyn MarcRecord) -> Extracted {
        (self.func)(record)
    }
}

/// A tag-function backed by a closure, see [`tagfunc_fn`].
pub struct FnTagFunction<F> {
    name: String,
    func: F,
}

impl<F> fmt::Debug for FnTagFunction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTagFunction")
            .field("name", &self.name)
            .finish()
    }
}

impl<F, R> TagFunction for FnTagFunction<F>
where
    F: Fn(&dyn MarcRecord) -> R + Send + Sync,
    R: Into<Extracted>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, record: &dyn MarcRecord) -> Extracted {
        (self.func)(record).into()
    }
}

/// Builds a named tag-function from a closure.
///
/// The closure may return anything convertible into [`Extracted`]: a
/// `String`, an `Option<String>`, an [`ExtractError`] or `Extracted` itself.
///
/// ```
/// use marc2bib::tagfuncs::{tagfunc_fn, TagFunction};
/// use marc2bib::{Extracted, Record};
///
/// let meow = tagfunc_fn("meow", |_record| "Meow");
/// assert_eq!(meow.extract(&Record::new()), Extracted::Value("Meow".to_string()));
/// ```
pub fn tagfunc_fn<F, R>(name: &str, func: F) -> FnTagFunction<F>
where
    F: Fn(&dyn MarcRecord) -> R + Send + Sync,
    R: Into<Extracted>,
{
    FnTagFunction {
        name: name.to_string(),
        func,
    }
}

/// Tag-functions for the required tags of a book entry.
pub static BOOK_REQ_TAGFUNCS: &[(&str, Builtin)] = &[
    ("author", Builtin::new("get_author", get_author)),
    ("publisher", Builtin::new("get_publisher", get_publisher)),
    ("title", Builtin::new("get_title", get_title)),
    ("year", Builtin::new("get_year", get_year)),
];

/// Tag-functions for the optional tags of a book entry.
pub static BOOK_OPT_TAGFUNCS: &[(&str, Builtin)] = &[
    ("address", Builtin::new("get_address", get_address)),
    ("editor", Builtin::new("get_editor", get_editor)),
    ("edition", Builtin::new("get_edition", get_edition)),
    ("volume", Builtin::new("get_volume", get_volume)),
    ("volumes", Builtin::new("get_volumes", get_volumes)),
    ("note", Builtin::new("get_note", get_note)),
    ("number", Builtin::new("get_volume", get_volume)),
    ("pages", Builtin::new("get_pages", get_pages)),
    ("series", Builtin::new("get_series", get_series)),
    ("subtitle", Builtin::new("get_subtitle", get_subtitle)),
    ("isbn", Builtin::new("get_isbn", get_isbn)),
];

/// Optional tags only BibLaTeX offers.
pub static BIBLATEX_OPT_TAGFUNCS: &[(&str, Builtin)] =
    &[("date", Builtin::new("get_year", get_year))];

/// Tags renamed in BibLaTeX output, as `(bibtex, biblatex)`.
pub static BIBLATEX_RENAMES: &[(&str, &str)] = &[("address", "location")];

/// Looks up a built-in tag-function by tag.
pub fn builtin(tag: &str) -> Option<Builtin> {
    BOOK_REQ_TAGFUNCS
        .iter()
        .chain(BOOK_OPT_TAGFUNCS)
        .find(|(name, _)| *name == tag)
        .map(|(_, func)| *func)
}

fn subfield_of(record: &dyn MarcRecord, tag: &str, code: char) -> Extracted {
    record
        .get_field(tag)
        .and_then(|field| field.subfield(code))
        .into()
}

fn strip_trailing_comma(value: &str) -> &str {
    let value = value.trim_end();
    value.strip_suffix(',').unwrap_or(value)
}

const AUTHOR_TAGS: &[&str] = &["100", "110", "111", "720"];

/// Main entry heading: personal, corporate or meeting name, else an
/// uncontrolled name.
///
/// An uncontrolled name (720) with second indicator `2` is not the main
/// author and yields no value.
pub fn get_author(record: &dyn MarcRecord) -> Extracted {
    let Some(field) = AUTHOR_TAGS.iter().find_map(|tag| record.get_field(tag)) else {
        return Extracted::Absent;
    };

    if field.tag() == "720" && field.indicator2() == '2' {
        return Extracted::Absent;
    }

    field.subfield('a').into()
}

const EDITOR_RELATORS: &[&str] = &["edt", "ed", "eds", "editor", "editors"];

fn is_editor(field: &dyn MarcField) -> bool {
    let relators = field
        .subfields('e')
        .into_iter()
        .chain(field.subfields('4'))
        .map(|relator| {
            relator
                .trim()
                .trim_end_matches(['.', ','])
                .to_lowercase()
        })
        .collect_vec();

    relators.is_empty()
        || relators
            .iter()
            .any(|relator| EDITOR_RELATORS.contains(&relator.as_str()))
}

/// Added personal names acting as editors, joined with ` and `.
///
/// A 700 field without relator term or code counts as an editor.
pub fn get_editor(record: &dyn MarcRecord) -> Extracted {
    let editors = record
        .get_fields("700")
        .into_iter()
        .filter(|field| is_editor(*field))
        .filter_map(|field| field.subfield('a'))
        .map(|name| strip_trailing_comma(name.trim()))
        .filter(|name| !name.is_empty())
        .join(" and ");

    if editors.is_empty() {
        Extracted::Absent
    } else {
        Extracted::Value(editors)
    }
}

pub fn get_title(record: &dyn MarcRecord) -> Extracted {
    subfield_of(record, "245", 'a')
}

pub fn get_subtitle(record: &dyn MarcRecord) -> Extracted {
    subfield_of(record, "245", 'b')
}

pub fn get_publisher(record: &dyn MarcRecord) -> Extracted {
    record
        .publisher()
        .or_else(|| imprint_subfield(record, 'b').map(str::to_string))
        .into()
}

/// Publication date of the imprint, without a leading copyright or
/// phonogram marker (`c2009`, `©2009`, `p1998`, `℗1998`).
pub fn get_year(record: &dyn MarcRecord) -> Extracted {
    record
        .pubyear()
        .or_else(|| imprint_subfield(record, 'c').map(str::to_string))
        .map(|year| strip_copyright_marker(&year).to_string())
        .into()
}

fn strip_copyright_marker(year: &str) -> &str {
    let year = year.trim();
    match year.strip_prefix(['c', '©', 'p', '℗']) {
        Some(rest) if rest.trim_start().starts_with(|c: char| c.is_ascii_digit()) => {
            rest.trim_start()
        }
        _ => year,
    }
}

/// Place of publication, with cataloger-supplied brackets removed.
pub fn get_address(record: &dyn MarcRecord) -> Extracted {
    imprint_subfield(record, 'a')
        .map(strip_outer_square_brackets)
        .into()
}

pub fn get_edition(record: &dyn MarcRecord) -> Extracted {
    subfield_of(record, "250", 'a')
}

fn extent_of(record: &dyn MarcRecord) -> Option<&str> {
    record.get_field("300").and_then(|field| field.subfield('a'))
}

/// Volume number from the physical description, e.g. `v. 2`.
pub fn get_volume(record: &dyn MarcRecord) -> Extracted {
    extent_of(record).and_then(extent::parse_volume).into()
}

/// Number of volumes from the physical description, e.g. `4 v.`.
pub fn get_volumes(record: &dyn MarcRecord) -> Extracted {
    extent_of(record).and_then(extent::parse_volumes).into()
}

/// Page count or range from the physical description.
pub fn get_pages(record: &dyn MarcRecord) -> Extracted {
    extent_of(record).and_then(extent::parse_pages).into()
}

pub fn get_series(record: &dyn MarcRecord) -> Extracted {
    record
        .get_field("490")
        .and_then(|field| field.subfield('a'))
        .map(strip_trailing_comma)
        .into()
}

pub fn get_isbn(record: &dyn MarcRecord) -> Extracted {
    record.isbn().into()
}

pub fn get_note(_record: &dyn MarcRecord) -> Extracted {
    Extracted::Failed(ExtractError::NotImplemented)
}
