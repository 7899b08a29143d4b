//! Record to entry conversion.
//!
//! [`Converter`] bundles everything a conversion needs: plain settings in a
//! [`ConvertConfig`], caller tag-functions and post hooks, and the citation
//! key. [`convert`] runs a converter with the default settings.
//!
//! # Example
//!
//! ```
//! use marc2bib::{ConvertConfig, Converter, DataField, Include, Record};
//!
//! let record = Record::builder()
//!     .field(DataField::builder("100", '1', ' ').subfield('a', "Hargittai, István.").build())
//!     .field(
//!         DataField::builder("245", '1', '0')
//!             .subfield('a', "Symmetry through the eyes of a chemist /")
//!             .build(),
//!     )
//!     .field(DataField::builder("250", ' ', ' ').subfield('a', "3rd ed.").build())
//!     .field(
//!         DataField::builder("260", ' ', ' ')
//!             .subfield('b', "Springer,")
//!             .subfield('c', "c2009.")
//!             .build(),
//!     )
//!     .build();
//!
//! let config = ConvertConfig {
//!     include: Include::tags(["edition"]),
//!     align: true,
//!     ..Default::default()
//! };
//! let converter = Converter::new().with_config(config);
//! let entry = converter.convert(&record).unwrap();
//! assert!(entry.contains(" edition   = {3rd ed.},\n"));
//! ```

use crate::bibtex::{BibKey, tags_to_bibtex};
use crate::error::Result;
use crate::hooks::Hook;
use crate::mapper::{Dialect, Include, MapOptions, TagValueSet, map_tags};
use crate::punctuation::{DEFAULT_ABBREVIATIONS, Normalizer};
use crate::record::MarcRecord;
use crate::tagfuncs::TagFunction;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static DEFAULT_CONVERTER: LazyLock<Converter> = LazyLock::new(Converter::new);

/// Converts a record to a BibTeX book entry with the default settings.
///
/// The entry holds the required tags only and an author-date key.
///
/// # Errors
///
/// See [`Converter::convert`].
pub fn convert(record: &dyn MarcRecord) -> Result<String> {
    DEFAULT_CONVERTER.convert(record)
}

/// Plain conversion settings.
///
/// All fields have defaults, so a partial configuration deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Entry type, e.g. `book`.
    pub bibtype: String,
    pub include: Include,
    /// Keep tags whose final value is blank.
    pub allow_blank: bool,
    /// Remove trailing ISBD punctuation.
    pub remove_punctuation: bool,
    /// Escape LaTeX special characters and normalize ranges.
    pub latexify: bool,
    /// Spaces before each tag line.
    pub indent: usize,
    /// Pad tag names so that values line up.
    pub align: bool,
    pub dialect: Dialect,
    /// Abbreviations protected from punctuation removal.
    pub abbreviations: Vec<String>,
    /// Convert batches with rayon. Needs the `parallel` feature.
    pub run_in_parallel: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            bibtype: "book".to_string(),
            include: Include::Required,
            allow_blank: false,
            remove_punctuation: true,
            latexify: true,
            indent: 1,
            align: false,
            dialect: Dialect::BibTex,
            abbreviations: DEFAULT_ABBREVIATIONS.iter().map(ToString::to_string).collect(),
            run_in_parallel: false,
        }
    }
}

/// Converts MARC records to BibTeX or BibLaTeX entries.
#[derive(Debug, Default)]
pub struct Converter {
    config: ConvertConfig,
    options: MapOptions,
    bibkey: Option<BibKey>,
}

impl Converter {
    /// Creates a converter with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration. Tag-functions, hooks and key set on the
    /// converter are kept.
    #[must_use]
    pub fn with_config(mut self, config: ConvertConfig) -> Self {
        if config.run_in_parallel && cfg!(not(feature = "parallel")) {
            tracing::warn!("run_in_parallel is set but the `parallel` feature is disabled");
        }

        self.options.include = config.include.clone();
        self.options.allow_blank = config.allow_blank;
        self.options.remove_punctuation = config.remove_punctuation;
        self.options.latexify = config.latexify;
        self.options.dialect = config.dialect;
        self.options.normalizer = Normalizer::with_abbreviation_list(&config.abbreviations);
        self.config = config;
        self
    }

    /// Uses a fixed or derived citation key instead of the author-date one.
    #[must_use]
    pub fn with_bibkey(mut self, bibkey: impl Into<BibKey>) -> Self {
        self.bibkey = Some(bibkey.into());
        self
    }

    /// Uses `func` for `tag`, overriding a built-in tag-function or adding
    /// a new tag.
    #[must_use]
    pub fn with_tagfunc<F: TagFunction + 'static>(mut self, tag: &str, func: F) -> Self {
        self.options = self.options.with_tagfunc(tag, func);
        self
    }

    /// Appends a hook run on every tag value after the built-in ones.
    #[must_use]
    pub fn with_post_hook<H: Hook + 'static>(mut self, hook: H) -> Self {
        self.options = self.options.with_post_hook(hook);
        self
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Maps a record to its final tag values without rendering them.
    ///
    /// # Errors
    ///
    /// See [`map_tags`].
    pub fn map(&self, record: &dyn MarcRecord) -> Result<TagValueSet> {
        map_tags(record, &self.options)
    }

    /// Converts a record to an entry.
    ///
    /// # Errors
    ///
    /// Fails when the tags cannot be mapped (see [`map_tags`]) or the
    /// citation key cannot be derived.
    pub fn convert(&self, record: &dyn MarcRecord) -> Result<String> {
        let tags = self.map(record)?;
        tags_to_bibtex(
            &tags,
            &self.config.bibtype,
            self.bibkey.as_ref(),
            self.config.indent,
            self.config.align,
        )
    }

    /// Converts every record, keeping the input order.
    ///
    /// A failing record does not affect the others.
    pub fn convert_all<R>(&self, records: &[R]) -> Vec<Result<String>>
    where
        R: MarcRecord + Sync,
    {
        #[cfg(feature = "parallel")]
        {
            if self.config.run_in_parallel {
                use rayon::prelude::*;

                return records
                    .par_iter()
                    .map(|record| self.convert(record))
                    .collect();
            }
        }

        records.iter().map(|record| self.convert(record)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;
    use crate::hooks::{EncloseInCurlyBraces, apply_not_for_tags, hook_fn};
    use crate::record::{DataField, Record};
    use crate::tagfuncs::tagfunc_fn;
    use pretty_assertions::assert_eq;

    fn hargittai() -> Record {
        Record::builder()
            .control_field("001", "8888814")
            .field(
                DataField::builder("020", ' ', ' ')
                    .subfield('a', "9781402056277 (hbk.)")
                    .build(),
            )
            .field(
                DataField::builder("100", '1', ' ')
                    .subfield('a', "Hargittai, István.")
                    .build(),
            )
            .field(
                DataField::builder("245", '1', '0')
                    .subfield('a', "Symmetry through the eyes of a chemist /")
                    .subfield('c', "István Hargittai, Magdolna Hargittai.")
                    .build(),
            )
            .field(
                DataField::builder("250", ' ', ' ')
                    .subfield('a', "3rd ed.")
                    .build(),
            )
            .field(
                DataField::builder("260", ' ', ' ')
                    .subfield('a', "[Dordrecht] :")
                    .subfield('b', "Springer,")
                    .subfield('c', "c2009.")
                    .build(),
            )
            .field(
                DataField::builder("300", ' ', ' ')
                    .subfield('a', "xvi, 469 p. :")
                    .build(),
            )
            .field(
                DataField::builder("700", '1', ' ')
                    .subfield('a', "Hargittai, Magdolna.")
                    .build(),
            )
            .field(
                DataField::builder("856", '4', '0')
                    .subfield('u', "http://dx.doi.org/10.1007/978-1-4020-5628-4")
                    .build(),
            )
            .build()
    }

    fn tsing() -> Record {
        Record::builder()
            .field(
                DataField::builder("245", '0', '0')
                    .subfield('a', "Arts of living on a damaged planet /")
                    .build(),
            )
            .field(
                DataField::builder("264", ' ', '1')
                    .subfield('a', "Minneapolis :")
                    .subfield('b', "University of Minnesota Press,")
                    .subfield('c', "[2017]")
                    .build(),
            )
            .field(
                DataField::builder("700", '1', ' ')
                    .subfield('a', "Tsing, Anna Lowenhaupt,")
                    .subfield('e', "editor.")
                    .build(),
            )
            .field(
                DataField::builder("700", '1', ' ')
                    .subfield('a', "Swanson, Heather Anne,")
                    .subfield('e', "editor.")
                    .build(),
            )
            .build()
    }

    fn sholokhov() -> Record {
        Record::builder()
            .field(
                DataField::builder("100", '1', ' ')
                    .subfield('a', "Sholokhov, Mikhail,")
                    .build(),
            )
            .field(
                DataField::builder("245", '1', '0')
                    .subfield('a', "Tikhiĭ Don :")
                    .subfield('b', "roman v chetyrekh knigakh /")
                    .build(),
            )
            .field(
                DataField::builder("260", ' ', ' ')
                    .subfield('a', "Moskva :")
                    .subfield('b', "Khudozh. lit-ra,")
                    .subfield('c', "1985.")
                    .build(),
            )
            .field(
                DataField::builder("300", ' ', ' ')
                    .subfield('a', "4 v. ;")
                    .build(),
            )
            .build()
    }

    #[test]
    fn test_convert_with_defaults() {
        assert_eq!(
            convert(&hargittai()).unwrap(),
            "@book{hargittai2009,\n author = {Hargittai, István},\n publisher = {Springer},\n title = {Symmetry through the eyes of a chemist},\n year = {2009}\n}\n"
        );
    }

    #[test]
    fn test_custom_bibtype_and_key() {
        let converter = Converter::new()
            .with_config(ConvertConfig {
                bibtype: "BOOK".to_string(),
                ..Default::default()
            })
            .with_bibkey("Hargittai2009Symmetry");
        let entry = converter.convert(&hargittai()).unwrap();
        assert!(entry.starts_with("@BOOK{Hargittai2009Symmetry,\n author = "));
    }

    #[test]
    fn test_derived_bibkey() {
        let converter = Converter::new().with_bibkey(BibKey::derived(|tags| {
            format!("{}:{}", tags.get("year").unwrap_or("n.d."), tags.len())
        }));
        let entry = converter.convert(&hargittai()).unwrap();
        assert!(entry.starts_with("@book{2009:4,\n"));
    }

    #[test]
    fn test_extend_tagfuncs() {
        // Digit runs of the DOI would otherwise turn into en dash ranges.
        let config = ConvertConfig {
            latexify: false,
            ..Default::default()
        };
        let converter = Converter::new().with_config(config).with_tagfunc(
            "url",
            tagfunc_fn("get_url", |record: &dyn MarcRecord| {
                record
                    .get_field("856")
                    .and_then(|field| field.subfield('u'))
                    .map(str::to_string)
            }),
        );
        let entry = converter.convert(&hargittai()).unwrap();
        assert!(entry.contains(" url = {http://dx.doi.org/10.1007/978-1-4020-5628-4},\n"));
        assert!(entry.ends_with(" year = {2009}\n}\n"));
    }

    #[test]
    fn test_editor_entry() {
        let entry = Converter::new().convert(&tsing()).unwrap();
        assert_eq!(
            entry,
            "@book{tsing[2017],\n editor = {Tsing, Anna Lowenhaupt and Swanson, Heather Anne},\n publisher = {University of Minnesota Press},\n title = {Arts of living on a damaged planet},\n year = {[2017]}\n}\n"
        );
    }

    #[test]
    fn test_editor_entry_with_stripped_year() {
        let converter = Converter::new()
            .with_post_hook(apply_not_for_tags(
                hook_fn("strip_brackets", |_: &str, value: &str| {
                    value.trim_matches(['[', ']']).to_string()
                }),
                ["title"],
            ));
        let entry = converter.convert(&tsing()).unwrap();
        assert!(entry.starts_with("@book{tsing2017,\n"));
    }

    #[test]
    fn test_all_tags_for_multivolume_set() {
        let converter = Converter::new()
            .with_config(ConvertConfig {
                include: Include::All,
                align: true,
                ..Default::default()
            })
            .with_tagfunc("note", tagfunc_fn("no_note", |_: &dyn MarcRecord| None::<String>));
        let entry = converter.convert(&sholokhov()).unwrap();
        assert_eq!(
            entry,
            "@book{sholokhov1985,\n address   = {Moskva},\n author    = {Sholokhov, Mikhail},\n publisher = {Khudozh. lit-ra},\n subtitle  = {roman v chetyrekh knigakh},\n title     = {Tikhiĭ Don},\n volumes   = {4},\n year      = {1985}\n}\n"
        );
    }

    #[test]
    fn test_biblatex_dialect() {
        let converter = Converter::new().with_config(ConvertConfig {
            dialect: Dialect::BibLatex,
            ..Default::default()
        });
        let entry = converter.convert(&hargittai()).unwrap();
        assert!(entry.contains(" location = {Dordrecht},\n"));
        assert!(!entry.contains("address"));
    }

    #[test]
    fn test_post_hooks() {
        let converter = Converter::new()
            .with_post_hook(apply_not_for_tags(EncloseInCurlyBraces, ["author", "year"]));
        let entry = converter.convert(&hargittai()).unwrap();
        assert!(entry.contains(" title = {{Symmetry through the eyes of a chemist}},\n"));
        assert!(entry.contains(" year = {2009}\n"));
    }

    #[test]
    fn test_allow_blank() {
        let converter = Converter::new()
            .with_config(ConvertConfig {
                allow_blank: true,
                ..Default::default()
            })
            .with_tagfunc("edition", tagfunc_fn("blank", |_: &dyn MarcRecord| ""));
        let entry = converter.convert(&hargittai()).unwrap();
        assert!(entry.contains(" edition = {},\n"));
    }

    #[test]
    fn test_custom_abbreviations() {
        let converter = Converter::new()
            .with_config(ConvertConfig {
                abbreviations: vec!["lit-ra,".to_string()],
                ..Default::default()
            });
        let entry = converter.convert(&sholokhov()).unwrap();
        assert!(entry.contains(" publisher = {Khudozh. lit-ra,},\n"));
    }

    #[test]
    fn test_no_author_nor_editor() {
        let record = Record::builder()
            .field(
                DataField::builder("245", '0', '0')
                    .subfield('a', "Anonymous.")
                    .build(),
            )
            .build();
        assert_eq!(convert(&record).unwrap_err(), ConvertError::MissingAuthorAndEditor);
    }

    #[test]
    fn test_convert_all_keeps_order() {
        let records = vec![hargittai(), Record::new(), sholokhov()];
        let results = Converter::new().convert_all(&records);
        assert_eq!(results.len(), 3);
        assert!(results[0].as_ref().unwrap().starts_with("@book{hargittai2009"));
        assert_eq!(results[1], Err(ConvertError::MissingAuthorAndEditor));
        assert!(results[2].as_ref().unwrap().starts_with("@book{sholokhov1985"));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_convert_all_in_parallel() {
        let records = vec![hargittai(), sholokhov(), tsing()];
        let converter = Converter::new().with_config(ConvertConfig {
            run_in_parallel: true,
            ..Default::default()
        });
        let keys = converter
            .convert_all(&records)
            .into_iter()
            .map(|entry| entry.unwrap().lines().next().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec!["@book{hargittai2009,", "@book{sholokhov1985,", "@book{tsing[2017],"]
        );
    }

    #[test]
    fn test_config_deserializes_partially() {
        let config: ConvertConfig =
            serde_json::from_str(r#"{"include": "all", "indent": 2}"#).unwrap();
        assert_eq!(config.include, Include::All);
        assert_eq!(config.indent, 2);
        assert_eq!(config.bibtype, "book");
        assert!(config.remove_punctuation);
    }
}
