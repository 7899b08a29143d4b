//! Conversion of MARC 21 bibliographic records to BibTeX and BibLaTeX entries.
//!
//! `marc2bib` reads the fields of a catalog record, maps them to the tags of
//! a book entry and renders the entry. Along the way it removes the ISBD
//! punctuation that catalogers transcribe (`Springer,`, `Title /`) without
//! touching the punctuation that belongs to the text (`Hargittai, I.`,
//! `3rd ed.`), and escapes the result for LaTeX.
//!
//! # Key Features
//!
//! - **Tag-functions**: one extractor per tag, overridable and extensible
//!   per conversion ([`tagfuncs`])
//! - **Author/editor fallback**: entries of edited volumes get an `editor`
//!   tag and an editor-based key
//! - **Hooks**: composable `(tag, value)` transforms run on every tag
//!   ([`hooks`])
//! - **BibTeX and BibLaTeX** dialects
//! - **MARCXML** input behind the `xml` feature ([`marcxml`])
//! - **Parallel batches** with rayon behind the `parallel` feature
//!
//! # Basic Usage
//!
//! ```rust
//! use marc2bib::{convert, DataField, Record};
//!
//! let record = Record::builder()
//!     .field(DataField::builder("100", '1', ' ').subfield('a', "Hargittai, István.").build())
//!     .field(
//!         DataField::builder("245", '1', '0')
//!             .subfield('a', "Symmetry through the eyes of a chemist /")
//!             .build(),
//!     )
//!     .field(
//!         DataField::builder("260", ' ', ' ')
//!             .subfield('a', "[Dordrecht] :")
//!             .subfield('b', "Springer,")
//!             .subfield('c', "c2009.")
//!             .build(),
//!     )
//!     .build();
//!
//! let entry = convert(&record).unwrap();
//! assert_eq!(
//!     entry,
//!     "@book{hargittai2009,\n author = {Hargittai, István},\n publisher = {Springer},\n title = {Symmetry through the eyes of a chemist},\n year = {2009}\n}\n"
//! );
//! ```
//!
//! # Customizing the Conversion
//!
//! ```rust
//! use marc2bib::hooks::{apply_not_for_tags, EncloseInCurlyBraces};
//! use marc2bib::tagfuncs::tagfunc_fn;
//! use marc2bib::{ConvertConfig, Converter, Include, MarcRecord};
//!
//! let converter = Converter::new()
//!     .with_config(ConvertConfig {
//!         include: Include::tags(["edition", "pages"]),
//!         indent: 2,
//!         align: true,
//!         ..Default::default()
//!     })
//!     .with_tagfunc(
//!         "url",
//!         tagfunc_fn("get_url", |record: &dyn MarcRecord| {
//!             record.get_field("856").and_then(|f| f.subfield('u')).map(str::to_string)
//!         }),
//!     )
//!     .with_post_hook(apply_not_for_tags(EncloseInCurlyBraces, ["year"]))
//!     .with_bibkey("Hargittai2009Symmetry");
//! # let _ = converter;
//! ```
//!
//! # Error Handling
//!
//! Every fallible operation returns the crate [`Result`] wrapping
//! [`ConvertError`]:
//!
//! ```rust
//! use marc2bib::{convert, ConvertError, Record};
//!
//! match convert(&Record::new()) {
//!     Ok(entry) => println!("{entry}"),
//!     Err(ConvertError::MissingAuthorAndEditor) => eprintln!("Record has no author"),
//!     Err(e) => eprintln!("Other error: {e}"),
//! }
//! ```
//!
//! # Logging
//!
//! The crate logs through `tracing`: a `warn` event for every tag without
//! content and `debug` events for hook runs. No subscriber is installed.
//!
//! # Thread Safety
//!
//! Tag-functions and hooks are `Send + Sync`, so a [`Converter`] can be
//! shared between threads.

pub mod bibtex;
pub mod convert;
pub mod error;
pub mod hooks;
pub mod mapper;
#[cfg(feature = "xml")]
pub mod marcxml;
pub mod punctuation;
pub mod record;
pub mod tagfuncs;
mod regex;

// Reexports
pub use bibtex::{BibKey, tags_to_bibtex};
pub use convert::{ConvertConfig, Converter, convert};
pub use error::{ConvertError, ExtractError, Result};
pub use hooks::{Hook, HookChain};
pub use mapper::{Dialect, Include, MapOptions, TagValueSet, map_tags};
pub use punctuation::{Normalizer, remove_isbd_punctuation};
pub use record::{DataField, MarcField, MarcRecord, Record, Subfield};
pub use tagfuncs::{Extracted, TagFunction};
#[cfg(feature = "xml")]
pub use marcxml::parse_marcxml;
