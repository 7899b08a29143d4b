//! Mapping of MARC records to BibTeX tag values.
//!
//! [`map_tags`] decides which tags to compute for a record, runs their
//! tag-functions and the hook chain over the results, and collects the
//! accepted values in a [`TagValueSet`].
//!
//! The set of computed tags is built from:
//!
//! 1. the required tags of a book entry (`author`, `publisher`, `title`,
//!    `year`, plus `location` for BibLaTeX),
//! 2. the optional tags selected by [`Include`],
//! 3. the caller's tag-functions, which override or extend the above.
//!
//! The author is computed first. When it is blank, the editor takes its
//! place, and a record with neither fails with
//! [`ConvertError::MissingAuthorAndEditor`].

use crate::error::{ConvertError, Result};
use crate::hooks::{Hook, HookChain, Latexify, RemoveIsbdPunctuation};
use crate::punctuation::Normalizer;
use crate::record::MarcRecord;
use crate::tagfuncs::{
    BIBLATEX_OPT_TAGFUNCS, BIBLATEX_RENAMES, BOOK_OPT_TAGFUNCS, BOOK_REQ_TAGFUNCS, Builtin,
    Extracted, TagFunction,
};
use compact_str::CompactString;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Finalized tag values of one entry, ordered by tag name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagValueSet {
    tags: BTreeMap<CompactString, String>,
    /// Non-fatal problems met while mapping, e.g. tags without content.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

impl TagValueSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of a tag, returning the previous one.
    pub fn insert(&mut self, tag: &str, value: impl Into<String>) -> Option<String> {
        self.tags.insert(CompactString::from(tag), value.into())
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.tags.get(tag).map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    pub fn remove(&mut self, tag: &str) -> Option<String> {
        self.tags.remove(tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterates over `(tag, value)` pairs in lexicographic tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags
            .iter()
            .map(|(tag, value)| (tag.as_str(), value.as_str()))
    }

    /// Tag names in lexicographic order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(CompactString::as_str)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub(crate) fn push_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

impl<'a> IntoIterator for &'a TagValueSet {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Optional tags to compute besides the required ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Include {
    /// Required tags only.
    #[default]
    Required,
    /// Every optional tag of the dialect.
    All,
    /// The listed optional tags.
    Tags(Vec<String>),
}

impl Include {
    /// Selects the given optional tags.
    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Include::Tags(tags.into_iter().map(Into::into).collect())
    }
}

impl FromStr for Include {
    type Err = ConvertError;

    /// Parses `required`, `all` or a comma-separated list of tags.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "required" => Ok(Include::Required),
            "all" => Ok(Include::All),
            list => {
                let tags = list.split(',').map(str::trim).collect_vec();
                let is_tag = |tag: &&str| {
                    !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                };
                if tags.iter().all(is_tag) {
                    Ok(Include::tags(tags))
                } else {
                    Err(ConvertError::InvalidInclude(s.to_string()))
                }
            }
        }
    }
}

impl fmt::Display for Include {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Include::Required => f.write_str("required"),
            Include::All => f.write_str("all"),
            Include::Tags(tags) => f.write_str(&tags.join(",")),
        }
    }
}

/// Flavor of the produced entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    BibTex,
    BibLatex,
}

impl Dialect {
    /// Name of `tag` in this dialect.
    pub fn rename<'a>(&self, tag: &'a str) -> &'a str {
        match self {
            Dialect::BibTex => tag,
            Dialect::BibLatex => BIBLATEX_RENAMES
                .iter()
                .find(|(bibtex, _)| *bibtex == tag)
                .map_or(tag, |(_, biblatex)| *biblatex),
        }
    }

    /// Built-in tag-functions of the required tags, under this dialect's names.
    pub fn required_tagfuncs(&self) -> BTreeMap<&'static str, Builtin> {
        let mut tagfuncs = self.renamed(BOOK_REQ_TAGFUNCS);
        if *self == Dialect::BibLatex {
            let location = self.rename("address");
            if let Some(func) = self.optional_tagfuncs().get(location) {
                tagfuncs.insert(location, *func);
            }
        }
        tagfuncs
    }

    /// Built-in tag-functions of the optional tags, under this dialect's names.
    pub fn optional_tagfuncs(&self) -> BTreeMap<&'static str, Builtin> {
        let mut tagfuncs = self.renamed(BOOK_OPT_TAGFUNCS);
        if *self == Dialect::BibLatex {
            tagfuncs.extend(BIBLATEX_OPT_TAGFUNCS.iter().copied());
        }
        tagfuncs
    }

    fn renamed(&self, table: &[(&'static str, Builtin)]) -> BTreeMap<&'static str, Builtin> {
        table
            .iter()
            .map(|&(tag, func)| (self.rename(tag), func))
            .collect()
    }
}

impl FromStr for Dialect {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bibtex" => Ok(Dialect::BibTex),
            "biblatex" => Ok(Dialect::BibLatex),
            _ => Err(ConvertError::InvalidDialect(s.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::BibTex => f.write_str("bibtex"),
            Dialect::BibLatex => f.write_str("biblatex"),
        }
    }
}

/// Settings of [`map_tags`].
pub struct MapOptions {
    /// Caller tag-functions by tag, replacing or extending the built-in ones.
    pub tagfuncs: Vec<(String, Box<dyn TagFunction>)>,
    pub include: Include,
    /// Keep tags whose final value is blank.
    pub allow_blank: bool,
    pub remove_punctuation: bool,
    pub latexify: bool,
    /// Hooks run after the built-in ones.
    pub post_hooks: HookChain,
    pub dialect: Dialect,
    /// Abbreviations protected from punctuation removal.
    pub normalizer: Normalizer,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            tagfuncs: Vec::new(),
            include: Include::Required,
            allow_blank: false,
            remove_punctuation: true,
            latexify: true,
            post_hooks: HookChain::new(),
            dialect: Dialect::BibTex,
            normalizer: Normalizer::new(),
        }
    }
}

impl fmt::Debug for MapOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tagfuncs = self
            .tagfuncs
            .iter()
            .map(|(tag, func)| format!("{tag}: {}", func.name()))
            .collect_vec();
        f.debug_struct("MapOptions")
            .field("tagfuncs", &tagfuncs)
            .field("include", &self.include)
            .field("allow_blank", &self.allow_blank)
            .field("remove_punctuation", &self.remove_punctuation)
            .field("latexify", &self.latexify)
            .field("post_hooks", &self.post_hooks)
            .field("dialect", &self.dialect)
            .field("normalizer", &self.normalizer)
            .finish()
    }
}

impl MapOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `func` for `tag`, replacing a tag-function set before.
    #[must_use]
    pub fn with_tagfunc<F: TagFunction + 'static>(mut self, tag: &str, func: F) -> Self {
        self.tagfuncs.retain(|(existing, _)| existing != tag);
        self.tagfuncs.push((tag.to_string(), Box::new(func)));
        self
    }

    #[must_use]
    pub fn with_include(mut self, include: Include) -> Self {
        self.include = include;
        self
    }

    #[must_use]
    pub fn with_allow_blank(mut self, allow_blank: bool) -> Self {
        self.allow_blank = allow_blank;
        self
    }

    #[must_use]
    pub fn with_remove_punctuation(mut self, remove_punctuation: bool) -> Self {
        self.remove_punctuation = remove_punctuation;
        self
    }

    #[must_use]
    pub fn with_latexify(mut self, latexify: bool) -> Self {
        self.latexify = latexify;
        self
    }

    #[must_use]
    pub fn with_post_hook<H: Hook + 'static>(mut self, hook: H) -> Self {
        self.post_hooks.push(Box::new(hook));
        self
    }

    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Hooks applied to every tag value, in order.
    fn hook_chain(&self) -> HookChain {
        let mut chain = HookChain::new();
        if self.remove_punctuation {
            chain.push(Box::new(RemoveIsbdPunctuation::new(self.normalizer.clone())));
        }
        if self.latexify {
            chain.push(Box::new(Latexify));
        }
        chain
    }
}

/// Tag-functions selected for one record.
type ActiveTagFuncs<'a> = BTreeMap<String, &'a dyn TagFunction>;

fn active_tagfuncs<'a>(
    options: &'a MapOptions,
    optional: &'a BTreeMap<&'static str, Builtin>,
    required: &'a BTreeMap<&'static str, Builtin>,
) -> Result<ActiveTagFuncs<'a>> {
    let mut active: ActiveTagFuncs<'a> = required
        .iter()
        .map(|(tag, func)| (tag.to_string(), func as &dyn TagFunction))
        .collect();

    match &options.include {
        Include::Required => {}
        Include::All => {
            active.extend(
                optional
                    .iter()
                    .map(|(tag, func)| (tag.to_string(), func as &dyn TagFunction)),
            );
        }
        Include::Tags(tags) => {
            for tag in tags {
                let func = optional
                    .get(tag.as_str())
                    .ok_or_else(|| ConvertError::UnknownIncludeTag(tag.clone()))?;
                active.insert(tag.clone(), func as &dyn TagFunction);
            }
        }
    }

    for (tag, func) in &options.tagfuncs {
        active.insert(tag.clone(), &**func);
    }

    Ok(active)
}

/// Extracts the value of `tag` and runs it through the hooks.
///
/// An absent value becomes an empty string and is recorded as a warning.
fn hooked_value(
    tag: &str,
    func: &dyn TagFunction,
    record: &dyn MarcRecord,
    hooks: &HookChain,
    options: &MapOptions,
    tags: &mut TagValueSet,
) -> Result<String> {
    let raw = match func.extract(record) {
        Extracted::Value(value) => value,
        Extracted::Absent => {
            tracing::warn!(tag, "Tag content is absent, replacing it with an empty value");
            tags.push_warning(format!(
                "The content of tag `{tag}` is absent, replacing it with an empty value"
            ));
            String::new()
        }
        Extracted::Failed(err) => {
            return Err(ConvertError::from_extract(tag, func.name(), err));
        }
    };

    let value = hooks.run(tag, &raw)?;
    options.post_hooks.run(tag, &value)
}

/// Maps the fields of `record` to BibTeX tag values.
///
/// # Errors
///
/// - [`ConvertError::UnknownIncludeTag`] for an included tag without a
///   built-in tag-function
/// - [`ConvertError::MissingAuthorAndEditor`] when both are blank once the
///   hooks have run
/// - [`ConvertError::NotImplemented`] and [`ConvertError::InvalidTagValue`]
///   when a tag-function fails
/// - [`ConvertError::HookContractViolation`] when a hook returns no value
pub fn map_tags(record: &dyn MarcRecord, options: &MapOptions) -> Result<TagValueSet> {
    let required = options.dialect.required_tagfuncs();
    let optional = options.dialect.optional_tagfuncs();
    let mut active = active_tagfuncs(options, &optional, &required)?;

    let hooks = options.hook_chain();
    let mut tags = TagValueSet::new();

    // Author first: a value left blank by the hooks calls for the editor.
    let mut computed: BTreeMap<String, String> = BTreeMap::new();
    if let Some(author_func) = active.get("author").copied() {
        let author = hooked_value("author", author_func, record, &hooks, options, &mut tags)?;
        if author.trim().is_empty() {
            tracing::debug!(function = author_func.name(), "No author, falling back to editor");
            active.remove("author");

            let editor_func = active
                .get("editor")
                .copied()
                .or_else(|| {
                    optional
                        .get("editor")
                        .map(|func| func as &dyn TagFunction)
                })
                .ok_or(ConvertError::MissingAuthorAndEditor)?;
            let editor = hooked_value("editor", editor_func, record, &hooks, options, &mut tags)?;
            if editor.trim().is_empty() {
                return Err(ConvertError::MissingAuthorAndEditor);
            }
            active.insert("editor".to_string(), editor_func);
            computed.insert("editor".to_string(), editor);
        } else {
            computed.insert("author".to_string(), author);
        }
    }

    for (tag, func) in &active {
        let value = match computed.remove(tag) {
            Some(value) => value,
            None => hooked_value(tag, *func, record, &hooks, options, &mut tags)?,
        };

        if !value.trim().is_empty() || options.allow_blank {
            tags.insert(tag, value);
        } else {
            tracing::debug!(tag = tag.as_str(), "Dropping blank tag");
        }
    }

    Ok(tags)
}
