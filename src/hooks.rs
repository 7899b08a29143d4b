//! Post-processing hooks for tag values.
//!
//! A hook is a transform `(tag, value) -> value` applied to every extracted
//! tag value before it is accepted. Hooks are composed into a [`HookChain`]
//! and run strictly left to right, each one receiving the previous output.
//!
//! - [`Hook`] - The trait implemented by all hooks
//! - [`HookChain`] - Ordered collection of hooks
//! - [`hook_fn`] - Builds a hook from a closure
//! - [`apply_not_for_tags`] - Restricts a hook to all tags but a few
//!
//! # Example
//!
//! ```
//! use marc2bib::hooks::{apply_not_for_tags, compose_hooks, hook_fn, EncloseInCurlyBraces};
//!
//! let chain = compose_hooks(vec![
//!     Box::new(hook_fn("add_period", |_tag: &str, value: &str| format!("{value}."))),
//!     Box::new(apply_not_for_tags(EncloseInCurlyBraces, ["year"])),
//! ]);
//!
//! assert_eq!(chain.run("title", "Meow").unwrap(), "{Meow.}");
//! assert_eq!(chain.run("year", "2009").unwrap(), "2009.");
//! ```

use crate::error::{ConvertError, Result};
use crate::punctuation::{Normalizer, strip_outer_square_brackets};
use crate::regex::{Captures, Regex};
use std::fmt;
use std::sync::LazyLock;

/// Tags holding dates; their ranges use the ISO 8601 interval separator.
pub const DATE_TAGS: &[&str] = &["date", "eventdate", "origdate", "urldate"];

static SPECIAL_CHARACTERS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([&%#])").unwrap());

static NUMBER_RANGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)-([0-9]+)").unwrap());

static UPPERCASE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([A-Z]+)").unwrap());

/// Trait for tag value transforms.
///
/// Returning `None` breaks the hook contract and aborts the conversion with
/// [`ConvertError::HookContractViolation`].
pub trait Hook: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Transforms the value of `tag`.
    fn apply(&self, tag: &str, value: &str) -> Option<String>;

    /// Like [`Hook::apply`], with a missing value reported as an error.
    ///
    /// Hooks wrapping other hooks override this to report the innermost
    /// hook that broke the contract.
    fn try_apply(&self, tag: &str, value: &str) -> Result<String> {
        self.apply(tag, value)
            .ok_or_else(|| ConvertError::HookContractViolation {
                hook: self.name().to_string(),
                tag: tag.to_string(),
            })
    }
}

impl<H: Hook + ?Sized> Hook for Box<H> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn apply(&self, tag: &str, value: &str) -> Option<String> {
        (**self).apply(tag, value)
    }

    fn try_apply(&self, tag: &str, value: &str) -> Result<String> {
        (**self).try_apply(tag, value)
    }
}

/// A hook backed by a closure, see [`hook_fn`].
pub struct FnHook<F> {
    name: String,
    func: F,
}

impl<F> fmt::Debug for FnHook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHook").field("name", &self.name).finish()
    }
}

impl<F, R> Hook for FnHook<F>
where
    F: Fn(&str, &str) -> R + Send + Sync,
    R: Into<Option<String>>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, tag: &str, value: &str) -> Option<String> {
        (self.func)(tag, value).into()
    }
}

/// Builds a named hook from a closure returning either a `String` or an
/// `Option<String>`.
pub fn hook_fn<F, R>(name: &str, func: F) -> FnHook<F>
where
    F: Fn(&str, &str) -> R + Send + Sync,
    R: Into<Option<String>>,
{
    FnHook {
        name: name.to_string(),
        func,
    }
}

/// An ordered sequence of hooks.
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Box<dyn Hook>>,
}

impl fmt::Debug for HookChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.hook_names()).finish()
    }
}

/// Composes hooks into a single chain applied from left to right, so that
/// `compose_hooks(vec![f, g])` computes `g(f(value))`.
pub fn compose_hooks(hooks: Vec<Box<dyn Hook>>) -> HookChain {
    HookChain { hooks }
}

impl HookChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook; hooks run in the order they are added.
    pub fn push(&mut self, hook: Box<dyn Hook>) {
        self.hooks.push(hook);
    }

    #[must_use]
    pub fn with<H: Hook + 'static>(mut self, hook: H) -> Self {
        self.push(Box::new(hook));
        self
    }

    pub fn extend(&mut self, hooks: impl IntoIterator<Item = Box<dyn Hook>>) {
        self.hooks.extend(hooks);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Names of all hooks in execution order.
    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|hook| hook.name()).collect()
    }

    /// Runs every hook on `value`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::HookContractViolation`] naming the first hook
    /// that returned no value, looking into nested chains. Execution stops
    /// there.
    pub fn run(&self, tag: &str, value: &str) -> Result<String> {
        let mut value = value.to_string();
        for hook in &self.hooks {
            tracing::debug!(hook = hook.name(), tag, "Running hook");
            value = hook.try_apply(tag, &value)?;
        }
        Ok(value)
    }
}

impl Hook for HookChain {
    fn name(&self) -> &str {
        "hook_chain"
    }

    fn apply(&self, tag: &str, value: &str) -> Option<String> {
        self.run(tag, value).ok()
    }

    fn try_apply(&self, tag: &str, value: &str) -> Result<String> {
        self.run(tag, value)
    }
}

/// A hook skipped for a set of tags, see [`apply_not_for_tags`].
#[derive(Debug, Clone)]
pub struct ExceptTags<H> {
    hook: H,
    tags: Vec<String>,
}

/// Applies `hook` to all tags except the given ones, which keep their value.
pub fn apply_not_for_tags<H, I, S>(hook: H, tags: I) -> ExceptTags<H>
where
    H: Hook,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ExceptTags {
        hook,
        tags: tags.into_iter().map(Into::into).collect(),
    }
}

impl<H: Hook> Hook for ExceptTags<H> {
    fn name(&self) -> &str {
        self.hook.name()
    }

    fn apply(&self, tag: &str, value: &str) -> Option<String> {
        if self.is_excluded(tag) {
            Some(value.to_string())
        } else {
            self.hook.apply(tag, value)
        }
    }

    fn try_apply(&self, tag: &str, value: &str) -> Result<String> {
        if self.is_excluded(tag) {
            Ok(value.to_string())
        } else {
            self.hook.try_apply(tag, value)
        }
    }
}

impl<H> ExceptTags<H> {
    fn is_excluded(&self, tag: &str) -> bool {
        self.tags.iter().any(|excluded| excluded == tag)
    }
}

// Default hooks

/// Removes trailing ISBD punctuation, see [`crate::punctuation`].
#[derive(Debug, Clone, Default)]
pub struct RemoveIsbdPunctuation {
    normalizer: Normalizer,
    strip_brackets: bool,
}

impl RemoveIsbdPunctuation {
    #[must_use]
    pub fn new(normalizer: Normalizer) -> Self {
        Self {
            normalizer,
            strip_brackets: false,
        }
    }

    /// Also strip square brackets enclosing the whole value.
    #[must_use]
    pub fn strip_brackets(mut self, strip_brackets: bool) -> Self {
        self.strip_brackets = strip_brackets;
        self
    }
}

impl Hook for RemoveIsbdPunctuation {
    fn name(&self) -> &str {
        "remove_isbd_punctuation"
    }

    fn apply(&self, _tag: &str, value: &str) -> Option<String> {
        Some(self.normalizer.normalize(value, self.strip_brackets))
    }
}

/// Escapes the LaTeX special characters `&`, `%` and `#`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeSpecialCharacters;

impl Hook for EscapeSpecialCharacters {
    fn name(&self) -> &str {
        "escape_special_characters"
    }

    fn apply(&self, _tag: &str, value: &str) -> Option<String> {
        Some(SPECIAL_CHARACTERS_REGEX.replace_all(value, r"\$1").into_owned())
    }
}

/// Rewrites numeric ranges `N-M` as `N<sep>M`.
#[derive(Debug, Clone)]
pub struct NormalizeRanges {
    sep: String,
}

impl Default for NormalizeRanges {
    fn default() -> Self {
        Self::new("--")
    }
}

impl NormalizeRanges {
    #[must_use]
    pub fn new(sep: &str) -> Self {
        Self {
            sep: sep.to_string(),
        }
    }
}

impl Hook for NormalizeRanges {
    fn name(&self) -> &str {
        "normalize_ranges"
    }

    fn apply(&self, _tag: &str, value: &str) -> Option<String> {
        let normalized = NUMBER_RANGE_REGEX.replace_all(value, |caps: &Captures| {
            format!("{}{}{}", &caps[1], self.sep, &caps[2])
        });
        Some(normalized.into_owned())
    }
}

/// Makes a value suitable for LaTeX: escapes special characters, then
/// replaces range hyphens with an en dash (`--`), or with `/` for date tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latexify;

impl Hook for Latexify {
    fn name(&self) -> &str {
        "latexify"
    }

    fn apply(&self, tag: &str, value: &str) -> Option<String> {
        let sep = if DATE_TAGS.contains(&tag) { "/" } else { "--" };
        let escaped = EscapeSpecialCharacters.apply(tag, value)?;
        NormalizeRanges::new(sep).apply(tag, &escaped)
    }
}

// Pre-defined hooks

/// Strips square brackets enclosing the whole value (text supplied by the
/// cataloger).
#[derive(Debug, Clone, Copy, Default)]
pub struct StripOuterSquareBrackets;

impl Hook for StripOuterSquareBrackets {
    fn name(&self) -> &str {
        "strip_outer_square_brackets"
    }

    fn apply(&self, _tag: &str, value: &str) -> Option<String> {
        Some(strip_outer_square_brackets(value).to_string())
    }
}

/// Wraps runs of capital letters in braces so BibTeX styles keep their case.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtectUppercaseLetters;

impl Hook for ProtectUppercaseLetters {
    fn name(&self) -> &str {
        "protect_uppercase_letters"
    }

    fn apply(&self, _tag: &str, value: &str) -> Option<String> {
        let protected =
            UPPERCASE_REGEX.replace_all(value, |caps: &Captures| format!("{{{}}}", &caps[1]));
        Some(protected.into_owned())
    }
}

/// Encloses the whole value in braces.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncloseInCurlyBraces;

impl Hook for EncloseInCurlyBraces {
    fn name(&self) -> &str {
        "enclose_in_curly_braces"
    }

    fn apply(&self, _tag: &str, value: &str) -> Option<String> {
        Some(format!("{{{value}}}"))
    }
}
