//! Parsing of the physical description extent (field 300, subfield `a`).
//!
//! Extents are free text such as `4 v.`, `v. 2`, `xii, 345 p.` or
//! `[24] p.`. Only the forms below are recognized, in this order; anything
//! else yields no value.
//!
//! - volume: `v. N`, `vol. N`, `volume N` (decimal or roman N)
//! - volumes: `N v.`, `N vol.`, `N vols.`
//! - pages: `N-M p.`, then `xii, N p.`, then `N p.` / `[N] p.`

use crate::regex::Regex;
use std::sync::LazyLock;

static VOLUME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:v\.|vol\.|volume)\s*([0-9]+|[ivxlcdm]+)\b").unwrap()
});

static VOLUMES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([0-9]+)\s*v(?:ols?)?\.").unwrap());

static PAGE_RANGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[?([0-9]+)\]?\s*-\s*\[?([0-9]+)\]?\s*p\b").unwrap());

static ROMAN_PREFIXED_PAGES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[ivxlcdm]+\s*,\s*\[?([0-9]+)\]?\s*p\b").unwrap());

static PAGE_COUNT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[?([0-9]+)\]?\s*p\b").unwrap());

/// Volume number of a single-volume description.
pub(crate) fn parse_volume(extent: &str) -> Option<String> {
    VOLUME_REGEX
        .captures(extent.trim())
        .map(|caps| caps[1].to_string())
}

/// Number of volumes of a multi-volume set.
pub(crate) fn parse_volumes(extent: &str) -> Option<String> {
    VOLUMES_REGEX
        .captures(extent.trim())
        .map(|caps| caps[1].to_string())
}

/// Page count or page range.
pub(crate) fn parse_pages(extent: &str) -> Option<String> {
    let extent = extent.trim();

    if let Some(caps) = PAGE_RANGE_REGEX.captures(extent) {
        return Some(format!("{}-{}", &caps[1], &caps[2]));
    }

    ROMAN_PREFIXED_PAGES_REGEX
        .captures(extent)
        .or_else(|| PAGE_COUNT_REGEX.captures(extent))
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("v. 2", Some("2"))]
    #[case("vol. 12 :", Some("12"))]
    #[case("Volume III", Some("III"))]
    #[case("v.iv, 310 p.", Some("iv"))]
    #[case("4 v. ;", None)]
    #[case("345 p.", None)]
    fn test_parse_volume(#[case] extent: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_volume(extent).as_deref(), expected);
    }

    #[rstest]
    #[case("4 v. ;", Some("4"))]
    #[case("2 vols.", Some("2"))]
    #[case("3v.", Some("3"))]
    #[case("v. 2", None)]
    #[case("345 p.", None)]
    fn test_parse_volumes(#[case] extent: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_volumes(extent).as_deref(), expected);
    }

    #[rstest]
    #[case("345 p. : ill. ; 24 cm.", Some("345"))]
    #[case("[24] p.", Some("24"))]
    #[case("xii, 345 p.", Some("345"))]
    #[case("XV, 472 p. :", Some("472"))]
    #[case("101-110 p.", Some("101-110"))]
    #[case("4 v. ;", None)]
    #[case("4 pts. ;", None)]
    #[case("xii, 3 pts.", None)]
    #[case("1 online resource", None)]
    #[case("", None)]
    fn test_parse_pages(#[case] extent: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_pages(extent).as_deref(), expected);
    }
}
