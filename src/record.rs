//! MARC record access.
//!
//! The converter only needs a small capability from a record: look fields up
//! by tag, read subfields and indicators, and optionally answer a few derived
//! questions (publisher, publication year, ISBN). That capability is the
//! [`MarcRecord`] / [`MarcField`] pair of traits, so records coming from any
//! MARC library can be converted by implementing them.
//!
//! [`Record`] is a plain in-memory implementation.
//!
//! # Example
//!
//! ```
//! use marc2bib::{DataField, MarcRecord, Record};
//!
//! let record = Record::builder()
//!     .control_field("001", "8888814")
//!     .field(
//!         DataField::builder("100", '1', ' ')
//!             .subfield('a', "Hargittai, István.")
//!             .build(),
//!     )
//!     .build();
//!
//! let author = record.get_field("100").and_then(|f| f.subfield('a'));
//! assert_eq!(author, Some("Hargittai, István."));
//! ```

use serde::{Deserialize, Serialize};

/// A variable data field of a MARC record.
pub trait MarcField {
    /// Three-character field tag, e.g. `"245"`.
    fn tag(&self) -> &str;

    fn indicator1(&self) -> char;

    fn indicator2(&self) -> char;

    /// First value of the subfield with the given code.
    fn subfield(&self, code: char) -> Option<&str>;

    /// All values of the subfield with the given code, in field order.
    fn subfields(&self, code: char) -> Vec<&str>;
}

/// Read access to a MARC bibliographic record.
///
/// Only [`get_fields`](MarcRecord::get_fields) is required. The derived
/// capabilities default to "unavailable", in which case the tag-functions
/// read the raw imprint fields themselves.
pub trait MarcRecord {
    /// All data fields with the given tag, in record order.
    fn get_fields(&self, tag: &str) -> Vec<&dyn MarcField>;

    /// The first data field with the given tag.
    fn get_field(&self, tag: &str) -> Option<&dyn MarcField> {
        self.get_fields(tag).into_iter().next()
    }

    /// Publisher name as recorded in the imprint.
    fn publisher(&self) -> Option<String> {
        None
    }

    /// Publication date as recorded in the imprint.
    fn pubyear(&self) -> Option<String> {
        None
    }

    /// First ISBN of the record, without hyphens.
    fn isbn(&self) -> Option<String> {
        None
    }
}

/// First subfield `code` of the imprint: field 260, else a 264 field whose
/// second indicator marks a publication statement.
pub(crate) fn imprint_subfield(record: &dyn MarcRecord, code: char) -> Option<&str> {
    let imprint_260 = record.get_fields("260").into_iter();
    let imprint_264 = record
        .get_fields("264")
        .into_iter()
        .filter(|field| field.indicator2() == '1');

    imprint_260
        .chain(imprint_264)
        .find_map(|field| field.subfield(code))
}

/// A named data element within a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subfield {
    pub code: char,
    pub value: String,
}

/// A data field (tags 010 and higher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataField {
    pub tag: String,
    pub indicator1: char,
    pub indicator2: char,
    pub subfields: Vec<Subfield>,
}

impl DataField {
    /// Creates an empty field.
    #[must_use]
    pub fn new(tag: &str, indicator1: char, indicator2: char) -> Self {
        Self {
            tag: tag.to_string(),
            indicator1,
            indicator2,
            subfields: Vec::new(),
        }
    }

    #[must_use]
    pub fn builder(tag: &str, indicator1: char, indicator2: char) -> DataFieldBuilder {
        DataFieldBuilder {
            field: Self::new(tag, indicator1, indicator2),
        }
    }

    pub fn add_subfield(&mut self, code: char, value: &str) {
        self.subfields.push(Subfield {
            code,
            value: value.to_string(),
        });
    }
}

impl MarcField for DataField {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn indicator1(&self) -> char {
        self.indicator1
    }

    fn indicator2(&self) -> char {
        self.indicator2
    }

    fn subfield(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .find(|subfield| subfield.code == code)
            .map(|subfield| subfield.value.as_str())
    }

    fn subfields(&self, code: char) -> Vec<&str> {
        self.subfields
            .iter()
            .filter(|subfield| subfield.code == code)
            .map(|subfield| subfield.value.as_str())
            .collect()
    }
}

/// Builder for [`DataField`].
#[derive(Debug)]
pub struct DataFieldBuilder {
    field: DataField,
}

impl DataFieldBuilder {
    #[must_use]
    pub fn subfield(mut self, code: char, value: &str) -> Self {
        self.field.add_subfield(code, value);
        self
    }

    #[must_use]
    pub fn build(self) -> DataField {
        self.field
    }
}

/// An in-memory MARC bibliographic record.
///
/// Fields keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Control fields (001-009) as `(tag, value)` pairs.
    pub control_fields: Vec<(String, String)>,
    /// Data fields (010+).
    pub fields: Vec<DataField>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> RecordBuilder {
        RecordBuilder {
            record: Self::new(),
        }
    }

    pub fn add_control_field(&mut self, tag: &str, value: &str) {
        self.control_fields
            .push((tag.to_string(), value.to_string()));
    }

    pub fn control_field(&self, tag: &str) -> Option<&str> {
        self.control_fields
            .iter()
            .find(|(control_tag, _)| control_tag == tag)
            .map(|(_, value)| value.as_str())
    }

    pub fn add_field(&mut self, field: DataField) {
        self.fields.push(field);
    }
}

impl MarcRecord for Record {
    fn get_fields(&self, tag: &str) -> Vec<&dyn MarcField> {
        self.fields
            .iter()
            .filter(|field| field.tag == tag)
            .map(|field| field as &dyn MarcField)
            .collect()
    }

    fn publisher(&self) -> Option<String> {
        imprint_subfield(self, 'b').map(str::to_string)
    }

    fn pubyear(&self) -> Option<String> {
        imprint_subfield(self, 'c').map(str::to_string)
    }

    fn isbn(&self) -> Option<String> {
        // 020 $a may carry a qualifier: "9781402056277 (hbk.)"
        self.get_fields("020")
            .into_iter()
            .filter_map(|field| field.subfield('a'))
            .map(|value| {
                value
                    .trim()
                    .chars()
                    .take_while(|c| c.is_ascii_digit() || matches!(c, '-' | 'x' | 'X'))
                    .filter(|c| *c != '-')
                    .collect::<String>()
            })
            .find(|isbn| !isbn.is_empty())
    }
}

/// Builder for [`Record`].
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    #[must_use]
    pub fn control_field(mut self, tag: &str, value: &str) -> Self {
        self.record.add_control_field(tag, value);
        self
    }

    #[must_use]
    pub fn field(mut self, field: DataField) -> Self {
        self.record.add_field(field);
        self
    }

    #[must_use]
    pub fn build(self) -> Record {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn imprint_record() -> Record {
        Record::builder()
            .field(
                DataField::builder("264", ' ', '0')
                    .subfield('a', "Producer city :")
                    .subfield('b', "Producer,")
                    .build(),
            )
            .field(
                DataField::builder("264", ' ', '1')
                    .subfield('a', "Princeton :")
                    .subfield('b', "Princeton University Press,")
                    .subfield('c', "[2015]")
                    .build(),
            )
            .field(
                DataField::builder("020", ' ', ' ')
                    .subfield('a', "978-0-691-16275-1 (hardcover : alk. paper)")
                    .build(),
            )
            .build()
    }

    #[test]
    fn test_get_fields_keeps_order() {
        let record = imprint_record();
        let fields = record.get_fields("264");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].indicator2(), '0');
        assert_eq!(fields[1].subfield('a'), Some("Princeton :"));
        assert!(record.get_field("100").is_none());
    }

    #[test]
    fn test_publisher_skips_non_publication_264() {
        let record = imprint_record();
        assert_eq!(
            record.publisher().as_deref(),
            Some("Princeton University Press,")
        );
        assert_eq!(record.pubyear().as_deref(), Some("[2015]"));
    }

    #[test]
    fn test_260_wins_over_264() {
        let mut record = imprint_record();
        record.add_field(
            DataField::builder("260", ' ', ' ')
                .subfield('b', "Springer,")
                .build(),
        );
        assert_eq!(record.publisher().as_deref(), Some("Springer,"));
        assert_eq!(record.pubyear().as_deref(), Some("[2015]"));
    }

    #[test]
    fn test_isbn_strips_qualifier_and_hyphens() {
        let record = imprint_record();
        assert_eq!(record.isbn().as_deref(), Some("9780691162751"));
        assert_eq!(Record::new().isbn(), None);
    }

    #[test]
    fn test_repeated_subfields() {
        let field = DataField::builder("650", ' ', '0')
            .subfield('x', "History")
            .subfield('a', "Symmetry")
            .subfield('x', "Philosophy")
            .build();
        assert_eq!(field.subfields('x'), vec!["History", "Philosophy"]);
        assert_eq!(field.subfield('z'), None);
    }

    #[test]
    fn test_control_field() {
        let record = Record::builder().control_field("001", "60035484").build();
        assert_eq!(record.control_field("001"), Some("60035484"));
        assert_eq!(record.control_field("003"), None);
    }
}
