//! MARCXML reading.
//!
//! Reads the records of a MARCXML document (a `<collection>` of `<record>`
//! elements, or a single `<record>`) into [`Record`]s. Element and
//! attribute names are matched without their namespace prefix, so both
//! `<record>` and `<marc:record>` are accepted. The leader is ignored.
//!
//! # Example
//!
//! ```
//! use marc2bib::marcxml::parse_marcxml;
//! use marc2bib::MarcRecord;
//!
//! let xml = r#"<collection xmlns="http://www.loc.gov/MARC21/slim">
//!   <record>
//!     <datafield tag="245" ind1="1" ind2="0">
//!       <subfield code="a">Symmetry through the eyes of a chemist /</subfield>
//!     </datafield>
//!   </record>
//! </collection>"#;
//!
//! let records = parse_marcxml(xml).unwrap();
//! let title = records[0].get_field("245").and_then(|f| f.subfield('a'));
//! assert_eq!(title, Some("Symmetry through the eyes of a chemist /"));
//! ```

use crate::error::{ConvertError, Result};
use crate::record::{DataField, Record};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Parses every record of a MARCXML document.
///
/// # Errors
///
/// Returns [`ConvertError::Xml`] for malformed XML, a field without `tag`,
/// a subfield without `code`, or a document ending inside a record.
pub fn parse_marcxml(content: &str) -> Result<Vec<Record>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut record: Option<Record> = None;
    let mut field: Option<DataField> = None;
    let mut buf = Vec::new();
    let mut text_buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"record" => record = Some(Record::new()),
                b"controlfield" => {
                    let tag = required_attribute(&e, b"tag", "controlfield")?;
                    let value = read_text(&mut reader, &mut text_buf, b"controlfield")?;
                    if let Some(record) = record.as_mut() {
                        record.add_control_field(&tag, &value);
                    }
                }
                b"datafield" => field = Some(data_field(&e)?),
                b"subfield" => {
                    let code = subfield_code(&e)?;
                    let value = read_text(&mut reader, &mut text_buf, b"subfield")?;
                    if let Some(field) = field.as_mut() {
                        field.add_subfield(code, &value);
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"record" => records.push(Record::new()),
                b"datafield" => {
                    let empty = data_field(&e)?;
                    if let Some(record) = record.as_mut() {
                        record.add_field(empty);
                    }
                }
                b"subfield" => {
                    let code = subfield_code(&e)?;
                    if let Some(field) = field.as_mut() {
                        field.add_subfield(code, "");
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"datafield" => {
                    if let (Some(record), Some(done)) = (record.as_mut(), field.take()) {
                        record.add_field(done);
                    }
                }
                b"record" => {
                    if let Some(done) = record.take() {
                        records.push(done);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if record.is_some() {
        return Err(ConvertError::Xml(
            "unexpected end of document inside <record>".to_string(),
        ));
    }

    tracing::debug!(records = records.len(), "Parsed MARCXML document");
    Ok(records)
}

/// Collects the text content up to the closing `end` element.
fn read_text(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>, end: &[u8]) -> Result<String> {
    let mut text = String::new();
    loop {
        match reader.read_event_into(buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(e) if e.local_name().as_ref() == end => break,
            Event::Eof => {
                return Err(ConvertError::Xml(format!(
                    "unexpected end of document inside <{}>",
                    String::from_utf8_lossy(end)
                )));
            }
            _ => {}
        }
        buf.clear();
    }
    buf.clear();
    Ok(text)
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn required_attribute(e: &BytesStart<'_>, name: &[u8], element: &str) -> Result<String> {
    attribute(e, name)?.ok_or_else(|| {
        ConvertError::Xml(format!(
            "<{element}> without `{}` attribute",
            String::from_utf8_lossy(name)
        ))
    })
}

fn indicator(e: &BytesStart<'_>, name: &[u8]) -> Result<char> {
    Ok(attribute(e, name)?
        .and_then(|value| value.chars().next())
        .unwrap_or(' '))
}

fn data_field(e: &BytesStart<'_>) -> Result<DataField> {
    let tag = required_attribute(e, b"tag", "datafield")?;
    Ok(DataField::new(
        &tag,
        indicator(e, b"ind1")?,
        indicator(e, b"ind2")?,
    ))
}

fn subfield_code(e: &BytesStart<'_>) -> Result<char> {
    required_attribute(e, b"code", "subfield")?
        .chars()
        .next()
        .ok_or_else(|| ConvertError::Xml("<subfield> with empty `code` attribute".to_string()))
}
