//! JSON to XML re-encoding.
//!
//! The document always has a single root element. Object members become
//! child elements, and an array under key `k` becomes repeated `<k>`
//! siblings. A top-level array is wrapped as repeated `<items>` children of
//! the root.
use std::{borrow::Cow, io::Write};

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use serde_json::Value;

use crate::{errors::XmlError, extract::scalar_text};

/// Element name used for the elements of a top-level array.
pub const ITEMS_KEY: &str = "items";

/// Element name used for the elements of an array nested in an array.
pub const ITEM_KEY: &str = "item";

pub fn to_xml(value: &Value, root_key: &str) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let root = element_name(root_key);

    match value {
        Value::Array(arr) if !arr.is_empty() => {
            writer.write_event(Event::Start(BytesStart::new(&*root)))?;
            write_member(&mut writer, ITEMS_KEY, value)?;
            writer.write_event(Event::End(BytesEnd::new(&*root)))?;
        }
        _ => write_element(&mut writer, &root, value)?,
    }

    Ok(String::from_utf8(writer.into_inner())?)
}

/// Write the object member `key`. Arrays are flattened into one element per item.
fn write_member<W: Write>(
    writer: &mut Writer<W>,
    key: &str,
    value: &Value,
) -> Result<(), XmlError> {
    match value {
        Value::Array(arr) => {
            for item in arr {
                write_element(writer, key, item)?;
            }
            Ok(())
        }
        _ => write_element(writer, key, value),
    }
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &Value,
) -> Result<(), XmlError> {
    match value {
        Value::Null => {
            writer.write_event(Event::Empty(BytesStart::new(name)))?;
        }
        Value::Object(obj) if obj.is_empty() => {
            writer.write_event(Event::Empty(BytesStart::new(name)))?;
        }
        Value::Array(arr) if arr.is_empty() => {
            writer.write_event(Event::Empty(BytesStart::new(name)))?;
        }
        Value::Object(obj) => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            for (k, v) in obj {
                write_member(writer, &element_name(k), v)?;
            }
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        Value::Array(arr) => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            for item in arr {
                write_element(writer, ITEM_KEY, item)?;
            }
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        scalar => {
            let text = scalar_text(scalar);
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            writer.write_event(Event::Text(BytesText::new(&xml_text(&text))))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
    }

    Ok(())
}

/// Make `key` usable as an element name. Characters that can't appear in an
/// XML name, and colons, are replaced with `_`. Names that can't start an
/// XML name get a leading `_`.
pub fn element_name(key: &str) -> Cow<'_, str> {
    let mut chars = key.chars();
    let valid = match chars.next() {
        Some(c) => is_name_start_char(c) && chars.all(is_name_char),
        None => false,
    };

    if valid {
        return Cow::Borrowed(key);
    }

    let mut name: String = key
        .chars()
        .map(|c| if is_name_char(c) { c } else { '_' })
        .collect();

    if !name.starts_with(is_name_start_char) {
        name.insert(0, '_');
    }

    Cow::Owned(name)
}

/// Replace characters that are not allowed in an XML 1.0 document with U+FFFD.
pub fn xml_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(
            text.chars()
                .map(|c| if is_xml_char(c) { c } else { '\u{FFFD}' })
                .collect(),
        )
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

// Name start characters, without ':'.
fn is_name_start_char(c: char) -> bool {
    matches!(c,
        'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}
