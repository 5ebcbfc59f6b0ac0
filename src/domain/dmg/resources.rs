//! The DMG resource fork: an XML property list of named record lists.
//!
//! At the boundary the property list is an untyped tree; records are
//! decoded eagerly into [`ResourceRecord`] values keyed by resource name
//! (`blkx`, `plst`, ...). Field names are matched case-insensitively, as
//! produced by the various DMG writers in circulation.

use crate::domain::dmg::DmgError;
use std::collections::BTreeMap;
use std::io::Cursor;

/// One record of a named resource list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceRecord {
    pub attributes: String,
    pub cf_name: String,
    pub data: Vec<u8>,
    pub id: String,
    pub name: String,
}

/// All resources of an image, keyed by resource name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resources {
    pub entries: BTreeMap<String, Vec<ResourceRecord>>,
}

impl Resources {
    /// Parse the XML property list span of a DMG.
    ///
    /// The top level must be a dictionary with a `resource-fork` key whose
    /// value maps resource names to lists of records.
    pub fn parse(xml: &[u8]) -> Result<Self, DmgError> {
        let value = plist::Value::from_reader_xml(Cursor::new(xml))
            .map_err(|e| DmgError::Plist(e.to_string()))?;

        let root = value
            .as_dictionary()
            .ok_or_else(|| DmgError::Plist("top-level plist value is not a dictionary".into()))?;

        let fork = root
            .get("resource-fork")
            .and_then(plist::Value::as_dictionary)
            .ok_or(DmgError::NoResourceFork)?;

        let mut entries = BTreeMap::new();
        for (name, records) in fork.iter() {
            let list = records.as_array().ok_or_else(|| {
                DmgError::Plist(format!("resource {name} is not a list of records"))
            })?;

            let mut parsed = Vec::with_capacity(list.len());
            for record in list {
                let dict = record.as_dictionary().ok_or_else(|| {
                    DmgError::Plist(format!("resource {name} record is not a dictionary"))
                })?;
                parsed.push(parse_record(dict));
            }
            entries.insert(name.clone(), parsed);
        }

        Ok(Self { entries })
    }

    /// Encode back into an XML property list under a `resource-fork` root,
    /// padded with spaces to exactly `target_len` bytes.
    pub fn encode_padded(&self, target_len: usize) -> Result<Vec<u8>, DmgError> {
        let mut fork = plist::Dictionary::new();
        for (name, records) in &self.entries {
            let list: Vec<plist::Value> = records.iter().map(encode_record).collect();
            fork.insert(name.clone(), plist::Value::Array(list));
        }
        let mut root = plist::Dictionary::new();
        root.insert("resource-fork".to_string(), plist::Value::Dictionary(fork));

        let mut buf = Vec::new();
        plist::Value::Dictionary(root)
            .to_writer_xml(&mut buf)
            .map_err(|e| DmgError::Plist(e.to_string()))?;

        // The new property list replaces the original in place; anything
        // shorter leaves stale XML behind unless padded out to the exact
        // original length.
        if buf.len() > target_len {
            return Err(DmgError::ResourcesTooBig);
        }
        buf.resize(target_len, 0x20);

        Ok(buf)
    }

    /// Records of the named resource, or `ResourceNotFound`.
    pub fn get(&self, name: &str) -> Result<&[ResourceRecord], DmgError> {
        self.entries
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| DmgError::ResourceNotFound(name.to_string()))
    }

    /// Replace the records of the named resource.
    pub fn update(&mut self, name: &str, records: Vec<ResourceRecord>) {
        self.entries.insert(name.to_string(), records);
    }
}

fn get_field<'a>(dict: &'a plist::Dictionary, field: &str) -> Option<&'a plist::Value> {
    dict.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(field))
        .map(|(_, value)| value)
}

fn string_field(dict: &plist::Dictionary, field: &str) -> String {
    match get_field(dict, field) {
        Some(plist::Value::String(s)) => s.clone(),
        Some(plist::Value::Integer(i)) => i.to_string(),
        _ => String::new(),
    }
}

fn parse_record(dict: &plist::Dictionary) -> ResourceRecord {
    let data = match get_field(dict, "Data") {
        Some(plist::Value::Data(bytes)) => bytes.clone(),
        _ => Vec::new(),
    };
    ResourceRecord {
        attributes: string_field(dict, "Attributes"),
        cf_name: string_field(dict, "CFName"),
        data,
        id: string_field(dict, "ID"),
        name: string_field(dict, "Name"),
    }
}

fn encode_record(record: &ResourceRecord) -> plist::Value {
    let mut dict = plist::Dictionary::new();
    dict.insert(
        "Attributes".to_string(),
        plist::Value::String(record.attributes.clone()),
    );
    dict.insert(
        "CFName".to_string(),
        plist::Value::String(record.cf_name.clone()),
    );
    dict.insert("Data".to_string(), plist::Value::Data(record.data.clone()));
    dict.insert("ID".to_string(), plist::Value::String(record.id.clone()));
    dict.insert("Name".to_string(), plist::Value::String(record.name.clone()));
    plist::Value::Dictionary(dict)
}
