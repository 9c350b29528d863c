// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The record feed.
//!
//! A `;`-separated text file: one header row, then one row per record.
//!
//! ```text
//! id;name;password;gene
//! 1;Ada;c4ca4238...;ACGTTGCA
//! ```
//!
//! Fields are taken verbatim apart from surrounding whitespace. Blank lines
//! are skipped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::consts::RECORD_COUNT;
use crate::errors::InputError;
use crate::observability::messages::pipeline::{RecordCountMismatch, RecordsLoaded};
use crate::observability::messages::StructuredLog;
use crate::protocol::RecordId;

const FIELD_SEPARATOR: char = ';';
const FIELD_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    /// Hex digest of the record's secret.
    pub secret_hash: String,
    pub sequence: String,
}

/// Records keyed and ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: BTreeMap<RecordId, Record>,
}

impl RecordSet {
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.id, record))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Domain of the Secrets stage.
    pub fn secret_hashes(&self) -> BTreeMap<RecordId, String> {
        self.records
            .iter()
            .map(|(id, record)| (*id, record.secret_hash.clone()))
            .collect()
    }

    /// Domain of the Sequence stage.
    pub fn sequences(&self) -> BTreeMap<RecordId, String> {
        self.records
            .iter()
            .map(|(id, record)| (*id, record.sequence.clone()))
            .collect()
    }
}

pub fn parse_records(text: &str) -> Result<RecordSet, InputError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    if lines.next().is_none() {
        return Err(InputError::MissingHeader);
    }

    let mut records = BTreeMap::new();
    for (line, row) in lines {
        let record = parse_row(line, row)?;
        if records.contains_key(&record.id) {
            return Err(InputError::DuplicateId {
                line,
                id: record.id,
            });
        }
        records.insert(record.id, record);
    }

    let set = RecordSet { records };
    if set.len() != RECORD_COUNT {
        RecordCountMismatch {
            expected: RECORD_COUNT,
            found: set.len(),
        }
        .log();
    }
    Ok(set)
}

fn parse_row(line: usize, row: &str) -> Result<Record, InputError> {
    let fields: Vec<&str> = row.split(FIELD_SEPARATOR).map(str::trim).collect();
    let [id, name, secret_hash, sequence] = fields.as_slice() else {
        return Err(InputError::MalformedRow {
            line,
            fields: fields.len(),
        });
    };

    let id = id.parse::<u32>().map(RecordId).map_err(|_| InputError::InvalidId {
        line,
        value: id.to_string(),
    })?;
    for (field, value) in [("secret", secret_hash), ("sequence", sequence)] {
        if value.is_empty() {
            return Err(InputError::EmptyField { line, id, field });
        }
    }

    Ok(Record {
        id,
        name: name.to_string(),
        secret_hash: secret_hash.to_string(),
        sequence: sequence.to_string(),
    })
}

pub fn load_records<P: AsRef<Path>>(path: P) -> Result<RecordSet, InputError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_records(&text)?;
    RecordsLoaded {
        path,
        records: records.len(),
    }
    .log();
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
id;name;password;gene
1;Ada Lovelace;5feceb66ffc86f38d952786c6d696c79c2dbc239dd4e91b46729d73a27fb57e9;ACGTAC
2;Alan Turing;6b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b;GTACCA
";

    #[test]
    fn test_parse_skips_header_and_keeps_order() {
        let records = parse_records(SAMPLE).unwrap();

        assert_eq!(records.len(), 2);
        let first = records.get(&RecordId(1)).unwrap();
        assert_eq!(first.name, "Ada Lovelace");
        assert_eq!(first.sequence, "ACGTAC");
        let ids: Vec<RecordId> = records.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![RecordId(1), RecordId(2)]);
        assert_eq!(records.sequences().get(&RecordId(2)).map(String::as_str), Some("GTACCA"));
    }

    #[test]
    fn test_blank_lines_and_whitespace_are_tolerated() {
        let records = parse_records("id;name;password;gene\n\n 7 ; Bo ; ab ; CC \n\n").unwrap();
        let record = records.get(&RecordId(7)).unwrap();
        assert_eq!(record.name, "Bo");
        assert_eq!(record.secret_hash, "ab");
    }

    #[test]
    fn test_empty_input_has_no_header() {
        assert!(matches!(parse_records(""), Err(InputError::MissingHeader)));
    }

    #[test]
    fn test_malformed_rows_are_rejected() {
        let short = parse_records("id;name;password;gene\n1;Ada;ab\n");
        assert!(matches!(short, Err(InputError::MalformedRow { line: 2, fields: 3 })));

        let bad_id = parse_records("id;name;password;gene\nx;Ada;ab;AC\n");
        assert!(matches!(bad_id, Err(InputError::InvalidId { line: 2, .. })));

        let empty = parse_records("id;name;password;gene\n1;Ada;;AC\n");
        assert!(matches!(empty, Err(InputError::EmptyField { field: "secret", .. })));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let result = parse_records("id;name;password;gene\n1;A;ab;AC\n1;B;cd;GT\n");
        assert!(matches!(
            result,
            Err(InputError::DuplicateId {
                line: 3,
                id: RecordId(1)
            })
        ));
    }

    #[test]
    fn test_load_records_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.secret_hashes().len(), 2);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = load_records("/no/such/students.csv");
        assert!(matches!(result, Err(InputError::Io { .. })));
    }
}
