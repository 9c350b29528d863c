// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

use crate::protocol::RecordId;

/// Errors raised while reading the record feed.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read input file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("input is empty: expected a header row")]
    MissingHeader,
    #[error("line {line}: expected 4 ';'-separated fields, found {fields}")]
    MalformedRow { line: usize, fields: usize },
    #[error("line {line}: '{value}' is not a valid record id")]
    InvalidId { line: usize, value: String },
    #[error("line {line}: record id {id} appears more than once")]
    DuplicateId { line: usize, id: RecordId },
    #[error("line {line}: record {id} has an empty {field} field")]
    EmptyField {
        line: usize,
        id: RecordId,
        field: &'static str,
    },
}
