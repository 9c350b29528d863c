// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod records;

pub use records::{load_records, parse_records, Record, RecordSet};
