// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::traits::HashFunction;

/// Hex encoding of the raw input. Invertible, so fixtures can be built by hand.
pub struct EchoHash;

impl HashFunction for EchoHash {
    fn hex_digest(&self, input: &[u8]) -> String {
        hex::encode(input)
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

/// Even decimal inputs hash to `00000...`, odd ones to `11111...`, anything
/// else to `ffffff...`. The suffix is the echoed input so digests stay unique.
pub struct PatternHash;

impl PatternHash {
    pub fn prefix_for(input: &[u8]) -> &'static str {
        match std::str::from_utf8(input)
            .ok()
            .and_then(|text| text.parse::<i64>().ok())
        {
            Some(n) if n % 2 == 0 => "00000",
            Some(_) => "11111",
            None => "fffff",
        }
    }
}

impl HashFunction for PatternHash {
    fn hex_digest(&self, input: &[u8]) -> String {
        format!("{}{}", Self::prefix_for(input), hex::encode(input))
    }

    fn name(&self) -> &'static str {
        "pattern"
    }
}
