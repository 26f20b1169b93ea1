//! Parsing of structured accident codes (`ORG-SITE-YEAR-SEQ`).

use once_cell::sync::Lazy;
use regex::Regex;

static ACCIDENT_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)([a-z0-9]{2,10})-([a-z0-9]{2,10})-(\d{4})-(\d{1,6})$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccidentCode {
    pub organization: String,
    pub site: String,
    pub year: i32,
    pub sequence: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnparseableReason {
    Empty,
    SegmentMismatch,
    InvalidYear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCode {
    Parsed(AccidentCode),
    Unparseable {
        raw: String,
        reason: UnparseableReason,
    },
}

impl ParsedCode {
    pub fn parse(code: &str) -> ParsedCode {
        let trimmed = code.trim();
        let unparseable = |reason| ParsedCode::Unparseable {
            raw: code.to_string(),
            reason,
        };

        if trimmed.is_empty() {
            return unparseable(UnparseableReason::Empty);
        }
        let captures = match ACCIDENT_CODE.captures(trimmed) {
            Some(captures) => captures,
            None => return unparseable(UnparseableReason::SegmentMismatch),
        };

        let year: i32 = match captures[3].parse() {
            Ok(year) if year > 0 => year,
            _ => return unparseable(UnparseableReason::InvalidYear),
        };
        let sequence: u32 = match captures[4].parse() {
            Ok(sequence) => sequence,
            Err(_) => return unparseable(UnparseableReason::SegmentMismatch),
        };

        ParsedCode::Parsed(AccidentCode {
            organization: captures[1].to_ascii_uppercase(),
            site: captures[2].to_ascii_uppercase(),
            year,
            sequence,
        })
    }

    pub fn site(&self) -> Option<&str> {
        match self {
            ParsedCode::Parsed(code) => Some(&code.site),
            ParsedCode::Unparseable { .. } => None,
        }
    }
}
