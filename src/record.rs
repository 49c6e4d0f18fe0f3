//! On-disk partial record: one line, `<token>\t<count>\n`.

pub const FIELD_SEPARATOR: u8 = b'\t';
pub const RECORD_TERMINATOR: u8 = b'\n';

/// Encode a record line.
pub fn encode(token: &[u8], count: u64) -> Vec<u8> {
    let digits = count.to_string();
    let mut line = Vec::with_capacity(token.len() + digits.len() + 2);
    line.extend_from_slice(token);
    line.push(FIELD_SEPARATOR);
    line.extend_from_slice(digits.as_bytes());
    line.push(RECORD_TERMINATOR);
    line
}

/// A record as read back from disk, borrowing from the file contents.
#[derive(Debug, PartialEq, Eq)]
pub struct StoredRecord<'a> {
    pub token: &'a [u8],
    pub count: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RecordFormatError {
    MissingTerminator,
    MissingSeparator,
    BadCount(String),
}

impl std::fmt::Display for RecordFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordFormatError::MissingTerminator => write!(f, "record is not newline-terminated"),
            RecordFormatError::MissingSeparator => write!(f, "record has no tab separator"),
            RecordFormatError::BadCount(text) => write!(f, "invalid count {:?}", text),
        }
    }
}

/// Parse the first line of a record file.
///
/// The count is the text after the last tab, so only the count field has to
/// be free of separators.
pub fn parse(contents: &[u8]) -> Result<StoredRecord<'_>, RecordFormatError> {
    let end = contents
        .iter()
        .position(|&b| b == RECORD_TERMINATOR)
        .ok_or(RecordFormatError::MissingTerminator)?;
    let line = &contents[..end];
    let split = line
        .iter()
        .rposition(|&b| b == FIELD_SEPARATOR)
        .ok_or(RecordFormatError::MissingSeparator)?;

    let count_text = &line[split + 1..];
    let count = std::str::from_utf8(count_text)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| {
            RecordFormatError::BadCount(String::from_utf8_lossy(count_text).into_owned())
        })?;

    Ok(StoredRecord { token: &line[..split], count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        assert_eq!(encode(b"GET /a", 17), b"GET /a\t17\n".to_vec());
        assert_eq!(encode(b"x", 0), b"x\t0\n".to_vec());
    }

    #[test]
    fn test_parse_reads_first_line_only() {
        let record = parse(b"abc\t42\ntrailing junk").unwrap();
        assert_eq!(record, StoredRecord { token: b"abc", count: 42 });
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse(b"abc\t42"), Err(RecordFormatError::MissingTerminator));
        assert_eq!(parse(b"abc 42\n"), Err(RecordFormatError::MissingSeparator));
        assert_eq!(parse(b"abc\tx1\n"), Err(RecordFormatError::BadCount("x1".to_string())));
        assert_eq!(parse(b"abc\t-3\n"), Err(RecordFormatError::BadCount("-3".to_string())));
        assert!(matches!(parse(b""), Err(RecordFormatError::MissingTerminator)));
    }
}
