use serde::de::DeserializeOwned;

/// A request line that could not be decoded into an event.
#[derive(Debug, thiserror::Error)]
#[error("line {line}: invalid event: {source}")]
pub struct DecodeError {
    /// 1-based line number within the request body.
    pub line: usize,
    #[source]
    pub source: serde_json::Error,
}

/// Decode one JSON-encoded event.
pub fn decode_line<E: DeserializeOwned>(line: &[u8]) -> Result<E, serde_json::Error> {
    serde_json::from_slice(line)
}

/// Lazily decode a newline-delimited body.
///
/// A trailing `\r` is stripped and blank lines are skipped. Items are produced
/// one at a time, so a caller can act on earlier lines before a later line
/// fails.
pub fn decode_lines<E: DeserializeOwned>(
    body: &[u8],
) -> impl Iterator<Item = Result<E, DecodeError>> + '_ {
    body.split(|&b| b == b'\n')
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = raw.strip_suffix(b"\r").unwrap_or(raw);
            if line.iter().all(u8::is_ascii_whitespace) {
                return None;
            }
            Some(decode_line(line).map_err(|source| DecodeError {
                line: idx + 1,
                source,
            }))
        })
}
