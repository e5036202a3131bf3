//! Byte-to-text decoding for uploaded files.

use super::IngestError;
use crate::config::SourceEncoding;
use tracing::debug;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decodes `bytes` under `encoding`.
///
/// # Errors
/// Returns [`IngestError::Decode`] when the bytes are not valid in the
/// requested encoding. Latin-1 never fails.
pub fn decode(bytes: &[u8], encoding: SourceEncoding) -> Result<String, IngestError> {
    match encoding {
        SourceEncoding::Utf8 => decode_utf8(bytes),
        SourceEncoding::Latin1 => Ok(decode_latin1(bytes)),
        SourceEncoding::Utf8WithLatin1Fallback => decode_utf8(bytes).or_else(|err| {
            debug!(error = %err, "UTF-8 decoding failed, falling back to Latin-1");
            Ok(decode_latin1(bytes))
        }),
        SourceEncoding::Utf16 => decode_utf16(bytes),
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, IngestError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| IngestError::Decode {
            encoding: SourceEncoding::Utf8,
            reason: e.to_string(),
        })
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn decode_utf16(bytes: &[u8]) -> Result<String, IngestError> {
    let (body, big_endian) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, false),
        [0xFE, 0xFF, rest @ ..] => (rest, true),
        _ => (bytes, false),
    };

    if body.len() % 2 != 0 {
        return Err(IngestError::Decode {
            encoding: SourceEncoding::Utf16,
            reason: format!("odd number of bytes ({})", body.len()),
        });
    }

    let units = body.chunks_exact(2).map(|pair| {
        let pair = [pair[0], pair[1]];
        if big_endian {
            u16::from_be_bytes(pair)
        } else {
            u16::from_le_bytes(pair)
        }
    });

    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| IngestError::Decode {
            encoding: SourceEncoding::Utf16,
            reason: e.to_string(),
        })
}
