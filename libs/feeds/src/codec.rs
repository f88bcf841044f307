//! Byte-buffer decoding and CSV reader construction.

use std::borrow::Cow;

use encoding_rs::{UTF_8, WINDOWS_1251};

use crate::{FeedError, TextEncoding};

/// Decode a raw feed buffer into text, rejecting undecodable input.
///
/// Decoding is strict: a byte sequence that is not valid under the
/// declared encoding fails the whole feed rather than producing
/// replacement characters that would silently corrupt natural keys.
pub fn decode(buf: &[u8], encoding: TextEncoding) -> Result<Cow<'_, str>, FeedError> {
    let codec = match encoding {
        TextEncoding::Utf8 => UTF_8,
        TextEncoding::Windows1251 => WINDOWS_1251,
    };
    codec
        .decode_without_bom_handling_and_without_replacement(buf)
        .ok_or(FeedError::Encoding {
            encoding: encoding.name(),
        })
}

/// CSV reader over decoded feed text with the schema's delimiter.
///
/// Headers are read (feeds always carry a header row); record length is
/// enforced by the reader, so a row with a wrong column count surfaces as
/// a `csv::Error` and becomes `FeedError::Csv`.
pub fn reader(text: &str, delimiter: u8) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes())
}

/// Resolve the positions of the schema's source columns in the header row.
pub fn header_positions(
    headers: &csv::StringRecord,
    columns: &'static [crate::Column],
) -> Result<Vec<usize>, FeedError> {
    columns
        .iter()
        .map(|col| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == col.source)
                .ok_or(FeedError::MissingColumn { column: col.source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_windows_1251_cyrillic() {
        // "Фільтр" in Windows-1251
        let bytes = [0xD4, 0xB3, 0xEB, 0xFC, 0xF2, 0xF0];
        let text = decode(&bytes, TextEncoding::Windows1251).unwrap();
        assert_eq!(text, "Фільтр");
    }

    #[test]
    fn rejects_invalid_utf8() {
        let err = decode(&[0xFF, 0xFE, 0x41], TextEncoding::Utf8).unwrap_err();
        assert!(matches!(err, FeedError::Encoding { encoding: "UTF-8" }));
    }

    #[test]
    fn header_lookup_ignores_bom() {
        let headers = csv::StringRecord::from(vec!["\u{feff}Id", "Name", "Parent_Id"]);
        let positions = header_positions(&headers, crate::schema::CATEGORIES.columns).unwrap();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn missing_header_is_reported_by_name() {
        let headers = csv::StringRecord::from(vec!["Id", "Parent_Id"]);
        let err = header_positions(&headers, crate::schema::CATEGORIES.columns).unwrap_err();
        assert!(matches!(err, FeedError::MissingColumn { column: "Name" }));
    }
}
