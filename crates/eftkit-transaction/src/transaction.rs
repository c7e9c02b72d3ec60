//! Parsed transaction model.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use bytes::Bytes;
use eftkit_record::{decode_record, scan, Diagnostic, FieldTag, FieldValue, Record};
use tracing::{debug, warn};

use crate::error::{Result, TransactionError};
use crate::segment::{CompressionLabel, ImageLayout, PositionCode};

/// Descriptive fields keyed by tag, in tag order.
pub type FieldMap = BTreeMap<FieldTag, String>;

/// Record type of the header record.
pub const HEADER_RECORD_TYPE: u32 = 1;

/// Record type of the descriptive text record.
pub const DESCRIPTIVE_RECORD_TYPE: u32 = 2;

const DUMP_SEPARATOR: &str = "--------------------";

/// An ordered list of records parsed from one transaction file.
#[derive(Debug, Clone)]
pub struct Transaction {
    source: Bytes,
    records: Vec<Record>,
    diagnostics: Vec<Diagnostic>,
    scanned_end: usize,
}

/// Metadata and payload of one type-4 or type-14 print record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Zero-based index of the record in the transaction.
    pub index: usize,
    /// 4 or 14.
    pub record_type: u32,
    /// Finger position, `"0"` when absent.
    pub position: PositionCode,
    /// Compression label, raw when absent.
    pub compression: CompressionLabel,
    /// Width in pixels, 0 when absent or unparsable.
    pub width: u32,
    /// Height in pixels, 0 when absent or unparsable.
    pub height: u32,
    /// Image payload, sharing the transaction's buffer.
    pub data: Bytes,
}

impl ImageRecord {
    /// File name used when extracting the payload.
    ///
    /// Position characters other than ASCII letters, digits, `-` and `_`
    /// become `_`, so the name never leaves the output directory.
    pub fn file_name(&self) -> String {
        let position: String = self
            .position
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("fp_{position}.{}", self.compression.file_extension())
    }
}

/// Parse a complete transaction.
///
/// Only an unterminated type-1 header fails; every other problem is kept as
/// a diagnostic alongside the records read before it.
pub fn parse(data: impl Into<Bytes>) -> Result<Transaction> {
    let source: Bytes = data.into();
    let scanned = scan(&source)?;
    let mut diagnostics = scanned.diagnostics.clone();

    let mut records = Vec::with_capacity(scanned.spans.len());
    for span in &scanned.spans {
        let (record, found) = decode_record(source.slice(span.clone()));
        diagnostics.extend(found);
        records.push(record);
    }

    let transaction = Transaction {
        scanned_end: scanned.end(),
        source,
        records,
        diagnostics,
    };
    Ok(transaction.check_declared_length())
}

impl Transaction {
    /// Read and parse a transaction file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                TransactionError::FileAbsent {
                    path: path.to_path_buf(),
                }
            } else {
                TransactionError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        debug!(path = %path.display(), size = data.len(), "read transaction");
        parse(data)
    }

    fn check_declared_length(mut self) -> Self {
        if let Some(declared) = self.declared_length() {
            let actual = self.source.len();
            if declared != actual {
                warn!(declared, actual, "header length does not match transaction size");
                self.diagnostics
                    .push(Diagnostic::TransactionLengthMismatch { declared, actual });
            }
        }
        self
    }

    /// Records in file order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Recoverable problems found while parsing.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The bytes the transaction was parsed from.
    pub fn source(&self) -> &Bytes {
        &self.source
    }

    /// Bytes after the last scanned record.
    pub fn trailing(&self) -> Bytes {
        self.source.slice(self.scanned_end..)
    }

    /// The type-1 header record, if the transaction starts with one.
    pub fn header(&self) -> Option<&Record> {
        self.records
            .first()
            .filter(|record| record.record_type() == Some(HEADER_RECORD_TYPE))
    }

    /// Whole-transaction length declared by `1.001`.
    pub fn declared_length(&self) -> Option<usize> {
        self.header().and_then(Record::declared_length)
    }

    /// Index of the first type-2 record.
    pub fn descriptive_index(&self) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.record_type() == Some(DESCRIPTIVE_RECORD_TYPE))
    }

    /// Text fields of the first type-2 record, without its length field.
    pub fn descriptive_fields(&self) -> FieldMap {
        let Some(index) = self.descriptive_index() else {
            return FieldMap::new();
        };
        self.records[index]
            .fields
            .iter()
            .filter(|(tag, _)| tag.record_type == DESCRIPTIVE_RECORD_TYPE && !tag.is_length())
            .filter_map(|(tag, value)| value.as_text().map(|text| (*tag, text.to_string())))
            .collect()
    }

    /// Print records that carry an image payload.
    pub fn image_records(&self) -> Vec<ImageRecord> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let layout = ImageLayout::for_record_type(record.record_type()?)?;
                let data = record.image()?.clone();
                Some(image_record(index, record, layout, data))
            })
            .collect()
    }

    /// Human-readable listing of every record and field.
    pub fn text_dump(&self) -> String {
        let mut out = String::new();
        for (index, record) in self.records.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "Record {}", index + 1);
            let mut fields: Vec<_> = record.fields.iter().collect();
            fields.sort_by_key(|(tag, _)| **tag);
            for (tag, value) in fields {
                match value {
                    FieldValue::Text(text) => {
                        let _ = writeln!(out, "{tag} : {text}");
                    }
                    FieldValue::Blob(blob) => {
                        let _ = writeln!(out, "{tag} : <Binary Data: {} bytes>", blob.len());
                    }
                }
            }
            out.push_str(DUMP_SEPARATOR);
        }
        out
    }
}

fn image_record(index: usize, record: &Record, layout: ImageLayout, data: Bytes) -> ImageRecord {
    let text = |field: u32| record.fields.text(&FieldTag::new(layout.record_type, field));
    let number = |field: u32| {
        text(field)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    };

    ImageRecord {
        index,
        record_type: layout.record_type,
        position: PositionCode::from_text(text(layout.position).unwrap_or("0")),
        compression: text(layout.compression)
            .map(CompressionLabel::parse)
            .unwrap_or(CompressionLabel::Raw),
        width: number(layout.width),
        height: number(layout.height),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use crate::segment::{ImageSegment, Mode};

    fn tag(s: &str) -> FieldTag {
        s.parse().unwrap()
    }

    fn sample_fields() -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert(tag("2.018"), "SMITH".to_string());
        fields.insert(tag("2.020"), "1990".to_string());
        fields
    }

    fn sample() -> Bytes {
        let fields = sample_fields();
        let segments = vec![
            ImageSegment::new(
                Bytes::from_static(b"\x00\x1C\x1D2.018:EVIL\x1C"),
                800,
                750,
                CompressionLabel::Wsq,
                13u16,
            ),
            ImageSegment::new(
                Bytes::from_static(b"\xFF\x4F\xFF\x51"),
                400,
                500,
                CompressionLabel::Jpeg2000,
                15u16,
            ),
        ];
        generate(&fields, &segments, Mode::Flat).unwrap()
    }

    #[test]
    fn round_trip_through_generator() {
        let bytes = sample();
        let transaction = parse(bytes.clone()).unwrap();

        assert_eq!(transaction.records().len(), 4);
        assert!(transaction.diagnostics().is_empty(), "{:?}", transaction.diagnostics());
        assert_eq!(transaction.declared_length(), Some(bytes.len()));
        assert!(transaction.trailing().is_empty());

        assert_eq!(transaction.descriptive_fields(), sample_fields());

        let images = transaction.image_records();
        assert_eq!(images.len(), 2);
        assert_eq!(&images[0].data[..], b"\x00\x1C\x1D2.018:EVIL\x1C");
        assert_eq!(images[0].position.as_str(), "13");
        assert_eq!(images[0].compression, CompressionLabel::Wsq);
        assert_eq!((images[0].width, images[0].height), (800, 750));
        assert_eq!(images[0].file_name(), "fp_13.wsq");
        assert_eq!(images[1].file_name(), "fp_15.jp2");
    }

    #[test]
    fn image_defaults_when_metadata_missing() {
        let mut data = b"1.001:38\x1D1.002:0500\x1C".to_vec();
        data.extend_from_slice(b"4.001:18\x1D4.999:\x01\x02\x1C");
        let transaction = parse(data).unwrap();
        assert!(transaction.diagnostics().is_empty(), "{:?}", transaction.diagnostics());

        let images = transaction.image_records();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].position.as_str(), "0");
        assert_eq!(images[0].compression, CompressionLabel::Raw);
        assert_eq!((images[0].width, images[0].height), (0, 0));
        assert_eq!(images[0].file_name(), "fp_0.raw");
    }

    #[test]
    fn compression_label_is_reported_as_written() {
        let mut data = b"1.001:60\x1D1.002:0500\x1C".to_vec();
        data.extend_from_slice(b"14.001:40\x1D14.011:WSQ\x1D14.013:13\x1D14.999:\x01\x1C");
        let transaction = parse(data).unwrap();
        assert!(transaction.diagnostics().is_empty(), "{:?}", transaction.diagnostics());

        let images = transaction.image_records();
        assert_eq!(images[0].compression.as_str(), "WSQ");
        assert_eq!(images[0].compression.to_string(), "WSQ");
        assert_eq!(images[0].file_name(), "fp_13.wsq");
    }

    #[test]
    fn file_name_escapes_path_separators() {
        let image = ImageRecord {
            index: 1,
            record_type: 14,
            position: PositionCode::from_text("../13\\x"),
            compression: CompressionLabel::Jpeg2000,
            width: 0,
            height: 0,
            data: Bytes::new(),
        };
        assert_eq!(image.file_name(), "fp____13_x.jp2");
    }

    #[test]
    fn truncated_input_keeps_parsed_records() {
        let bytes = sample();
        let cut = bytes.slice(..bytes.len() - 3);
        let transaction = parse(cut).unwrap();

        assert_eq!(transaction.records().len(), 4);
        assert!(transaction
            .diagnostics()
            .iter()
            .any(|d| matches!(d, Diagnostic::LengthOverrun { .. })));
        assert!(transaction
            .diagnostics()
            .iter()
            .any(|d| matches!(d, Diagnostic::TransactionLengthMismatch { .. })));
        assert_eq!(
            transaction.descriptive_fields().get(&tag("2.018")).map(String::as_str),
            Some("SMITH")
        );
    }

    #[test]
    fn garbage_after_records_is_trailing() {
        let mut data = sample().to_vec();
        let end = data.len();
        data.extend_from_slice(b"junk");
        let transaction = parse(data).unwrap();

        assert_eq!(transaction.records().len(), 4);
        assert_eq!(&transaction.trailing()[..], b"junk");
        assert_eq!(transaction.source().len(), end + 4);
    }

    #[test]
    fn missing_descriptive_record_yields_empty_map() {
        let transaction = parse(Bytes::from_static(b"1.001:20\x1D1.002:0500\x1C")).unwrap();
        assert!(transaction.descriptive_fields().is_empty());
        assert!(transaction.image_records().is_empty());
        assert!(transaction.diagnostics().is_empty());
    }

    #[test]
    fn unterminated_header_fails() {
        let err = parse(Bytes::from_static(b"1.001:19\x1D1.002:0500")).unwrap_err();
        assert!(matches!(err, TransactionError::Record(_)));
    }

    #[test]
    fn text_dump_lists_sorted_fields() {
        let data = b"1.001:50\x1D1.002:0500\x1C2.001:30\x1D2.018:SMITH\x1D2.002:00\x1C";
        let transaction = parse(Bytes::from_static(data)).unwrap();
        let dump = transaction.text_dump();

        let expected = "Record 1\n1.001 : 50\n1.002 : 0500\n--------------------\n\
                        Record 2\n2.001 : 30\n2.002 : 00\n2.018 : SMITH\n--------------------";
        assert_eq!(dump, expected);
    }

    #[test]
    fn text_dump_summarizes_blobs() {
        let transaction = parse(sample()).unwrap();
        assert!(transaction
            .text_dump()
            .contains("14.999 : <Binary Data: 14 bytes>"));
    }

    #[test]
    fn open_missing_file_is_file_absent() {
        let path = std::env::temp_dir().join(format!(
            "eftkit-missing-{}-{}.eft",
            std::process::id(),
            line!()
        ));
        let err = Transaction::open(&path).unwrap_err();
        assert!(matches!(err, TransactionError::FileAbsent { .. }));
    }
}
