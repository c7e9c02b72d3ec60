//! Transaction generation from descriptive fields and encoded images.

use bytes::{BufMut, Bytes, BytesMut};
use eftkit_record::{FieldTag, RecordWriter, RS, US};
use tracing::debug;

use crate::error::GenerateError;
use crate::header::TransactionHeader;
use crate::segment::{ImageSegment, Mode};
use crate::transaction::{FieldMap, DESCRIPTIVE_RECORD_TYPE, HEADER_RECORD_TYPE};

/// IDC listed in `1.003` for the descriptive record when the caller
/// supplies no `2.002`. The record itself carries only the caller's fields.
pub const DEFAULT_DESCRIPTIVE_IDC: &str = "00";

const IDC_FIELD: u32 = 2;
const SCALE_UNITS: &str = "1";
const PIXEL_DENSITY: &str = "500";
const BITS_PER_PIXEL: &str = "8";
const IMAGE_SCANNING_RESOLUTION: &str = "0";
const UNKNOWN_SOURCE: &str = "NONE";

type Result<T> = std::result::Result<T, GenerateError>;

/// Build a transaction with a default header.
pub fn generate(fields: &FieldMap, segments: &[ImageSegment], mode: Mode) -> Result<Bytes> {
    generate_with_header(fields, segments, mode, &TransactionHeader::default())
}

/// Build a transaction: type-1 header, one type-2 record, then one print
/// record per segment in the order given.
pub fn generate_with_header(
    fields: &FieldMap,
    segments: &[ImageSegment],
    mode: Mode,
    header: &TransactionHeader,
) -> Result<Bytes> {
    let descriptive = descriptive_record(fields)?;
    let mut content = vec![(DESCRIPTIVE_RECORD_TYPE, descriptive.idc)];
    let mut body = BytesMut::from(&descriptive.bytes[..]);

    for (index, segment) in segments.iter().enumerate() {
        let idc = format!("{:02}", index + 1);
        let record = image_record(segment, &idc, mode, header)?;
        debug!(
            record_type = mode.record_type(),
            position = %segment.position,
            size = record.len(),
            "generated print record"
        );
        body.put_slice(&record);
        content.push((mode.record_type(), idc));
    }

    let header_record = header_record(header, &content)?.finish_with_trailing(body.len());
    let mut out = BytesMut::with_capacity(header_record.len() + body.len());
    out.put_slice(&header_record);
    out.put_slice(&body);
    debug!(records = content.len() + 1, size = out.len(), "generated transaction");
    Ok(out.freeze())
}

struct Descriptive {
    bytes: Bytes,
    idc: String,
}

fn descriptive_record(fields: &FieldMap) -> Result<Descriptive> {
    if let Some(tag) = fields
        .keys()
        .find(|tag| tag.record_type != DESCRIPTIVE_RECORD_TYPE)
    {
        return Err(GenerateError::ForeignField(*tag));
    }

    let length_tag = FieldTag::length(DESCRIPTIVE_RECORD_TYPE);
    let idc = fields
        .get(&FieldTag::new(DESCRIPTIVE_RECORD_TYPE, IDC_FIELD))
        .cloned()
        .unwrap_or_else(|| DEFAULT_DESCRIPTIVE_IDC.to_string());

    let mut writer = RecordWriter::new(DESCRIPTIVE_RECORD_TYPE);
    for (tag, value) in fields.iter().filter(|(tag, _)| **tag != length_tag) {
        writer.text(*tag, value)?;
    }
    Ok(Descriptive {
        bytes: writer.finish(),
        idc,
    })
}

fn image_record(
    segment: &ImageSegment,
    idc: &str,
    mode: Mode,
    header: &TransactionHeader,
) -> Result<Bytes> {
    if segment.data.is_empty() {
        return Err(GenerateError::EmptySegment {
            position: segment.position.to_string(),
        });
    }

    let record_type = mode.record_type();
    let tag = |field: u32| FieldTag::new(record_type, field);
    let width = segment.width.to_string();
    let height = segment.height.to_string();
    let mut writer = RecordWriter::new(record_type);

    match mode {
        Mode::Flat => {
            let source = header
                .originating_agency
                .as_deref()
                .filter(|ori| !ori.is_empty())
                .unwrap_or(UNKNOWN_SOURCE);
            writer
                .text(tag(2), idc)?
                .text(tag(3), mode.impression_code())?
                .text(tag(4), source)?
                .text(tag(5), &header.date)?
                .text(tag(6), &width)?
                .text(tag(7), &height)?
                .text(tag(8), SCALE_UNITS)?
                .text(tag(9), PIXEL_DENSITY)?
                .text(tag(10), PIXEL_DENSITY)?
                .text(tag(11), segment.compression.as_str())?
                .text(tag(12), BITS_PER_PIXEL)?
                .text(tag(13), segment.position.as_str())?;
        }
        Mode::Rolled => {
            writer
                .text(tag(2), idc)?
                .text(tag(3), mode.impression_code())?
                .text(tag(4), segment.position.as_str())?
                .text(tag(5), IMAGE_SCANNING_RESOLUTION)?
                .text(tag(6), &width)?
                .text(tag(7), &height)?
                .text(tag(8), segment.compression.as_str())?;
        }
    }
    writer.blob(FieldTag::image(record_type), &segment.data);
    Ok(writer.finish())
}

/// Type-1 record without its length; `content` lists the records after it.
fn header_record(header: &TransactionHeader, content: &[(u32, String)]) -> Result<RecordWriter> {
    let tag = |field: u32| FieldTag::new(HEADER_RECORD_TYPE, field);
    let cnt = content_listing(content);

    let mut writer = RecordWriter::new(HEADER_RECORD_TYPE);
    writer
        .text(tag(2), &header.version)?
        .text(tag(3), &cnt)?
        .text(tag(4), &header.transaction_type)?
        .text(tag(5), &header.date)?;

    let optional = [
        (6, &header.priority),
        (7, &header.destination_agency),
        (8, &header.originating_agency),
        (9, &header.control_number),
    ];
    for (field, value) in optional {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            writer.text(tag(field), value)?;
        }
    }

    writer
        .text(tag(11), &header.native_scanning_resolution)?
        .text(tag(12), &header.nominal_resolution)?;
    Ok(writer)
}

/// `1.003` CNT: `1<US>n` followed by `<type><US><idc>` per record.
fn content_listing(content: &[(u32, String)]) -> String {
    let us = US as char;
    let mut subfields = vec![format!("{HEADER_RECORD_TYPE}{us}{}", content.len())];
    subfields.extend(
        content
            .iter()
            .map(|(record_type, idc)| format!("{record_type}{us}{idc}")),
    );
    subfields.join(&(RS as char).to_string())
}
