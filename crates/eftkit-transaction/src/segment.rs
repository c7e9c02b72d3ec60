use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Which kind of print records a generated transaction carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Flat/plain impressions in type-14 records.
    #[default]
    #[serde(alias = "atf")]
    Flat,
    /// Rolled impressions in type-4 records.
    Rolled,
}

impl Mode {
    /// Record type used for each image segment.
    pub fn record_type(self) -> u32 {
        match self {
            Self::Flat => 14,
            Self::Rolled => 4,
        }
    }

    /// Impression type code written to `.003`.
    pub fn impression_code(self) -> &'static str {
        match self {
            Self::Flat => "0",
            Self::Rolled => "1",
        }
    }

    /// Tags carrying image metadata for this record layout.
    pub fn layout(self) -> ImageLayout {
        ImageLayout::for_record_type(self.record_type()).unwrap_or(ImageLayout::TYPE_14)
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" | "atf" => Ok(Self::Flat),
            "rolled" => Ok(Self::Rolled),
            other => Err(format!("unknown mode {other:?} (expected flat or rolled)")),
        }
    }
}

/// Field numbers holding image metadata in a print record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLayout {
    pub record_type: u32,
    pub width: u32,
    pub height: u32,
    pub compression: u32,
    pub position: u32,
}

impl ImageLayout {
    /// Type-4 layout: FGP at 4.004, GCA at 4.008.
    pub const TYPE_4: Self = Self {
        record_type: 4,
        width: 6,
        height: 7,
        compression: 8,
        position: 4,
    };

    /// Type-14 layout: CGA at 14.011, FGP at 14.013.
    pub const TYPE_14: Self = Self {
        record_type: 14,
        width: 6,
        height: 7,
        compression: 11,
        position: 13,
    };

    /// Layout for a record type, if it is one the codec extracts images from.
    pub fn for_record_type(record_type: u32) -> Option<Self> {
        match record_type {
            4 => Some(Self::TYPE_4),
            14 => Some(Self::TYPE_14),
            _ => None,
        }
    }
}

/// Standard finger position codes (FBI EBTS table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FingerPosition {
    Unknown = 0,
    RightThumb = 1,
    RightIndex = 2,
    RightMiddle = 3,
    RightRing = 4,
    RightLittle = 5,
    LeftThumb = 6,
    LeftIndex = 7,
    LeftMiddle = 8,
    LeftRing = 9,
    LeftLittle = 10,
    PlainRightThumb = 11,
    PlainLeftThumb = 12,
    PlainRightFourFingers = 13,
    PlainLeftFourFingers = 14,
    PlainThumbs = 15,
    EntireJointOrTip = 19,
}

impl FingerPosition {
    /// Look up a numeric position code.
    pub fn from_code(code: u16) -> Option<Self> {
        use FingerPosition::*;
        Some(match code {
            0 => Unknown,
            1 => RightThumb,
            2 => RightIndex,
            3 => RightMiddle,
            4 => RightRing,
            5 => RightLittle,
            6 => LeftThumb,
            7 => LeftIndex,
            8 => LeftMiddle,
            9 => LeftRing,
            10 => LeftLittle,
            11 => PlainRightThumb,
            12 => PlainLeftThumb,
            13 => PlainRightFourFingers,
            14 => PlainLeftFourFingers,
            15 => PlainThumbs,
            19 => EntireJointOrTip,
            _ => return None,
        })
    }

    /// Numeric code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Short name for display.
    pub fn name(self) -> &'static str {
        use FingerPosition::*;
        match self {
            Unknown => "unknown",
            RightThumb => "right thumb",
            RightIndex => "right index",
            RightMiddle => "right middle",
            RightRing => "right ring",
            RightLittle => "right little",
            LeftThumb => "left thumb",
            LeftIndex => "left index",
            LeftMiddle => "left middle",
            LeftRing => "left ring",
            LeftLittle => "left little",
            PlainRightThumb => "plain right thumb",
            PlainLeftThumb => "plain left thumb",
            PlainRightFourFingers => "right slap",
            PlainLeftFourFingers => "left slap",
            PlainThumbs => "thumbs",
            EntireJointOrTip => "entire joint or tip",
        }
    }
}

/// Position code as written in the file.
///
/// Codes that are not in the standard table are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PositionCode(String);

impl PositionCode {
    /// Position code from its wire text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Wire text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value, if the text is a number.
    pub fn code(&self) -> Option<u16> {
        self.0.trim().parse().ok()
    }

    /// Standard finger position, if known.
    pub fn finger(&self) -> Option<FingerPosition> {
        self.code().and_then(FingerPosition::from_code)
    }
}

impl From<FingerPosition> for PositionCode {
    fn from(position: FingerPosition) -> Self {
        Self(position.code().to_string())
    }
}

impl From<u16> for PositionCode {
    fn from(code: u16) -> Self {
        Self(code.to_string())
    }
}

impl<'de> Deserialize<'de> for PositionCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(u64),
            Text(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Code(code) => Self(code.to_string()),
            Repr::Text(text) => Self(text),
        })
    }
}

impl fmt::Display for PositionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compression algorithm label of an image payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompressionLabel {
    /// Uncompressed pixels.
    Raw,
    /// Wavelet scalar quantization.
    Wsq,
    /// Lossy JPEG 2000.
    Jpeg2000,
    /// Lossless JPEG 2000.
    Jpeg2000Lossless,
    /// PNG.
    Png,
    /// Any other label, kept verbatim.
    Other(String),
}

impl CompressionLabel {
    /// Label as read from a record.
    ///
    /// Only the exact wire labels map to the named variants. Anything else,
    /// including other spellings of a known algorithm, is kept verbatim as
    /// `Other` so it is reported and rewritten unchanged.
    pub fn parse(label: &str) -> Self {
        match label {
            "NONE" => Self::Raw,
            "WSQ20" => Self::Wsq,
            "JP2" => Self::Jpeg2000,
            "JP2L" => Self::Jpeg2000Lossless,
            "PNG" => Self::Png,
            _ => Self::Other(label.to_string()),
        }
    }

    /// Label written to the record.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Raw => "NONE",
            Self::Wsq => "WSQ20",
            Self::Jpeg2000 => "JP2",
            Self::Jpeg2000Lossless => "JP2L",
            Self::Png => "PNG",
            Self::Other(label) => label,
        }
    }

    /// File extension for an extracted payload: `jp2` when the label
    /// contains `JP2`, `wsq` when it contains `WSQ`, `raw` otherwise.
    pub fn file_extension(&self) -> &'static str {
        let upper = self.as_str().to_ascii_uppercase();
        if upper.contains("JP2") {
            "jp2"
        } else if upper.contains("WSQ") {
            "wsq"
        } else {
            "raw"
        }
    }
}

impl fmt::Display for CompressionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CompressionLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CompressionLabel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::parse(&label))
    }
}

/// One encoded print handed to the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSegment {
    /// Encoded image bytes, written verbatim as the `.999` field.
    pub data: Bytes,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// How `data` is encoded.
    pub compression: CompressionLabel,
    /// Which finger, slap or thumb pair the image shows.
    pub position: PositionCode,
}

impl ImageSegment {
    /// Create a segment.
    pub fn new(
        data: impl Into<Bytes>,
        width: u32,
        height: u32,
        compression: CompressionLabel,
        position: impl Into<PositionCode>,
    ) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            compression,
            position: position.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_aliases() {
        assert_eq!("rolled".parse::<Mode>().unwrap(), Mode::Rolled);
        assert_eq!("ATF".parse::<Mode>().unwrap(), Mode::Flat);
        assert!("slap".parse::<Mode>().is_err());
        assert_eq!(Mode::default().record_type(), 14);
        assert_eq!(Mode::Rolled.layout(), ImageLayout::TYPE_4);
    }

    #[test]
    fn unknown_position_codes_pass_through() {
        let code = PositionCode::from_text("99");
        assert_eq!(code.code(), Some(99));
        assert_eq!(code.finger(), None);
        assert_eq!(code.as_str(), "99");

        let odd = PositionCode::from_text("R-4");
        assert_eq!(odd.code(), None);
        assert_eq!(odd.to_string(), "R-4");

        assert_eq!(
            PositionCode::from(14).finger(),
            Some(FingerPosition::PlainLeftFourFingers)
        );
    }

    #[test]
    fn compression_labels_keep_wire_text() {
        assert_eq!(CompressionLabel::parse("JP2"), CompressionLabel::Jpeg2000);
        assert_eq!(CompressionLabel::parse("WSQ20"), CompressionLabel::Wsq);
        assert_eq!(CompressionLabel::parse("NONE"), CompressionLabel::Raw);
        for label in ["WSQ", "RAW", "jp2", "JPEG2K", "JPEGB", ""] {
            assert_eq!(CompressionLabel::parse(label).as_str(), label);
        }
        assert_eq!(
            CompressionLabel::parse("WSQ"),
            CompressionLabel::Other("WSQ".to_string())
        );
    }

    #[test]
    fn file_extensions_follow_label_text() {
        assert_eq!(CompressionLabel::Jpeg2000Lossless.file_extension(), "jp2");
        assert_eq!(CompressionLabel::Wsq.file_extension(), "wsq");
        assert_eq!(CompressionLabel::Raw.file_extension(), "raw");
        assert_eq!(CompressionLabel::Png.file_extension(), "raw");
        assert_eq!(CompressionLabel::parse("JPEG2K").file_extension(), "raw");
        assert_eq!(CompressionLabel::parse("JPEG2KL").file_extension(), "raw");
        assert_eq!(CompressionLabel::parse("jp2").file_extension(), "jp2");
        assert_eq!(CompressionLabel::parse("x-JP2-y").file_extension(), "jp2");
        assert_eq!(CompressionLabel::parse("FBI-WSQ").file_extension(), "wsq");
        assert_eq!(CompressionLabel::parse("JPEGB").file_extension(), "raw");
    }

    #[test]
    fn compression_label_serde_uses_wire_text() {
        let json = serde_json::to_string(&CompressionLabel::Wsq).unwrap();
        assert_eq!(json, "\"WSQ20\"");
        let back: CompressionLabel = serde_json::from_str("\"JP2L\"").unwrap();
        assert_eq!(back, CompressionLabel::Jpeg2000Lossless);
        let odd: CompressionLabel = serde_json::from_str("\"wsq\"").unwrap();
        assert_eq!(serde_json::to_string(&odd).unwrap(), "\"wsq\"");
    }

    #[test]
    fn tip_position_is_known() {
        assert_eq!(
            PositionCode::from_text("19").finger(),
            Some(FingerPosition::EntireJointOrTip)
        );
        assert_eq!(FingerPosition::EntireJointOrTip.code(), 19);
        assert_eq!(FingerPosition::from_code(16), None);
    }

    #[test]
    fn position_code_accepts_numbers_and_text() {
        let codes: Vec<PositionCode> = serde_json::from_str(r#"[13, "14", "R4"]"#).unwrap();
        let text: Vec<_> = codes.iter().map(PositionCode::as_str).collect();
        assert_eq!(text, vec!["13", "14", "R4"]);
        assert_eq!(serde_json::to_string(&codes[0]).unwrap(), "\"13\"");
    }
}
