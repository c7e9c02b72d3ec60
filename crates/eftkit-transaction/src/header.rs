use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Default ANSI/NIST-ITL version written to `1.002`.
pub const DEFAULT_VERSION: &str = "0500";

/// Default transaction type written to `1.004` (criminal arrest).
pub const DEFAULT_TRANSACTION_TYPE: &str = "CAR";

/// Default scanning and nominal resolution in pixels per millimetre.
pub const DEFAULT_RESOLUTION: &str = "19.69";

/// Content of the type-1 header record of a generated transaction.
///
/// `1.001` (length) and `1.003` (content listing) are computed by the
/// generator. Optional fields are written only when non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionHeader {
    /// `1.002` VER.
    pub version: String,
    /// `1.004` TOT.
    pub transaction_type: String,
    /// `1.005` DAT, `YYYYMMDD` (UTC by default).
    pub date: String,
    /// `1.006` PRY.
    pub priority: Option<String>,
    /// `1.007` DAI.
    pub destination_agency: Option<String>,
    /// `1.008` ORI.
    pub originating_agency: Option<String>,
    /// `1.009` TCN.
    pub control_number: Option<String>,
    /// `1.011` NSR.
    pub native_scanning_resolution: String,
    /// `1.012` NTR.
    pub nominal_resolution: String,
}

impl Default for TransactionHeader {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            transaction_type: DEFAULT_TRANSACTION_TYPE.to_string(),
            date: today(),
            priority: None,
            destination_agency: None,
            originating_agency: None,
            control_number: None,
            native_scanning_resolution: DEFAULT_RESOLUTION.to_string(),
            nominal_resolution: DEFAULT_RESOLUTION.to_string(),
        }
    }
}

fn today() -> String {
    Utc::now().format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let header = TransactionHeader::default();
        assert_eq!(header.version, "0500");
        assert_eq!(header.transaction_type, "CAR");
        assert_eq!(header.date.len(), 8);
        assert!(header.date.bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(header.nominal_resolution, "19.69");
        assert!(header.originating_agency.is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let header: TransactionHeader =
            serde_json::from_str(r#"{"originating_agency":"WA0000000","date":"20240102"}"#)
                .unwrap();
        assert_eq!(header.originating_agency.as_deref(), Some("WA0000000"));
        assert_eq!(header.date, "20240102");
        assert_eq!(header.version, "0500");
    }
}
