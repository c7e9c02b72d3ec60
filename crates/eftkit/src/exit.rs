use std::fmt;
use std::io;

use eftkit_record::RecordError;
use eftkit_transaction::{BudgetError, EditError, GenerateError, TransactionError};

// Process exit codes.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const FILE_ABSENT: i32 = 2;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const SIZE_BUDGET_EXCEEDED: i32 = 70;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound => FILE_ABSENT,
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn record_error(context: &str, err: RecordError) -> CliError {
    match err {
        RecordError::Io(source) => io_error(context, source),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn transaction_error(context: &str, err: TransactionError) -> CliError {
    match err {
        TransactionError::FileAbsent { .. } => {
            CliError::new(FILE_ABSENT, format!("{context}: {err}"))
        }
        TransactionError::Io { path, source } => {
            io_error(&format!("{context}: {}", path.display()), source)
        }
        TransactionError::Record(err) => record_error(context, err),
    }
}

pub fn edit_error(context: &str, err: EditError) -> CliError {
    match err {
        EditError::Parse(err) => transaction_error(context, err),
        EditError::ForeignField(_) => CliError::new(USAGE, format!("{context}: {err}")),
        EditError::MissingDescriptiveRecord => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        EditError::Record(err) => record_error(context, err),
    }
}

pub fn generate_error(context: &str, err: GenerateError) -> CliError {
    match err {
        GenerateError::ForeignField(_) => CliError::new(USAGE, format!("{context}: {err}")),
        GenerateError::EmptySegment { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        GenerateError::Record(err) => record_error(context, err),
    }
}

pub fn budget_error(context: &str, err: BudgetError) -> CliError {
    match err {
        BudgetError::SizeBudgetExceeded { .. } => {
            CliError::new(SIZE_BUDGET_EXCEEDED, format!("{context}: {err}"))
        }
        BudgetError::Generate(err) => generate_error(context, err),
        BudgetError::Provider { ratio, source } => match source.downcast::<io::Error>() {
            Ok(io) => io_error(&format!("{context} at ratio {ratio}"), *io),
            Err(other) => CliError::new(
                FAILURE,
                format!("{context}: segment provider failed at ratio {ratio}: {other}"),
            ),
        },
    }
}

pub fn json_error(context: &str, err: serde_json::Error) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}
