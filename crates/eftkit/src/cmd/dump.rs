use eftkit_record::FieldValue;
use eftkit_transaction::Transaction;
use serde::Serialize;

use crate::cmd::DumpArgs;
use crate::exit::{transaction_error, CliResult, SUCCESS};
use crate::output::{display_value, print_json, OutputFormat};

#[derive(Serialize)]
struct DumpField {
    tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    binary_size: Option<usize>,
}

#[derive(Serialize)]
struct DumpRecord {
    record: usize,
    fields: Vec<DumpField>,
}

#[derive(Serialize)]
struct DumpOutput {
    schema_id: &'static str,
    records: Vec<DumpRecord>,
}

pub fn run(args: DumpArgs, format: OutputFormat) -> CliResult<i32> {
    let transaction =
        Transaction::open(&args.path).map_err(|err| transaction_error("open failed", err))?;

    match format {
        OutputFormat::Json => print_json(&dump_output(&transaction)),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{}", display_value(&transaction.text_dump()));
        }
        OutputFormat::Raw => println!("{}", transaction.text_dump()),
    }
    Ok(SUCCESS)
}

fn dump_output(transaction: &Transaction) -> DumpOutput {
    let records = transaction
        .records()
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let mut fields: Vec<_> = record.fields.iter().collect();
            fields.sort_by_key(|(tag, _)| **tag);
            DumpRecord {
                record: index + 1,
                fields: fields
                    .into_iter()
                    .map(|(tag, value)| match value {
                        FieldValue::Text(text) => DumpField {
                            tag: tag.to_string(),
                            value: Some(text.clone()),
                            binary_size: None,
                        },
                        FieldValue::Blob(blob) => DumpField {
                            tag: tag.to_string(),
                            value: None,
                            binary_size: Some(blob.len()),
                        },
                    })
                    .collect(),
            }
        })
        .collect();

    DumpOutput {
        schema_id: "eftkit/cli/v1/dump",
        records,
    }
}
