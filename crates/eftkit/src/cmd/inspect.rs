use std::collections::BTreeMap;

use eftkit_transaction::{ImageRecord, Transaction};
use serde::Serialize;

use crate::cmd::InspectArgs;
use crate::exit::{transaction_error, CliResult, SUCCESS};
use crate::output::{display_value, print_json, table, OutputFormat};

#[derive(Serialize)]
struct RecordSummary {
    index: usize,
    record_type: Option<u32>,
    size: usize,
}

#[derive(Serialize)]
struct ImageSummary {
    index: usize,
    record_type: u32,
    position: String,
    finger: Option<&'static str>,
    compression: String,
    width: u32,
    height: u32,
    size: usize,
    file_name: String,
}

impl From<&ImageRecord> for ImageSummary {
    fn from(image: &ImageRecord) -> Self {
        Self {
            index: image.index,
            record_type: image.record_type,
            position: image.position.to_string(),
            finger: image.position.finger().map(|finger| finger.name()),
            compression: image.compression.to_string(),
            width: image.width,
            height: image.height,
            size: image.data.len(),
            file_name: image.file_name(),
        }
    }
}

#[derive(Serialize)]
struct InspectOutput {
    schema_id: &'static str,
    path: String,
    size: usize,
    declared_length: Option<usize>,
    records: Vec<RecordSummary>,
    descriptive_fields: BTreeMap<String, String>,
    images: Vec<ImageSummary>,
    trailing_bytes: usize,
    diagnostics: Vec<String>,
}

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let transaction =
        Transaction::open(&args.path).map_err(|err| transaction_error("open failed", err))?;

    let out = InspectOutput {
        schema_id: "eftkit/cli/v1/inspect",
        path: args.path.display().to_string(),
        size: transaction.source().len(),
        declared_length: transaction.declared_length(),
        records: transaction
            .records()
            .iter()
            .enumerate()
            .map(|(index, record)| RecordSummary {
                index,
                record_type: record.record_type(),
                size: record.wire_size(),
            })
            .collect(),
        descriptive_fields: transaction
            .descriptive_fields()
            .into_iter()
            .map(|(tag, value)| (tag.to_string(), value))
            .collect(),
        images: transaction.image_records().iter().map(ImageSummary::from).collect(),
        trailing_bytes: transaction.trailing().len(),
        diagnostics: transaction
            .diagnostics()
            .iter()
            .map(ToString::to_string)
            .collect(),
    };

    print_inspect(&out, format);
    Ok(SUCCESS)
}

fn print_inspect(out: &InspectOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            println!(
                "{}: {} records, {} bytes (declared {})",
                out.path,
                out.records.len(),
                out.size,
                declared(out.declared_length)
            );

            let mut fields = table(["TAG", "VALUE"]);
            for (tag, value) in &out.descriptive_fields {
                fields.add_row(vec![tag.clone(), display_value(value)]);
            }
            println!("{fields}");

            if !out.images.is_empty() {
                let mut images = table([
                    "RECORD",
                    "TYPE",
                    "FGP",
                    "COMPRESSION",
                    "DIMENSIONS",
                    "BYTES",
                ]);
                for image in &out.images {
                    images.add_row(vec![
                        (image.index + 1).to_string(),
                        image.record_type.to_string(),
                        position_label(image),
                        image.compression.clone(),
                        format!("{}x{}", image.width, image.height),
                        image.size.to_string(),
                    ]);
                }
                println!("{images}");
            }
            print_diagnostics(out);
        }
        OutputFormat::Pretty => {
            println!("Transaction: {}", out.path);
            println!("  Size:      {} bytes", out.size);
            println!("  Declared:  {}", declared(out.declared_length));
            println!("  Records:   {}", out.records.len());
            if out.trailing_bytes > 0 {
                println!("  Trailing:  {} bytes", out.trailing_bytes);
            }
            println!("Descriptive fields:");
            for (tag, value) in &out.descriptive_fields {
                println!("  {tag:<8} {}", display_value(value));
            }
            println!("Images:");
            for image in &out.images {
                println!(
                    "  record {} type {} fgp {} {} {}x{} {} bytes",
                    image.index + 1,
                    image.record_type,
                    position_label(image),
                    image.compression,
                    image.width,
                    image.height,
                    image.size
                );
            }
            print_diagnostics(out);
        }
        OutputFormat::Raw => {
            for (tag, value) in &out.descriptive_fields {
                println!("{tag}={value}");
            }
        }
    }
}

fn print_diagnostics(out: &InspectOutput) {
    if out.diagnostics.is_empty() {
        return;
    }
    println!("Diagnostics:");
    for diagnostic in &out.diagnostics {
        println!("  {diagnostic}");
    }
}

fn position_label(image: &ImageSummary) -> String {
    match image.finger {
        Some(name) => format!("{} ({name})", image.position),
        None => image.position.clone(),
    }
}

fn declared(length: Option<usize>) -> String {
    length
        .map(|len| len.to_string())
        .unwrap_or_else(|| "none".to_string())
}
