use std::collections::HashSet;

use eftkit_transaction::Transaction;
use serde::Serialize;
use tracing::{info, warn};

use crate::cmd::ExtractArgs;
use crate::exit::{io_error, transaction_error, CliResult, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

#[derive(Serialize)]
struct ExtractedImage {
    file: String,
    record: usize,
    position: String,
    compression: String,
    width: u32,
    height: u32,
    size: usize,
}

#[derive(Serialize)]
struct ExtractOutput {
    schema_id: &'static str,
    out_dir: String,
    images: Vec<ExtractedImage>,
}

pub fn run(args: ExtractArgs, format: OutputFormat) -> CliResult<i32> {
    let transaction =
        Transaction::open(&args.path).map_err(|err| transaction_error("open failed", err))?;

    std::fs::create_dir_all(&args.out).map_err(|err| {
        io_error(
            &format!("cannot create output directory {}", args.out.display()),
            err,
        )
    })?;

    let mut written = HashSet::new();
    let mut images = Vec::new();
    for image in transaction.image_records() {
        let file_name = image.file_name();
        let target = args.out.join(&file_name);
        if !written.insert(file_name.clone()) {
            warn!(file = %file_name, record = image.index + 1, "duplicate position, overwriting");
        }
        std::fs::write(&target, &image.data)
            .map_err(|err| io_error(&format!("cannot write {}", target.display()), err))?;
        info!(file = %target.display(), size = image.data.len(), "extracted image");

        images.push(ExtractedImage {
            file: target.display().to_string(),
            record: image.index + 1,
            position: image.position.to_string(),
            compression: image.compression.to_string(),
            width: image.width,
            height: image.height,
            size: image.data.len(),
        });
    }

    let out = ExtractOutput {
        schema_id: "eftkit/cli/v1/extract",
        out_dir: args.out.display().to_string(),
        images,
    };
    print_extract(&out, format);
    Ok(SUCCESS)
}

fn print_extract(out: &ExtractOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut images = table(["FILE", "FGP", "COMPRESSION", "DIMENSIONS", "BYTES"]);
            for image in &out.images {
                images.add_row(vec![
                    image.file.clone(),
                    image.position.clone(),
                    image.compression.clone(),
                    format!("{}x{}", image.width, image.height),
                    image.size.to_string(),
                ]);
            }
            println!("{images}");
        }
        OutputFormat::Pretty => {
            println!("Extracted {} images to {}", out.images.len(), out.out_dir);
            for image in &out.images {
                println!("  {} ({} bytes)", image.file, image.size);
            }
        }
        OutputFormat::Raw => {
            for image in &out.images {
                println!("{}", image.file);
            }
        }
    }
}
