use std::collections::BTreeMap;
use std::path::Path;

use eftkit_record::FieldTag;
use eftkit_transaction::{edit_transaction, FieldMap, Transaction};
use serde::Serialize;
use tracing::info;

use crate::cmd::EditArgs;
use crate::exit::{
    edit_error, io_error, json_error, transaction_error, CliError, CliResult, SUCCESS, USAGE,
};
use crate::output::{display_value, print_json, OutputFormat};

#[derive(Serialize)]
struct EditOutput {
    schema_id: &'static str,
    out: String,
    size: usize,
    changed: BTreeMap<String, Change>,
}

#[derive(Serialize)]
struct Change {
    before: Option<String>,
    after: String,
}

pub fn run(args: EditArgs, format: OutputFormat) -> CliResult<i32> {
    let mut patch = match &args.patch {
        Some(path) => read_patch(path)?,
        None => FieldMap::new(),
    };
    patch.extend(args.set.iter().cloned());
    if patch.is_empty() {
        return Err(CliError::new(USAGE, "nothing to edit: pass --set or --patch"));
    }

    let transaction =
        Transaction::open(&args.path).map_err(|err| transaction_error("open failed", err))?;
    let before = transaction.descriptive_fields();
    let edited =
        edit_transaction(&transaction, &patch).map_err(|err| edit_error("edit failed", err))?;

    std::fs::write(&args.out, &edited)
        .map_err(|err| io_error(&format!("cannot write {}", args.out.display()), err))?;
    info!(out = %args.out.display(), size = edited.len(), "wrote edited transaction");

    let changed = patch
        .into_iter()
        .filter(|(tag, _)| !tag.is_length())
        .map(|(tag, after)| {
            let change = Change {
                before: before.get(&tag).cloned(),
                after,
            };
            (tag.to_string(), change)
        })
        .collect();

    let out = EditOutput {
        schema_id: "eftkit/cli/v1/edit",
        out: args.out.display().to_string(),
        size: edited.len(),
        changed,
    };
    print_edit(&out, format);
    Ok(SUCCESS)
}

/// Read a JSON object mapping field tags to text values.
fn read_patch(path: &Path) -> CliResult<FieldMap> {
    let data = std::fs::read(path)
        .map_err(|err| io_error(&format!("cannot read patch {}", path.display()), err))?;
    let raw: BTreeMap<String, String> =
        serde_json::from_slice(&data).map_err(|err| json_error("invalid patch", err))?;

    raw.into_iter()
        .map(|(tag, value)| {
            let tag = tag
                .parse::<FieldTag>()
                .map_err(|err| CliError::new(USAGE, format!("invalid patch: {err}")))?;
            Ok((tag, value))
        })
        .collect()
}

fn print_edit(out: &EditOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Wrote {} ({} bytes)", out.out, out.size);
            for (tag, change) in &out.changed {
                println!(
                    "  {tag:<8} {} -> {}",
                    change
                        .before
                        .as_deref()
                        .map(display_value)
                        .unwrap_or_else(|| "(new)".to_string()),
                    display_value(&change.after)
                );
            }
        }
        OutputFormat::Raw => println!("{}", out.out),
    }
}
