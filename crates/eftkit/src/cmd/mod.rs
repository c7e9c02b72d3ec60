use clap::{Args, Subcommand};
use std::path::PathBuf;

use eftkit_record::FieldTag;
use eftkit_transaction::{Mode, MAX_TRANSACTION_SIZE};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod dump;
pub mod edit;
pub mod extract;
pub mod generate;
pub mod inspect;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show descriptive fields, print records and parse diagnostics.
    Inspect(InspectArgs),
    /// Print every record and field as text.
    Dump(DumpArgs),
    /// Write each print image to its own file.
    Extract(ExtractArgs),
    /// Change type-2 descriptive fields, keeping everything else intact.
    Edit(EditArgs),
    /// Build a transaction from a manifest under a size limit.
    Generate(GenerateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Inspect(args) => inspect::run(args, format),
        Command::Dump(args) => dump::run(args, format),
        Command::Extract(args) => extract::run(args, format),
        Command::Edit(args) => edit::run(args, format),
        Command::Generate(args) => generate::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Transaction file.
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Transaction file.
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Transaction file.
    pub path: PathBuf,
    /// Directory for extracted images (created if missing).
    #[arg(long, short = 'o', value_name = "DIR")]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Transaction file.
    pub path: PathBuf,
    /// Output file.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub out: PathBuf,
    /// Field assignment, e.g. `2.018=DOE, JANE`. Repeatable.
    #[arg(long, value_name = "TAG=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(FieldTag, String)>,
    /// JSON object of tag to value, applied before `--set`.
    #[arg(long, value_name = "FILE")]
    pub patch: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Manifest describing fields, header and image segments.
    #[arg(long, value_name = "FILE")]
    pub manifest: PathBuf,
    /// Output file.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub out: PathBuf,
    /// Print record layout (`flat` or `rolled`); overrides the manifest.
    #[arg(long)]
    pub mode: Option<Mode>,
    /// Size ceiling in bytes.
    #[arg(long, env = "EFTKIT_MAX_BYTES", default_value_t = MAX_TRANSACTION_SIZE)]
    pub max_bytes: usize,
    /// Originating agency (`1.008`); overrides the manifest header.
    #[arg(long, env = "EFTKIT_ORI")]
    pub ori: Option<String>,
    /// Destination agency (`1.007`); overrides the manifest header.
    #[arg(long, env = "EFTKIT_DAI")]
    pub dai: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_assignment(input: &str) -> Result<(FieldTag, String), String> {
    let (tag, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected TAG=VALUE, found {input:?}"))?;
    let tag = tag.trim().parse::<FieldTag>().map_err(|err| err.to_string())?;
    Ok((tag, value.to_string()))
}
