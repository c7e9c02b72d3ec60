use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use eftkit_record::FieldTag;
use eftkit_transaction::{
    BudgetConfig, BudgetController, CompressionLabel, FieldMap, ImageSegment, Mode, PositionCode,
    TransactionHeader,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cmd::GenerateArgs;
use crate::exit::{budget_error, io_error, json_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_json, OutputFormat};

/// Placeholder in a segment path replaced by the compression ratio.
const RATIO_PLACEHOLDER: &str = "{ratio}";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    fields: BTreeMap<String, String>,
    #[serde(default)]
    header: Option<TransactionHeader>,
    #[serde(default)]
    mode: Option<Mode>,
    #[serde(default)]
    segments: Vec<SegmentSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SegmentSpec {
    path: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default = "default_compression")]
    compression: CompressionLabel,
    position: PositionCode,
}

fn default_compression() -> CompressionLabel {
    CompressionLabel::Raw
}

impl SegmentSpec {
    fn resolve(&self, base: &Path, ratio: u32) -> PathBuf {
        let path = PathBuf::from(self.path.replace(RATIO_PLACEHOLDER, &ratio.to_string()));
        if path.is_relative() {
            base.join(path)
        } else {
            path
        }
    }

    fn load(&self, base: &Path, ratio: u32) -> io::Result<ImageSegment> {
        let path = self.resolve(base, ratio);
        let data = std::fs::read(&path)
            .map_err(|err| io::Error::new(err.kind(), format!("{}: {err}", path.display())))?;
        debug!(path = %path.display(), ratio, size = data.len(), "loaded segment");
        Ok(ImageSegment::new(
            data,
            self.width,
            self.height,
            self.compression.clone(),
            self.position.clone(),
        ))
    }
}

#[derive(Serialize)]
struct GenerateOutput {
    schema_id: &'static str,
    out: String,
    size: usize,
    max_bytes: usize,
    attempts: usize,
    ratio: u32,
    mode: Mode,
    images: usize,
}

pub fn run(args: GenerateArgs, format: OutputFormat) -> CliResult<i32> {
    let manifest = read_manifest(&args.manifest)?;
    let fields = field_map(&manifest.fields)?;
    let mode = args.mode.or(manifest.mode).unwrap_or_default();

    let mut header = manifest.header.clone().unwrap_or_default();
    if let Some(ori) = args.ori.clone() {
        header.originating_agency = Some(ori);
    }
    if let Some(dai) = args.dai.clone() {
        header.destination_agency = Some(dai);
    }

    let base = args
        .manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let mut provider = |ratio: u32| -> io::Result<Vec<ImageSegment>> {
        manifest
            .segments
            .iter()
            .map(|spec| spec.load(&base, ratio))
            .collect()
    };

    let controller = BudgetController::with_config(BudgetConfig {
        max_bytes: args.max_bytes,
        header,
        ..BudgetConfig::default()
    });
    let outcome = controller
        .run(&fields, &mut provider, mode)
        .map_err(|err| budget_error("generate failed", err))?;

    std::fs::write(&args.out, &outcome.bytes)
        .map_err(|err| io_error(&format!("cannot write {}", args.out.display()), err))?;
    info!(
        out = %args.out.display(),
        size = outcome.bytes.len(),
        attempts = outcome.attempts,
        ratio = outcome.ratio,
        "wrote transaction"
    );

    let out = GenerateOutput {
        schema_id: "eftkit/cli/v1/generate",
        out: args.out.display().to_string(),
        size: outcome.bytes.len(),
        max_bytes: args.max_bytes,
        attempts: outcome.attempts,
        ratio: outcome.ratio,
        mode,
        images: manifest.segments.len(),
    };
    print_generate(&out, format);
    Ok(SUCCESS)
}

fn read_manifest(path: &Path) -> CliResult<Manifest> {
    let data = std::fs::read(path)
        .map_err(|err| io_error(&format!("cannot read manifest {}", path.display()), err))?;
    serde_json::from_slice(&data).map_err(|err| json_error("invalid manifest", err))
}

fn field_map(raw: &BTreeMap<String, String>) -> CliResult<FieldMap> {
    raw.iter()
        .map(|(tag, value)| {
            let tag = tag
                .parse::<FieldTag>()
                .map_err(|err| CliError::new(USAGE, format!("invalid manifest: {err}")))?;
            Ok((tag, value.clone()))
        })
        .collect()
}

fn print_generate(out: &GenerateOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Wrote {} ({} bytes, limit {})", out.out, out.size, out.max_bytes);
            println!(
                "  {} images, compression ratio {} after {} attempt(s)",
                out.images, out.ratio, out.attempts
            );
        }
        OutputFormat::Raw => println!("{}", out.out),
    }
}
