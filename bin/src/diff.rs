use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use sendstream_delta::Options as ParseOptions;
use tracing::info;

use crate::oracle::{FsNewSnapshot, FsOldSnapshot};
use crate::source::capture_send_stream;

#[derive(Debug, Parser)]
pub struct Options {
    /// Path to the OLD snapshot subvolume
    old: PathBuf,

    /// Path to the NEW snapshot subvolume
    new: PathBuf,

    /// Output format
    #[arg(long, default_value = "json")]
    format: Format,

    /// Verify each command's CRC while decoding
    #[arg(long)]
    verify_crc: bool,

    /// Promote soft failures (unknown commands, tracker inconsistencies) to hard errors
    #[arg(long)]
    strict: bool,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum Format {
    /// Pretty-printed JSON array of `FileChange` records
    #[default]
    Json,

    /// One line per change: `<action>\t<path>[ -> <path_to>]`
    Summary,
}

#[tracing::instrument]
pub async fn main(opts: Options) -> Result<()> {
    info!("capturing send-stream");
    let bytes = capture_send_stream(&opts.old, &opts.new)
        .await
        .context("capture send-stream")?;

    let old_oracle = FsOldSnapshot::new(&opts.old);
    let new_oracle = FsNewSnapshot::new(&opts.new);
    let parse_options = ParseOptions::builder()
        .verify_crc(opts.verify_crc)
        .strict(opts.strict)
        .build();

    let (changes, diagnostics) = sendstream_delta::parse(&bytes, &old_oracle, &new_oracle, &parse_options, &())
        .context("parse send-stream")?;

    for diagnostic in diagnostics {
        tracing::warn!(message = %diagnostic.message, path = ?diagnostic.path, "diagnostic");
    }

    match opts.format {
        Format::Json => {
            let rendered = serde_json::to_string_pretty(&changes).context("render changes")?;
            println!("{rendered}");
        }
        Format::Summary => {
            for change in &changes {
                match &change.details.path_to {
                    Some(to) => println!("{}\t{} -> {to}", change.action, change.path),
                    None => println!("{}\t{}", change.action, change.path),
                }
            }
        }
    }

    Ok(())
}
