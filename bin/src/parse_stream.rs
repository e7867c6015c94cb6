use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use sendstream_delta::{Decoder, DEFAULT_SUPPORTED_VERSIONS};
use tracing::info;

#[derive(Debug, Parser)]
pub struct Options {
    /// Path to a previously captured send-stream file
    file: PathBuf,

    /// Verify each command's CRC while decoding
    #[arg(long)]
    verify_crc: bool,
}

#[tracing::instrument]
pub async fn main(opts: Options) -> Result<()> {
    let bytes = tokio::fs::read(&opts.file)
        .await
        .with_context(|| format!("read {:?}", opts.file))?;

    let decoder = Decoder::new(&bytes, opts.verify_crc, DEFAULT_SUPPORTED_VERSIONS).context("decode envelope")?;
    info!(version = decoder.version(), "decoding send-stream");

    for record in decoder {
        let record = record.context("decode command")?;
        println!("{:#010x} {}", record.offset, record.kind);
        for tag in record.attributes.unknown_tags() {
            println!("  unknown attribute tag {tag}");
        }
    }

    Ok(())
}
