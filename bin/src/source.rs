//! Subprocess plumbing for invoking `btrfs send`.
//!
//! The CORE never shells out to anything (it only ever consumes bytes); capturing those bytes
//! from the real `btrfs` binary is entirely a `bin`-layer concern.

use std::path::Path;
use std::process::Stdio;

use color_eyre::eyre::{bail, Context, Result};
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Run `btrfs send -p <old> <new>` and return the captured stream bytes.
#[tracing::instrument]
pub async fn capture_send_stream(old: &Path, new: &Path) -> Result<Vec<u8>> {
    let mut child = Command::new("btrfs")
        .arg("send")
        .arg("-p")
        .arg(old)
        .arg(new)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("spawn btrfs send")?;

    let mut stdout = child.stdout.take().expect("piped stdout");
    let mut bytes = Vec::new();
    stdout
        .read_to_end(&mut bytes)
        .await
        .context("read send-stream from btrfs send")?;

    let status = child.wait().await.context("wait for btrfs send")?;
    if !status.success() {
        let mut stderr_bytes = Vec::new();
        if let Some(mut stderr) = child.stderr.take() {
            let _ = stderr.read_to_end(&mut stderr_bytes).await;
        }
        bail!(
            "btrfs send exited with {status}: {}",
            String::from_utf8_lossy(&stderr_bytes)
        );
    }

    tracing::debug!(len = bytes.len(), "captured send-stream");
    Ok(bytes)
}
