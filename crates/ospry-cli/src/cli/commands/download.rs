//! `ospry download <url> -o <path>` – download an image, optionally formatted.

use anyhow::{Context, Result};
use ospry_core::control::AbortToken;
use ospry_core::{Client, FormatOptions};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub async fn run_download(
    client: &Client,
    url: &str,
    out: &Path,
    opts: FormatOptions,
) -> Result<()> {
    let result = tokio::task::spawn_blocking({
        let client = client.clone();
        let url = url.to_string();
        let out = out.to_path_buf();
        move || -> Result<u64> {
            let file = File::create(&out).with_context(|| format!("create {}", out.display()))?;
            let mut sink = BufWriter::new(file);
            let n = client.download(&url, &opts, &mut sink, &AbortToken::new())?;
            Ok(n)
        }
    })
    .await
    .context("download task join")?;

    match result {
        Ok(n) => {
            println!("Saved {} bytes to {}", n, out.display());
            Ok(())
        }
        Err(e) => {
            // Don't leave a truncated or empty file behind.
            let _ = std::fs::remove_file(out);
            Err(e)
        }
    }
}
