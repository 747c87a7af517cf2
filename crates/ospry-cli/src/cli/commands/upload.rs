//! `ospry upload <path>` – upload an image file.

use anyhow::{Context, Result};
use ospry_core::Client;
use std::path::Path;

use super::print_images;

pub async fn run_upload(
    client: &Client,
    path: &Path,
    filename: Option<String>,
    private: bool,
) -> Result<()> {
    let filename = match filename {
        Some(name) => name,
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name; pass --filename", path.display()))?,
    };
    let image = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;

    let img = tokio::task::spawn_blocking({
        let client = client.clone();
        move || client.upload(&filename, private, image)
    })
    .await
    .context("upload task join")??;

    print_images(std::slice::from_ref(&img));
    Ok(())
}
