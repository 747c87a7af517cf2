//! `ospry metadata <id>...` – show image metadata.

use anyhow::{Context, Result};
use ospry_core::{Client, ImageMetadata};

pub fn print_images(images: &[ImageMetadata]) {
    if images.is_empty() {
        println!("No images.");
        return;
    }
    println!(
        "{:<24}  {:<7}  {:<7}  {:<24}  URL",
        "ID", "PRIVATE", "CLAIMED", "CREATED"
    );
    for img in images {
        println!(
            "{:<24}  {:<7}  {:<7}  {:<24}  {}",
            img.id,
            if img.is_private { "yes" } else { "no" },
            if img.is_claimed { "yes" } else { "no" },
            img.time_created.format("%Y-%m-%d %H:%M:%S UTC"),
            img.url
        );
    }
}

pub async fn run_metadata(client: &Client, ids: Vec<String>) -> Result<()> {
    let images = tokio::task::spawn_blocking({
        let client = client.clone();
        move || {
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            client.get_metadata(&ids)
        }
    })
    .await
    .context("metadata task join")??;
    print_images(&images);
    Ok(())
}
