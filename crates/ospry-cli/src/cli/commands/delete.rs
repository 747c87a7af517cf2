//! `ospry delete <id>...` – delete images.

use anyhow::{Context, Result};
use ospry_core::Client;

pub async fn run_delete(client: &Client, ids: Vec<String>) -> Result<()> {
    let count = ids.len();
    tokio::task::spawn_blocking({
        let client = client.clone();
        move || {
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            client.delete(&ids)
        }
    })
    .await
    .context("delete task join")??;
    println!("Deleted {} image(s).", count);
    Ok(())
}
