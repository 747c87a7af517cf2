//! `ospry claim|make-private|make-public <id>...` – change image state.

use anyhow::{Context, Result};
use ospry_core::Client;

use super::print_images;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    Claim,
    MakePrivate,
    MakePublic,
}

pub async fn run_update(client: &Client, update: Update, ids: Vec<String>) -> Result<()> {
    let images = tokio::task::spawn_blocking({
        let client = client.clone();
        move || {
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            match update {
                Update::Claim => client.claim(&ids),
                Update::MakePrivate => client.make_private(&ids),
                Update::MakePublic => client.make_public(&ids),
            }
        }
    })
    .await
    .context("update task join")??;
    print_images(&images);
    Ok(())
}
