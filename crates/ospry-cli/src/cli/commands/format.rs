//! `ospry format <url>` – print a formatted download URL.

use anyhow::Result;
use ospry_core::{Client, FormatOptions};

pub fn run_format(client: &Client, url: &str, opts: FormatOptions) -> Result<()> {
    let formatted = client.format_url(url, &opts)?;
    println!("{}", formatted);
    Ok(())
}
