pub mod config;
pub mod logging;

pub mod api_key;
pub mod client;
pub mod control;
pub mod error;
pub mod retry;
pub mod transport;
pub mod url_format;

pub use api_key::ApiKey;
pub use client::{Client, ImageMetadata};
pub use error::{ApiError, FormatError};
pub use url_format::{FormatOptions, ImageFormat};
