//! CLI command handlers, one file per command.

mod delete;
mod download;
mod format;
mod metadata;
mod update;
mod upload;

pub use delete::run_delete;
pub use download::run_download;
pub use format::run_format;
pub use metadata::{print_images, run_metadata};
pub use update::{run_update, Update};
pub use upload::run_upload;
