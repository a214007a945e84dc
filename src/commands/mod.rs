//! Command handlers behind the CLI.
//!
//! - [`convert_files`]: convert files and directories into an output directory
//! - [`media_info`]: look up a YouTube or Instagram link on the backend
//! - [`download_media`]: have the backend prepare a download and fetch it

mod convert;
mod download;

pub use convert::{ConvertOutput, LoadedInputs, convert_files, load_inputs};
pub use download::{DownloadOutput, InfoOutput, download_media, media_info};
