pub mod error;
pub mod validation;
pub mod formats;
pub mod dimensions;
pub mod pattern;
pub mod fs;

pub use error::{ConverterError, ConverterResult};
pub use validation::{validate_settings, partition_supported};
pub use formats::{
    MediaKind,
    TargetFormat,
    extension_of,
    mime_from_extension,
    mime_type_for,
    resolve_format,
    stem_of,
};
pub use dimensions::compute_dimensions;
pub use pattern::{Clock, FixedClock, SystemClock, apply_pattern, output_file_name};
pub use fs::{create_dir_all, unique_output_path, write_result};
