use std::path::{Path, PathBuf};
use tokio::fs;
use crate::core::ConversionResult;
use crate::utils::{ConverterError, ConverterResult};

/// Creates `dir` and any missing parents
pub async fn create_dir_all(dir: impl AsRef<Path>) -> ConverterResult<()> {
    fs::create_dir_all(dir.as_ref())
        .await
        .map_err(|e| ConverterError::io(format!("Cannot create output directory: {e}")))
}

/// Returns a path in `dir` for `name` that does not exist yet.
///
/// Appends ` (1)`, ` (2)`, ... before the extension on collision.
pub fn unique_output_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let ext = path.extension().and_then(|e| e.to_str());
    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Writes a converted result into `dir`, returning the written path
pub async fn write_result(dir: &Path, result: &ConversionResult) -> ConverterResult<PathBuf> {
    create_dir_all(dir).await?;
    let path = unique_output_path(dir, &result.output_name);
    fs::write(&path, &result.output_bytes[..])
        .await
        .map_err(|e| ConverterError::io(format!("Failed to write '{}': {e}", path.display())))?;
    Ok(path)
}
