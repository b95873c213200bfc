use crate::http::HttpClient;
use anyhow::{Context, Result};
use log::{info, warn};
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

/// Downloads `url` into `{dir}/{filename}` and returns that path.
///
/// The body is written to `{dir}/.{filename}.part` and moved into place
/// only once it was received completely. On failure the partial file is
/// removed and the target is left untouched. The partial file is only
/// created once the server has answered 200.
#[tracing::instrument(skip(http_client))]
pub async fn download_binary(
    http_client: &HttpClient,
    url: &str,
    dir: &Path,
    filename: &str,
) -> Result<PathBuf> {
    info!("Downloading file from {}...", url);

    let target = dir.join(filename);
    let temp_path = dir.join(format!(".{}.part", filename));

    let result = http_client
        .download_file(url, || {
            File::create(&temp_path)
                .map(BufWriter::new)
                .with_context(|| format!("Failed to create output file at {:?}", temp_path))
        })
        .await
        .with_context(|| format!("Failed to download {}", url));

    let bytes = match result {
        Ok(bytes) => bytes,
        Err(e) => {
            discard_partial(&temp_path);
            return Err(e);
        }
    };

    if let Err(e) = fs::rename(&temp_path, &target) {
        discard_partial(&temp_path);
        return Err(e).with_context(|| format!("Failed to move download into {:?}", target));
    }

    info!("Download complete: {} bytes written to {:?}", bytes, target);
    Ok(target)
}

fn discard_partial(temp_path: &Path) {
    match fs::remove_file(temp_path) {
        Err(e) if e.kind() != ErrorKind::NotFound => {
            warn!("Failed to remove partial download {:?}: {}", temp_path, e);
        }
        _ => {}
    }
}
