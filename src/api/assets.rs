use axum::{
    body::Body,
    extract::Path,
    http::header,
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;
use std::path::Path as FsPath;
use tracing::debug;

use super::ApiError;

#[derive(RustEmbed)]
#[folder = "assets"]
pub struct StaticAssets;

/// `GET /static/{*path}`
pub async fn serve_static(Path(path): Path<String>) -> Result<Response, ApiError> {
    let path = path.trim_start_matches('/');

    let Some(content) = StaticAssets::get(path) else {
        return Err(ApiError::not_found("Asset", path));
    };

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok((
        [(header::CONTENT_TYPE, mime.as_ref())],
        Body::from(content.data),
    )
        .into_response())
}

/// Writes every embedded asset below `out_dir`, keeping relative paths.
/// Returns the number of files written.
pub async fn collect_static(out_dir: &FsPath) -> anyhow::Result<usize> {
    let mut written = 0;

    for name in StaticAssets::iter() {
        let Some(content) = StaticAssets::get(&name) else {
            continue;
        };

        let target = out_dir.join(name.as_ref());
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, content.data.as_ref()).await?;
        debug!("Collected {}", target.display());
        written += 1;
    }

    Ok(written)
}
