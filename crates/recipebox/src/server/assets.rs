//! Static file serving from the public directory.
//!
//! Any request the API does not claim ends up here, whatever its method.

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use super::error::ApiError;
use super::AppState;

/// Document served for the root path.
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// Content type for extensions missing from the table.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Fallback handler: stream the requested file or answer 404.
pub async fn serve_asset(State(state): State<AppState>, request: Request) -> Response {
    let Some(path) = resolve_public_path(&state.public_dir, request.uri().path()) else {
        debug!("Undecodable path {}", request.uri().path());
        return ApiError::NotFound.into_response();
    };

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => {
            debug!("No file at {}", path.display());
            return ApiError::NotFound.into_response();
        }
    }

    // ServeFile answers only GET and HEAD
    let (mut parts, _) = request.into_parts();
    if parts.method != Method::HEAD {
        parts.method = Method::GET;
    }
    let request = Request::from_parts(parts, Body::empty());

    let content_type = content_type_for(&path);
    let mut response = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    if response.status().is_success() {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response.into_response()
}

/// Map a request path onto a file path under `root`.
///
/// The path is percent-decoded and split on both slash kinds. Empty and `.`
/// components are dropped; `..` removes the previous component and is
/// discarded at the top, so the result always stays under `root`. An empty
/// result maps to [`DEFAULT_DOCUMENT`]. Returns `None` if the path is not
/// valid UTF-8 once decoded.
#[must_use]
pub fn resolve_public_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;

    let mut components: Vec<&str> = Vec::new();
    for component in decoded.split(['/', '\\']) {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }

    if components.is_empty() {
        return Some(root.join(DEFAULT_DOCUMENT));
    }

    let mut path = root.to_path_buf();
    path.extend(components);
    Some(path)
}

/// Content type for a file, chosen by extension (case-insensitive).
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("html") => "text/html",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("txt") => "text/plain",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/srv/public")
    }

    #[test]
    fn test_root_maps_to_default_document() {
        assert_eq!(
            resolve_public_path(&root(), "/"),
            Some(root().join("index.html"))
        );
        assert_eq!(
            resolve_public_path(&root(), ""),
            Some(root().join("index.html"))
        );
    }

    #[test]
    fn test_plain_paths() {
        assert_eq!(
            resolve_public_path(&root(), "/scripts/load-recipes.js"),
            Some(root().join("scripts").join("load-recipes.js"))
        );
        assert_eq!(
            resolve_public_path(&root(), "/data/recipes.json"),
            Some(root().join("data").join("recipes.json"))
        );
    }

    #[test]
    fn test_traversal_is_clamped_to_root() {
        for attempt in [
            "/../secret.txt",
            "/../../secret.txt",
            "/%2e%2e/secret.txt",
            "/%2E%2E%2Fsecret.txt",
            "/..\\secret.txt",
            "/a/../../secret.txt",
        ] {
            let path = resolve_public_path(&root(), attempt).unwrap();
            assert_eq!(path, root().join("secret.txt"), "for {attempt}");
        }
    }

    #[test]
    fn test_inner_parent_components_resolve() {
        assert_eq!(
            resolve_public_path(&root(), "/css/../js/./app.js"),
            Some(root().join("js").join("app.js"))
        );
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(
            resolve_public_path(&root(), "/my%20recipes.html"),
            Some(root().join("my recipes.html"))
        );
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        assert_eq!(resolve_public_path(&root(), "/%ff%fe"), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("index.html")), "text/html");
        assert_eq!(content_type_for(Path::new("INDEX.HTML")), "text/html");
        assert_eq!(
            content_type_for(Path::new("app.js")),
            "application/javascript"
        );
        assert_eq!(content_type_for(Path::new("style.css")), "text/css");
        assert_eq!(content_type_for(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("logo.svg")), "image/svg+xml");
    }

    #[test]
    fn test_unknown_extension_is_binary() {
        assert_eq!(content_type_for(Path::new("archive.tar.gz")), FALLBACK_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("Makefile")), FALLBACK_CONTENT_TYPE);
    }
}
