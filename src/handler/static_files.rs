//! Static file serving module
//!
//! Handles files, directory index files, directory listings and the
//! trailing-slash redirect.

use std::fs::Metadata;
use std::io;
use std::path::Path;

use hyper::body::Bytes;
use hyper::Response;
use tokio::fs;

use crate::config::AppState;
use crate::handler::listing;
use crate::handler::resolve;
use crate::handler::router::RequestContext;
use crate::http::{self, date, mime, ResponseBody};

/// Serve whatever the request path names under the root
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<ResponseBody> {
    let target = match resolve::resolve(&state.root, ctx.path).await {
        Ok(p) => p,
        Err(e) => return error_for_io(&e),
    };
    let metadata = match fs::metadata(&target).await {
        Ok(m) => m,
        Err(e) => return error_for_io(&e),
    };

    if metadata.is_dir() {
        return serve_directory(ctx, state, &target).await;
    }

    // "/file.txt/" names a directory that does not exist
    if ctx.path.ends_with('/') {
        return http::build_404_response();
    }

    serve_file(ctx, &target, &metadata).await
}

async fn serve_directory(
    ctx: &RequestContext<'_>,
    state: &AppState,
    dir: &Path,
) -> Response<ResponseBody> {
    if !ctx.path.ends_with('/') {
        let location = match ctx.query {
            Some(q) => format!("{}/?{q}", ctx.path),
            None => format!("{}/", ctx.path),
        };
        return http::build_redirect_response(&location);
    }

    for index_file in &state.index_files {
        let Ok(index_path) = resolve::contained(&state.root, &dir.join(index_file)).await else {
            continue;
        };
        if let Ok(index_meta) = fs::metadata(&index_path).await {
            if index_meta.is_file() {
                return serve_file(ctx, &index_path, &index_meta).await;
            }
        }
    }

    listing::list_directory(ctx, dir).await
}

async fn serve_file(
    ctx: &RequestContext<'_>,
    path: &Path,
    metadata: &Metadata,
) -> Response<ResponseBody> {
    let modified = metadata.modified().ok();

    if let (Some(modified), Some(since), false) =
        (modified, ctx.if_modified_since, ctx.has_if_none_match)
    {
        if date::not_modified_since(modified, since) {
            return http::build_304_response();
        }
    }

    // Open even for HEAD so permission problems still surface
    let file = match fs::File::open(path).await {
        Ok(file) => file,
        Err(e) => return error_for_io(&e),
    };
    let body = if ctx.is_head {
        http::full_body(Bytes::new())
    } else {
        http::file_body(file)
    };

    let last_modified = modified.map(date::format_http_date);
    http::build_file_response(
        body,
        metadata.len(),
        mime::content_type_for(path),
        last_modified.as_deref(),
    )
}

fn error_for_io(err: &io::Error) -> Response<ResponseBody> {
    match err.kind() {
        io::ErrorKind::PermissionDenied => http::build_403_response(),
        _ => http::build_404_response(),
    }
}
