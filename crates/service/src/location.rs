//! Turns request paths and parameters into upstream document URLs.

use crate::error::ServiceError;
use schsvg_resource::HttpSourceProvider;

const GITHUB_RAW: &str = "https://raw.githubusercontent.com";

/// Maps `owner/repo/blob/ref/path.sch` (as shown in the GitHub web UI) to
/// the raw file URL. The request's query string is passed through.
pub fn github_raw_url(path: &str, query: Option<&str>) -> Result<String, ServiceError> {
    let segments: Vec<&str> = path.trim_start_matches('/').splitn(5, '/').collect();
    let [owner, repo, "blob", reference, file] = segments.as_slice() else {
        return Err(ServiceError::InvalidRequest(format!(
            "expected /github/<owner>/<repo>/blob/<ref>/<path>.sch, got /github/{path}"
        )));
    };
    let mut url = format!("{GITHUB_RAW}/{owner}/{repo}/{reference}/{file}");
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    normalize_render_url(&url)
}

/// Checks the scheme and extension of a document URL, dropping a trailing
/// `.svg` after `.sch`.
pub fn normalize_render_url(location: &str) -> Result<String, ServiceError> {
    let mut url = HttpSourceProvider::parse_location(location)
        .map_err(|e| ServiceError::InvalidRequest(e.to_string()))?;

    let path = url.path().to_string();
    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".sch.svg") {
        url.set_path(&path[..path.len() - ".svg".len()]);
    } else if !lower.ends_with(".sch") {
        return Err(ServiceError::InvalidRequest(format!(
            "{location}: not a .sch document"
        )));
    }
    Ok(url.to_string())
}
