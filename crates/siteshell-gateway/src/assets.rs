//! Static resource classification
//!
//! A sub-resource is cacheable when its file extension matches a fixed
//! allow-list of scripts, styles, images, fonts, and icons. The same
//! extension drives the MIME type of cached responses.

/// Extensions that mark a request as a cacheable static resource
const STATIC_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", // images
    "css", "js", // styles and scripts
    "woff", "woff2", "ttf", "eot", // fonts
    "svg", "ico", // icons
];

/// Extract the final extension of a path, lowercased. Query strings and
/// fragments are not part of the extension.
fn extension(path: &str) -> Option<String> {
    let path = path
        .split_once(['?', '#'])
        .map(|(p, _)| p)
        .unwrap_or(path);
    let name = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Whether the requested path names a cacheable static resource
pub fn is_static_resource(path: &str) -> bool {
    extension(path).is_some_and(|ext| STATIC_EXTENSIONS.contains(&ext.as_str()))
}

/// MIME type for a static resource path, derived from its extension
pub fn mime_type(path: &str) -> &'static str {
    match extension(path).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
