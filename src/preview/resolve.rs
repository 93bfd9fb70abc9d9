//! Request target resolution
//!
//! Maps a request target such as `/img/logo%20small.png?x` onto a path
//! under the document's base directory and decides what kind of request it
//! is.

use std::path::{Component, Path, PathBuf};
use url::Url;

/// Query string that asks for the raw stored content.
pub const RAW_QUERY: &str = "markdown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `/` without the raw query
    Root,
    /// Any path with the raw query
    RawFetch,
    /// Anything else; a candidate static asset
    Asset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub kind: RequestKind,
    /// Normalized path component of the target, still percent-encoded
    pub url_path: String,
    /// Local candidate, `None` when the target cannot name a file under
    /// the base directory
    pub local_path: Option<PathBuf>,
}

impl Resolved {
    pub fn is_root(&self) -> bool {
        self.url_path == "/"
    }
}

/// Resolve `target` against `base_dir`.
///
/// Dot segments are normalized while parsing. Each path segment is then
/// percent-decoded and joined component by component, so a decoded
/// absolute path is re-rooted under `base_dir` instead of replacing it.
/// Any remaining `..` component, a NUL byte or an unset base directory
/// leave `local_path` empty.
pub fn resolve(target: &str, base_dir: &Path) -> Resolved {
    let Some(url) = parse_target(target) else {
        return Resolved {
            kind: RequestKind::Asset,
            url_path: target.to_string(),
            local_path: None,
        };
    };

    let url_path = url.path().to_string();
    let kind = if url.query() == Some(RAW_QUERY) {
        RequestKind::RawFetch
    } else if url_path == "/" {
        RequestKind::Root
    } else {
        RequestKind::Asset
    };

    Resolved {
        kind,
        url_path,
        local_path: join_under(base_dir, &url),
    }
}

fn parse_target(target: &str) -> Option<Url> {
    if target.starts_with('/') {
        // Origin-form. Prefixing keeps a leading "//" in the path rather
        // than letting it be read as an authority.
        Url::parse(&format!("http://localhost{target}")).ok()
    } else {
        // Absolute-form, as sent to proxies
        Url::parse(target)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
    }
}

fn join_under(base_dir: &Path, url: &Url) -> Option<PathBuf> {
    if base_dir.as_os_str().is_empty() {
        return None;
    }

    let mut path = base_dir.to_path_buf();

    for segment in url.path_segments()? {
        let decoded = urlencoding::decode_binary(segment.as_bytes());
        let decoded = String::from_utf8_lossy(&decoded);

        if decoded.contains('\0') {
            tracing::debug!(path = url.path(), "NUL byte in request path");
            return None;
        }

        for component in Path::new(decoded.as_ref()).components() {
            match component {
                Component::Normal(name) => path.push(name),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
                Component::ParentDir => {
                    tracing::debug!(path = url.path(), "Parent directory in request path");
                    return None;
                }
            }
        }
    }

    Some(path)
}
