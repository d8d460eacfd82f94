use regex::Regex;
use std::sync::OnceLock;

/// Matches a trailing `#anchor` fragment (word characters and dashes)
fn fragment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#[\w-]+$").expect("fragment regex"))
}

/// Derives the canonical URL (CU) from a raw URL
///
/// The CU is the identity key across the cache and visited tracking: the
/// `http://`/`https://` prefix is removed, as is any trailing slash. Two
/// raw URLs differing only in scheme or trailing slash map to the same CU.
///
/// # Examples
///
/// ```
/// use magpie::url::canonicalize;
///
/// assert_eq!(canonicalize("https://example-home.test/a/"), "example-home.test/a");
/// assert_eq!(canonicalize("http://example-home.test/a"), "example-home.test/a");
/// ```
pub fn canonicalize(raw: &str) -> String {
    let stripped = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw);
    stripped.trim_end_matches('/').to_string()
}

/// Removes a trailing `#anchor` fragment, if present
///
/// Anchor-only variants of a page collapse to their base before admission
/// so the frontier never carries both.
pub fn strip_fragment(url: &str) -> String {
    fragment_re().replace(url, "").into_owned()
}

/// Returns the artifact filename stem for a CU
///
/// Path separators are flattened to underscores; the pipeline appends
/// `.html`, `.pdf` or `.txt`.
pub fn artifact_stem(cu: &str) -> String {
    cu.replace('/', "_")
}

/// Prefixes `http://` when the URL has no scheme
///
/// Command-line seeds are commonly given as bare hostnames.
pub fn ensure_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}
