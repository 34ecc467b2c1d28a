use crate::{UrlError, UrlResult};
use url::Url;

/// Path prefix of a direct category page
const SUBJECT_PREFIX: &str = "/subjects/";

/// Path prefix of a search-style link
const SEARCH_PREFIX: &str = "/search";

/// Parses and checks the site origin every relative link is qualified against
///
/// # Examples
///
/// ```
/// use shelfmark::url::parse_base_url;
///
/// let base = parse_base_url("https://openlibrary.org").unwrap();
/// assert_eq!(base.as_str(), "https://openlibrary.org/");
/// ```
pub fn parse_base_url(base: &str) -> UrlResult<Url> {
    let url = Url::parse(base).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Turns an anchor label into a category slug
///
/// Lower-cases the label and joins its whitespace-separated words with underscores.
///
/// ```
/// use shelfmark::url::subject_slug;
///
/// assert_eq!(subject_slug("  Classic Sci Fi "), "classic_sci_fi");
/// ```
pub fn subject_slug(label: &str) -> String {
    label
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Normalizes a subject-like anchor into a canonical category URL
///
/// # Rules
///
/// 1. A direct category path (`/subjects/<name>`) is kept verbatim, qualified
///    against `base`
/// 2. A search-style link (`/search...`) is rewritten to `/subjects/<slug>`, where the
///    slug is built from the anchor's visible text
/// 3. Anything else (other paths, other origins, unparseable hrefs, the bare
///    `/subjects/` index, search links with no label) yields `None`
///
/// # Examples
///
/// ```
/// use shelfmark::url::normalize_subject_link;
/// use url::Url;
///
/// let base = Url::parse("https://openlibrary.org").unwrap();
///
/// let direct = normalize_subject_link("Fiction", "/subjects/fiction", &base).unwrap();
/// assert_eq!(direct.as_str(), "https://openlibrary.org/subjects/fiction");
///
/// let search = normalize_subject_link("Classic Sci Fi", "/search?q=x", &base).unwrap();
/// assert_eq!(search.as_str(), "https://openlibrary.org/subjects/classic_sci_fi");
///
/// assert!(normalize_subject_link("Edit", "/edit/123", &base).is_none());
/// ```
pub fn normalize_subject_link(text: &str, href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let resolved = base.join(href).ok()?;
    if resolved.origin() != base.origin() {
        return None;
    }

    let path = resolved.path();

    if let Some(name) = path.strip_prefix(SUBJECT_PREFIX) {
        if name.is_empty() {
            return None;
        }
        return Some(resolved);
    }

    if path.starts_with(SEARCH_PREFIX) {
        let slug = subject_slug(text);
        if slug.is_empty() {
            return None;
        }
        return base.join(&format!("{}{}", SUBJECT_PREFIX, slug)).ok();
    }

    None
}

/// Qualifies a book detail href against the site origin
///
/// Returns `None` for hrefs that cannot be resolved or point at another origin.
///
/// ```
/// use shelfmark::url::qualify_book_link;
/// use url::Url;
///
/// let base = Url::parse("https://openlibrary.org").unwrap();
/// let link = qualify_book_link("/books/OL7353617M", &base).unwrap();
/// assert_eq!(link.as_str(), "https://openlibrary.org/books/OL7353617M");
/// ```
pub fn qualify_book_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let resolved = base.join(href).ok()?;
    if resolved.origin() != base.origin() {
        return None;
    }

    Some(resolved)
}
