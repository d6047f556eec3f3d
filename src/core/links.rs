use percent_encoding::percent_decode_str;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Yields absolute URLs of every `<a href>` in `markup` whose resolved path
/// ends with `suffix` (case-sensitive). Repeated URLs are yielded once.
pub fn extract_links<'a>(
    markup: &str,
    base: &'a Url,
    suffix: &'a str,
) -> impl Iterator<Item = Url> + 'a {
    let mut seen = HashSet::new();

    anchor_hrefs(markup)
        .into_iter()
        .filter_map(move |href| base.join(&href).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .filter(move |url| url.path().ends_with(suffix))
        .filter(move |url| seen.insert(url.clone()))
}

fn anchor_hrefs(markup: &str) -> Vec<String> {
    let document = Html::parse_document(markup);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decoded last path segment of `url`, e.g. `naca0012.dat`.
///
/// `None` when the segment is empty, is not valid UTF-8 once decoded, or
/// decodes to something that is not a plain file name (`a%2Fb`, `..`).
pub fn file_name(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let decoded = percent_decode_str(segment).decode_utf8().ok()?;

    if matches!(decoded.as_ref(), "" | "." | "..") || decoded.contains(['/', '\\']) {
        return None;
    }
    Some(decoded.into_owned())
}
