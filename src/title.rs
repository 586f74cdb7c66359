use reqwest::Url;
use tracing::debug;

/// Titles shorter than this are replaced by the URL host
const MIN_TITLE_CHARS: usize = 3;

/// Title to submit for a new bookmark.
///
/// A short title is replaced by the URL host without a leading `www.`.
/// When the URL does not parse or has no host the title is kept as given.
pub fn derive_title(title: &str, url: &str) -> String {
    if title.chars().count() >= MIN_TITLE_CHARS {
        return title.to_string();
    }

    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.strip_prefix("www.").unwrap_or(host).to_string(),
            None => {
                debug!("URL has no host, keeping title: {}", url);
                title.to_string()
            }
        },
        Err(e) => {
            debug!("Could not parse URL {}: {}, keeping title", url, e);
            title.to_string()
        }
    }
}
