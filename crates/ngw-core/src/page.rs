//! Page classification from the document URL
//!
//! Works directly on string slices; a content script classifies its page once
//! per pass and never needs a full URL parser for it.

use crate::types::{PageType, SiteType};

// =============================================================================
// URL Slicing
// =============================================================================

/// Host portion of `url`, lowercase comparisons are left to the caller.
pub fn extract_host(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(pos) => &url[pos + 3..],
        None => url,
    };
    let end = rest
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    let authority = &rest[..end];
    // Strip userinfo and port
    let host = match authority.rfind('@') {
        Some(pos) => &authority[pos + 1..],
        None => authority,
    };
    match host.find(':') {
        Some(pos) => &host[..pos],
        None => host,
    }
}

/// Path of `url`, "/" when absent.
pub fn extract_path(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(pos) => &url[pos + 3..],
        None => url,
    };
    let start = match rest.find(|c| matches!(c, '/' | '?' | '#')) {
        Some(pos) if rest.as_bytes()[pos] == b'/' => pos,
        _ => return "/",
    };
    let path = &rest[start..];
    let end = path.find(|c| matches!(c, '?' | '#')).unwrap_or(path.len());
    &path[..end]
}

/// Query string without the leading `?`, None when the URL has none.
pub fn extract_query(url: &str) -> Option<&str> {
    let start = url.find('?')?;
    let query = &url[start + 1..];
    let end = query.find('#').unwrap_or(query.len());
    Some(&query[..end])
}

/// Value of query parameter `name`. Values are compared undecoded.
pub fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (key == name).then_some(value)
    })
}

// =============================================================================
// Page Context
// =============================================================================

/// Where the content script is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub host: String,
    pub path: String,
    pub query: Option<String>,
    pub site: SiteType,
    pub page_type: PageType,
}

impl PageContext {
    pub fn from_url(url: &str) -> Self {
        let host = extract_host(url).to_ascii_lowercase();
        let path = extract_path(url);
        let query = extract_query(url);

        let site = if host.contains("google") {
            SiteType::Google
        } else {
            SiteType::Bing
        };
        let page_type = match site {
            SiteType::Bing => bing_page_type(path, query),
            SiteType::Google if host == "news.google.com" => PageType::GoogleNewsSite,
            SiteType::Google => google_page_type(query.unwrap_or("")),
        };

        Self {
            host,
            path: path.to_string(),
            query: query.map(str::to_string),
            site,
            page_type,
        }
    }

    /// Image and video grids leave gaps until the page re-lays them out.
    pub fn needs_relayout(&self) -> bool {
        matches!(self.page_type, PageType::BingImage | PageType::BingVideo)
    }
}

fn bing_page_type(path: &str, query: Option<&str>) -> PageType {
    if path.starts_with("/images/") {
        PageType::BingImage
    } else if path.starts_with("/news/") {
        PageType::BingNews
    } else if path.starts_with("/videos/") {
        PageType::BingVideo
    } else if matches!(path, "/shop" | "/shop/") && query.is_some() {
        PageType::BingShop
    } else {
        PageType::BingMain
    }
}

fn google_page_type(query: &str) -> PageType {
    let tbm = query_param(query, "tbm");
    let udm = query_param(query, "udm");
    let is = |tbm_value: &str, udm_value: &str| tbm == Some(tbm_value) || udm == Some(udm_value);

    if is("vid", "7") {
        PageType::GoogleVideo
    } else if is("nws", "4") {
        PageType::GoogleNews
    } else if is("isch", "2") {
        PageType::GoogleImage
    } else if is("shop", "28") {
        PageType::GoogleShop
    } else {
        PageType::GoogleMain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_host() {
        assert_eq!(extract_host("https://www.bing.com/search?q=x"), "www.bing.com");
        assert_eq!(extract_host("https://user:pw@www.google.co.jp:443/search"), "www.google.co.jp");
        assert_eq!(extract_host("https://news.google.com"), "news.google.com");
    }

    #[test]
    fn test_extract_path() {
        assert_eq!(extract_path("https://www.bing.com/images/search?q=x"), "/images/search");
        assert_eq!(extract_path("https://www.bing.com?q=x"), "/");
        assert_eq!(extract_path("https://www.bing.com"), "/");
    }

    #[test]
    fn test_query_param() {
        let query = extract_query("https://www.google.com/search?q=a&udm=28#frag").expect("query");
        assert_eq!(query, "q=a&udm=28");
        assert_eq!(query_param(query, "udm"), Some("28"));
        assert_eq!(query_param(query, "tbm"), None);
    }

    #[test]
    fn test_bing_page_types() {
        let cases = [
            ("https://www.bing.com/search?q=x", PageType::BingMain),
            ("https://www.bing.com/images/search?q=x", PageType::BingImage),
            ("https://www.bing.com/videos/search?q=x", PageType::BingVideo),
            ("https://www.bing.com/news/search?q=x", PageType::BingNews),
            ("https://www.bing.com/shop?q=x", PageType::BingShop),
            ("https://www.bing.com/shop", PageType::BingMain),
            ("https://www.bing.com/shop/?q=x", PageType::BingShop),
            ("https://www.bing.com/shopping?q=x", PageType::BingMain),
            ("https://www.bing.com/shops?q=x", PageType::BingMain),
        ];
        for (url, expected) in cases {
            let page = PageContext::from_url(url);
            assert_eq!(page.site, SiteType::Bing, "{url}");
            assert_eq!(page.page_type, expected, "{url}");
        }
    }

    #[test]
    fn test_google_page_types() {
        let cases = [
            ("https://www.google.com/search?q=x", PageType::GoogleMain),
            ("https://www.google.com/search?q=x&tbm=vid", PageType::GoogleVideo),
            ("https://www.google.com/search?q=x&udm=7", PageType::GoogleVideo),
            ("https://www.google.com/search?q=x&tbm=nws", PageType::GoogleNews),
            ("https://www.google.com/search?q=x&udm=4", PageType::GoogleNews),
            ("https://www.google.com/search?q=x&tbm=isch", PageType::GoogleImage),
            ("https://www.google.com/search?q=x&udm=2", PageType::GoogleImage),
            ("https://www.google.com/search?q=x&tbm=shop", PageType::GoogleShop),
            ("https://www.google.com/search?q=x&udm=28", PageType::GoogleShop),
            ("https://news.google.com/topics/abc", PageType::GoogleNewsSite),
        ];
        for (url, expected) in cases {
            assert_eq!(PageContext::from_url(url).page_type, expected, "{url}");
        }
    }

    #[test]
    fn test_video_takes_priority() {
        let page = PageContext::from_url("https://www.google.com/search?q=x&tbm=nws&udm=7");
        assert_eq!(page.page_type, PageType::GoogleVideo);
    }

    #[test]
    fn test_needs_relayout() {
        assert!(PageContext::from_url("https://www.bing.com/images/search?q=x").needs_relayout());
        assert!(!PageContext::from_url("https://www.bing.com/search?q=x").needs_relayout());
    }
}
