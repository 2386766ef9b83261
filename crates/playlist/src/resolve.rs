use url::Url;

/// Resolves `uri` against `base`, as a browser resolves a link.
///
/// When `base` is not an absolute URL, `uri` is appended to its directory
/// part instead, which covers playlists addressed by relative path.
pub fn resolve_uri(base: &str, uri: &str) -> String {
    if let Ok(absolute) = Url::parse(uri) {
        return absolute.into();
    }

    match Url::parse(base).and_then(|base| base.join(uri)) {
        Ok(resolved) => resolved.into(),
        Err(_) => {
            if uri.starts_with('/') {
                return uri.to_string();
            }
            match base.rfind('/') {
                Some(slash) => format!("{}{}", &base[..=slash], uri),
                None => uri.to_string(),
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_relative_to_absolute_base() {
        assert_eq!(
            resolve_uri("http://example.com/live/master.m3u8", "hd/index.m3u8"),
            "http://example.com/live/hd/index.m3u8"
        );
        assert_eq!(
            resolve_uri("http://example.com/live/hd/index.m3u8", "/seg/1.ts"),
            "http://example.com/seg/1.ts"
        );
        assert_eq!(
            resolve_uri("http://example.com/live/hd/index.m3u8", "../audio.m3u8"),
            "http://example.com/live/audio.m3u8"
        );
    }

    #[test]
    fn test_absolute_uri_wins() {
        assert_eq!(
            resolve_uri("http://example.com/a.m3u8", "https://cdn.example.com/1.ts"),
            "https://cdn.example.com/1.ts"
        );
    }

    #[test]
    fn test_relative_base_fallback() {
        assert_eq!(resolve_uri("streams/master.m3u8", "low.m3u8"), "streams/low.m3u8");
        assert_eq!(resolve_uri("master.m3u8", "low.m3u8"), "low.m3u8");
        assert_eq!(resolve_uri("streams/master.m3u8", "/abs.ts"), "/abs.ts");
    }
}
