//! URL utilities for stream URL rewriting

use url::Url;

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Overwrite query parameters with set semantics
    ///
    /// For each `(key, value)`: the first existing pair with that key gets the
    /// new value in place, later duplicates are dropped, and the pair is
    /// appended when the key is absent. Unrelated parameters keep their order.
    ///
    /// ```rust
    /// use pluto_iptv_proxy::utils::UrlUtils;
    /// use url::Url;
    ///
    /// let mut url = Url::parse("http://a.example/s.m3u8?sid=1&x=2&sid=3").unwrap();
    /// UrlUtils::set_query_params(&mut url, &[("sid", "9".to_string()), ("y", "".to_string())]);
    /// assert_eq!(url.as_str(), "http://a.example/s.m3u8?sid=9&x=2&y=");
    /// ```
    pub fn set_query_params(url: &mut Url, params: &[(&str, String)]) {
        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        for (key, value) in params {
            let mut seen = false;
            pairs.retain_mut(|(existing_key, existing_value)| {
                if existing_key.as_str() != *key {
                    return true;
                }
                if seen {
                    return false;
                }
                seen = true;
                existing_value.clone_from(value);
                true
            });
            if !seen {
                pairs.push((key.to_string(), value.clone()));
            }
        }

        url.query_pairs_mut().clear().extend_pairs(pairs.iter());
    }
}
