//! Outbound requests to the JSON API being proxied.
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::{form_urlencoded, Url};

use crate::errors::UpstreamError;

/// Query parameter holding the JSONPath expression.
pub const JSONPATH_PARAM: &str = "jsonpath";

/// Where a request is proxied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A route relative to the configured CoinGecko base URL.
    CoinGecko { route: String },
    /// An absolute URL taken from the request path.
    Any { url: String },
}

impl Target {
    /// Inbound query parameters that are not forwarded upstream.
    pub fn consumed_params(&self) -> &'static [&'static str] {
        match self {
            Target::CoinGecko { .. } => &[JSONPATH_PARAM],
            Target::Any { .. } => &["url", JSONPATH_PARAM],
        }
    }

    /// The upstream URL, before forwarded parameters are added.
    pub fn outbound_url(&self, coingecko_url: &Url) -> Result<Url, UpstreamError> {
        let url = match self {
            Target::CoinGecko { route } => {
                format!("{}{}", coingecko_url, route.trim_start_matches('/'))
            }
            Target::Any { url } => repair_url(url),
        };

        Url::parse(&url).map_err(|source| UpstreamError::InvalidUrl { url, source })
    }
}

/// Restore a scheme separator that was collapsed to a single slash, as
/// happens when an absolute URL travels in a request path
/// (`https:/example.com` becomes `https://example.com`).
pub fn repair_url(url: &str) -> String {
    match url.split_once(":/") {
        Some((scheme, rest))
            if !rest.starts_with('/')
                && !scheme.is_empty()
                && scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) =>
        {
            format!("{}://{}", scheme, rest)
        }
        _ => url.to_owned(),
    }
}

/// Query parameters of an inbound request, split into the JSONPath
/// expression and the parameters to forward upstream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InboundQuery {
    pub jsonpath: Option<String>,
    pub forwarded: Vec<(String, String)>,
}

impl InboundQuery {
    /// Split the raw query string `raw`. Parameters named in `consumed` are
    /// dropped. Forwarded parameters keep their order. If `jsonpath` is
    /// repeated the last one wins.
    pub fn parse(raw: Option<&str>, consumed: &[&str]) -> Self {
        let mut query = InboundQuery::default();

        for (key, value) in form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            if key == JSONPATH_PARAM {
                query.jsonpath = Some(value.into_owned());
            } else if !consumed.contains(&key.as_ref()) {
                query.forwarded.push((key.into_owned(), value.into_owned()));
            }
        }

        query
    }
}

/// GET `url` with `params` appended to its query string and parse the
/// response body as JSON.
pub async fn fetch_json(
    client: &Client,
    url: Url,
    params: &[(String, String)],
) -> Result<Value, UpstreamError> {
    debug!(%url, params = params.len(), "fetching upstream json");

    let response = match client.get(url.clone()).query(params).send().await {
        Ok(response) => response,
        Err(err) => {
            warn!(%url, "upstream request failed: {}", err);
            return Err(err.into());
        }
    };

    let status = response.status();
    let body = response.text().await?;

    if status.is_client_error() || status.is_server_error() {
        warn!(%url, status = status.as_u16(), "upstream returned an error status");
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_collapsed_scheme() {
        assert_eq!(
            repair_url("https:/api.example.com/v1?a=1"),
            "https://api.example.com/v1?a=1"
        );
    }

    #[test]
    fn leaves_good_urls_alone() {
        assert_eq!(
            repair_url("https://api.example.com/v1"),
            "https://api.example.com/v1"
        );
        assert_eq!(repair_url("not a url"), "not a url");
    }

    #[test]
    fn coingecko_route() {
        let base = Url::parse("https://api.coingecko.com/api/v3/").unwrap();
        let target = Target::CoinGecko {
            route: String::from("simple/price"),
        };
        assert_eq!(
            target.outbound_url(&base).unwrap().as_str(),
            "https://api.coingecko.com/api/v3/simple/price"
        );
    }

    #[test]
    fn invalid_any_url() {
        let base = Url::parse("https://api.coingecko.com/api/v3/").unwrap();
        let target = Target::Any {
            url: String::from("nowhere"),
        };
        assert!(matches!(
            target.outbound_url(&base),
            Err(UpstreamError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn forwards_unconsumed_params_in_order() {
        let query = InboundQuery::parse(
            Some("ids=bitcoin%2Cethereum&jsonpath=ethereum.aud&vs_currencies=usd,aud"),
            &[JSONPATH_PARAM],
        );
        assert_eq!(query.jsonpath.as_deref(), Some("ethereum.aud"));
        assert_eq!(
            query.forwarded,
            vec![
                (String::from("ids"), String::from("bitcoin,ethereum")),
                (String::from("vs_currencies"), String::from("usd,aud")),
            ]
        );
    }

    #[test]
    fn drops_url_param_for_any_target() {
        let target = Target::Any {
            url: String::from("https://example.com"),
        };
        let query = InboundQuery::parse(Some("url=x&limit=5"), target.consumed_params());
        assert_eq!(
            query.forwarded,
            vec![(String::from("limit"), String::from("5"))]
        );
    }

    #[test]
    fn no_query() {
        assert_eq!(InboundQuery::parse(None, &[]), InboundQuery::default());
    }
}
