//! HTTP routes.
use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use reqwest::Client;
use tower_http::trace::TraceLayer;
use tracing::error;
use url::Url;

use crate::{
    config::ProxyConfig,
    errors::ConfigError,
    pipeline::{value_pipeline, xml_pipeline},
    upstream::Target,
};

const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

const WELCOME: &str = r#"<!DOCTYPE html>
<html>
<head><title>Cryptocurrency data API for Google Sheets</title></head>
<body>
Welcome!<br>
<a href="/docs">Docs</a><br>
</body>
</html>
"#;

const DOCS: &str = "\
Cryptocurrency data API for Google Sheets

GET /xml/coingecko/{route}?{params}[&jsonpath={expr}]
    GET any route of the CoinGecko API and encode the JSON response as XML
    under the root element. With jsonpath, the matching part of the
    response is encoded instead.

    =importxml(\"https://your-api-address/xml/coingecko/simple/price?ids=bitcoin&vs_currencies=usd\", \"result/bitcoin/usd\")
    =importxml(\"https://your-api-address/xml/coingecko/simple/price?ids=bitcoin&vs_currencies=usd&jsonpath=bitcoin.usd\", \"result\")

GET /xml/any/{url}[&jsonpath={expr}]
    GET JSON from any URL and encode it as XML.

    =importxml(\"https://your-api-address/xml/any/https://api.example.com/quotes?symbol=ETH&jsonpath=price\", \"result\")

GET /value/coingecko/{route}?{params}&jsonpath={expr}
    GET any route of the CoinGecko API and return the one value matching
    jsonpath as plain text, for use with IMPORTDATA.

    =importdata(\"https://your-api-address/value/coingecko/simple/price?ids=bitcoin&vs_currencies=usd&jsonpath=bitcoin.usd\")

GET /value/any/{url}&jsonpath={expr}
    GET JSON from any URL and return the one value matching jsonpath as
    plain text.

JSONPath expressions follow RFC 9535. The leading `$` may be left out, so
`bitcoin.usd` and `$.bitcoin.usd` are the same query. Dotted names may
contain hyphens after the first character (`wrapped-bitcoin.usd`). Keys
with spaces or other punctuation need brackets: `['wrapped bitcoin'].usd`.
Filters may nest at most 128 levels deep, and a query that selects more
than a million nodes is rejected.

Errors are returned in the response body as `error: <message>`. If a
jsonpath expression fails in an XML route, a `jsonpath-error` element is
added to the document instead.
";

/// Shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub coingecko_url: Url,
    pub client: Client,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        Ok(Self {
            coingecko_url: config.coingecko_base()?,
            client: config.build_client()?,
            config: Arc::new(config),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/docs", get(docs))
        .route("/xml/coingecko/*route", get(xml_coingecko))
        .route("/xml/any/*url", get(xml_any))
        .route("/value/coingecko/*route", get(value_coingecko))
        .route("/value/any/*url", get(value_any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn welcome() -> Html<&'static str> {
    Html(WELCOME)
}

async fn docs() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], DOCS)
}

async fn xml_coingecko(
    State(state): State<AppState>,
    Path(route): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    xml_response(&state, Target::CoinGecko { route }, query.as_deref()).await
}

async fn xml_any(
    State(state): State<AppState>,
    Path(url): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    xml_response(&state, Target::Any { url }, query.as_deref()).await
}

async fn value_coingecko(
    State(state): State<AppState>,
    Path(route): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    value_response(&state, Target::CoinGecko { route }, query.as_deref()).await
}

async fn value_any(
    State(state): State<AppState>,
    Path(url): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    value_response(&state, Target::Any { url }, query.as_deref()).await
}

async fn xml_response(state: &AppState, target: Target, query: Option<&str>) -> Response {
    match xml_pipeline(state, target, query).await {
        Ok(xml) => ([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], xml).into_response(),
        Err(err) => {
            error!("failed to render xml: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

async fn value_response(state: &AppState, target: Target, query: Option<&str>) -> Response {
    let body = match value_pipeline(state, target, query).await {
        Ok(text) => text,
        Err(err) => format!("error: {}", err),
    };

    ([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], body).into_response()
}
