//! Request pipelines: fetch upstream JSON, apply the JSONPath expression and
//! render the result.
use serde_json::Value;

use crate::{
    errors::{ProxyError, UpstreamError, XmlError},
    extract::{filter_or_inject, single_value},
    server::AppState,
    upstream::{fetch_json, InboundQuery, Target, JSONPATH_PARAM},
    xml::to_xml,
};

/// Fetch `target` and render it as XML, filtering with the `jsonpath`
/// parameter if one was given.
///
/// Upstream failures do not fail the request. They are rendered as
/// `error: <message>` text under the root element.
pub async fn xml_pipeline(
    state: &AppState,
    target: Target,
    raw_query: Option<&str>,
) -> Result<String, XmlError> {
    let query = InboundQuery::parse(raw_query, target.consumed_params());

    let value = match fetch(state, &target, &query.forwarded).await {
        Ok(value) => match query.jsonpath.as_deref() {
            Some(expr) if !expr.is_empty() => filter_or_inject(value, expr),
            _ => value,
        },
        Err(err) => Value::String(format!("error: {}", err)),
    };

    to_xml(&value, &state.config.root_key)
}

/// Fetch `target` and return the text of the single value the `jsonpath`
/// parameter matches.
pub async fn value_pipeline(
    state: &AppState,
    target: Target,
    raw_query: Option<&str>,
) -> Result<String, ProxyError> {
    let query = InboundQuery::parse(raw_query, target.consumed_params());
    let expr = query
        .jsonpath
        .ok_or(ProxyError::MissingParameter(JSONPATH_PARAM))?;

    let value = fetch(state, &target, &query.forwarded).await?;
    Ok(single_value(&value, &expr)?)
}

async fn fetch(
    state: &AppState,
    target: &Target,
    params: &[(String, String)],
) -> Result<Value, UpstreamError> {
    let url = target.outbound_url(&state.coingecko_url)?;
    fetch_json(&state.client, url, params).await
}
