#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{
    extract::RawQuery,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use crypto_sheets_api::{router, AppState, ProxyConfig};
use quick_xml::{events::Event, Reader};
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use url::form_urlencoded;

pub const PRICES: &str = r#"{
    "bitcoin": {"usd": 67187.12, "aud": 101234.5},
    "ethereum": {"usd": 3456.78, "aud": 5210.01}
}"#;

pub const USERS: &str = r#"[
    {"id": 1, "name": "Leanne", "email": "leanne@example.com"},
    {"id": 2, "name": "Ervin", "email": "ervin@example.com"},
    {"id": 3, "name": "Clementine", "email": "clementine@example.com"}
]"#;

/// Serve `app` on an ephemeral local port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn json(body: &'static str) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], body)
}

/// Echo the query string back as a JSON object.
async fn echo(RawQuery(query): RawQuery) -> impl IntoResponse {
    let mut obj = Map::new();
    for (k, v) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        obj.insert(k.into_owned(), Value::String(v.into_owned()));
    }
    (
        [(header::CONTENT_TYPE, "application/json")],
        Value::Object(obj).to_string(),
    )
}

/// A stand-in for a JSON API, mounted under `/api/v3`.
pub fn upstream() -> Router {
    Router::new()
        .route("/api/v3/simple/price", get(|| async { json(PRICES) }))
        .route("/api/v3/users", get(|| async { json(USERS) }))
        .route("/api/v3/echo", get(echo))
        .route("/api/v3/html", get(|| async { "<html>hello</html>" }))
        .route(
            "/api/v3/missing",
            get(|| async { (StatusCode::NOT_FOUND, r#"{"error":"coin not found"}"#) }),
        )
}

/// Start an upstream server and a proxy pointed at it. Returns the
/// upstream and proxy addresses.
pub async fn start(root_key: &str) -> (SocketAddr, SocketAddr) {
    let upstream = serve(upstream()).await;

    let config = ProxyConfig {
        coingecko_url: format!("http://{}/api/v3", upstream),
        root_key: root_key.to_owned(),
        ..Default::default()
    };
    let proxy = serve(router(AppState::new(config).unwrap())).await;

    (upstream, proxy)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Read an XML document back into JSON. Elements with children become
/// objects, repeated children become arrays, text becomes strings and
/// empty elements become null. Returns the root element name and value.
pub fn xml_to_value(xml: &str) -> (String, Value) {
    struct Frame {
        name: String,
        children: Vec<(String, Value)>,
        text: Option<String>,
    }

    fn close(frame: Frame) -> (String, Value) {
        if frame.children.is_empty() {
            let value = frame.text.map(Value::String).unwrap_or(Value::Null);
            return (frame.name, value);
        }

        let mut obj = Map::new();
        for (name, value) in frame.children {
            match obj.get_mut(&name) {
                Some(Value::Array(arr)) => arr.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    obj.insert(name, value);
                }
            }
        }
        (frame.name, Value::Object(obj))
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root = None;

    loop {
        let finished = match reader.read_event().unwrap() {
            Event::Start(e) => {
                stack.push(Frame {
                    name: String::from_utf8(e.name().as_ref().to_vec()).unwrap(),
                    children: Vec::new(),
                    text: None,
                });
                None
            }
            Event::Empty(e) => Some(Frame {
                name: String::from_utf8(e.name().as_ref().to_vec()).unwrap(),
                children: Vec::new(),
                text: None,
            }),
            Event::Text(t) => {
                let text = t.unescape().unwrap().into_owned();
                if let Some(frame) = stack.last_mut() {
                    frame.text.get_or_insert_with(String::new).push_str(&text);
                }
                None
            }
            Event::End(_) => stack.pop(),
            Event::Eof => break,
            _ => None,
        };

        if let Some(frame) = finished {
            let (name, value) = close(frame);
            match stack.last_mut() {
                Some(parent) => parent.children.push((name, value)),
                None => root = Some((name, value)),
            }
        }
    }

    root.unwrap()
}
