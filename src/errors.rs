use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JSONPathErrorType {
    LexerError,
    SyntaxError,
    TypeError,
    NameError,
    LimitError,
}

/// A JSONPath parse failure, with the byte span of the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JSONPathError {
    pub kind: JSONPathErrorType,
    pub msg: String,
    pub span: (usize, usize),
}

impl JSONPathError {
    pub fn new(kind: JSONPathErrorType, msg: String, span: (usize, usize)) -> Self {
        Self { kind, msg, span }
    }

    pub fn lexer(msg: String, span: (usize, usize)) -> Self {
        Self::new(JSONPathErrorType::LexerError, msg, span)
    }

    pub fn syntax(msg: String, span: (usize, usize)) -> Self {
        Self::new(JSONPathErrorType::SyntaxError, msg, span)
    }

    pub fn typ(msg: String, span: (usize, usize)) -> Self {
        Self::new(JSONPathErrorType::TypeError, msg, span)
    }

    pub fn name(msg: String, span: (usize, usize)) -> Self {
        Self::new(JSONPathErrorType::NameError, msg, span)
    }

    pub fn limit(msg: String, span: (usize, usize)) -> Self {
        Self::new(JSONPathErrorType::LimitError, msg, span)
    }
}

impl fmt::Display for JSONPathErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JSONPathErrorType::LexerError => f.write_str("lexer error:"),
            JSONPathErrorType::SyntaxError => f.write_str("syntax error:"),
            JSONPathErrorType::TypeError => f.write_str("type error:"),
            JSONPathErrorType::NameError => f.write_str("name error:"),
            JSONPathErrorType::LimitError => f.write_str("limit error:"),
        }
    }
}

impl std::error::Error for JSONPathError {}

impl fmt::Display for JSONPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}..{})",
            self.kind, self.msg, self.span.0, self.span.1
        )
    }
}

/// Evaluation stopped because a segment selected more nodes than allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("query selected more than {limit} nodes")]
pub struct NodeLimitError {
    pub limit: usize,
}

/// Failure to pull a value out of a JSON document with a path expression.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Syntax(#[from] JSONPathError),

    #[error("match for {expr} not found")]
    NotFound { expr: String },

    #[error("more than one match for {expr}")]
    Ambiguous { expr: String },
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("{status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream response is not valid JSON: {0}")]
    NotJson(#[from] serde_json::Error),
}

/// Everything that can go wrong while answering a proxy request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("missing required query parameter '{0}'")]
    MissingParameter(&'static str),
}

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("xml write error: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("xml output is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid coingecko base url '{url}': {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("root key must not be empty")]
    EmptyRootKey,

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
