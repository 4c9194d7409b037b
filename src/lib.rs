//! An HTTP proxy that lets spreadsheets import JSON APIs.
//!
//! JSON fetched from CoinGecko, or from any URL, is re-encoded as XML for
//! `IMPORTXML`, or reduced to a single plain text value for `IMPORTDATA`.
//! Parts of the upstream document are selected with JSONPath expressions
//! (RFC 9535). The leading `$` is optional, so `ethereum.aud` is a valid
//! query.
//!
//! ## Finding values
//!
//! ```
//! use crypto_sheets_api::{errors::JSONPathError, find};
//! use serde_json::json;
//!
//! fn main() -> Result<(), JSONPathError> {
//!     let value = json!({"ethereum": {"usd": 3456.78, "aud": 5210.01}});
//!     let nodes = find("ethereum.aud", &value)?;
//!
//!     assert_eq!(nodes.len(), 1);
//!     assert_eq!(nodes[0].path(), "$['ethereum']['aud']");
//!     Ok(())
//! }
//! ```
//!
//! ## Rendering XML
//!
//! ```
//! use crypto_sheets_api::to_xml;
//! use serde_json::json;
//!
//! let xml = to_xml(&json!({"bitcoin": {"usd": 67187.12}}), "result").unwrap();
//! assert!(xml.contains("<usd>67187.12</usd>"));
//! ```
//!
//! ## Serving
//!
//! [`server::router`] builds the axum application. See the binary for a
//! complete server with configuration and logging.
pub mod config;
pub mod env;
pub mod errors;
pub mod extract;
pub mod filter;
pub mod function;
pub mod jsonpath;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod pipeline;
pub mod query;
pub mod segment;
pub mod selector;
pub mod server;
pub mod standard_functions;
pub mod token;
pub mod upstream;
pub mod xml;

pub use config::ProxyConfig;
pub use env::Environment;
pub use errors::JSONPathError;
pub use errors::JSONPathErrorType;
pub use jsonpath::find;
pub use node::Node;
pub use node::NodeList;
pub use query::Query;
pub use server::{router, AppState};
pub use xml::to_xml;
