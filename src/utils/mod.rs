//! Utility modules supporting citation operations.

mod http;

pub use http::HttpClient;
