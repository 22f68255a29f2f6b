//! 传输层：共享的 HTTP 客户端工厂与凭证解析。
//!
//! Shared transport plumbing. Every provider client is built on the same
//! `reqwest` client factory (env-tunable timeouts, pooling, proxy) and the
//! same credential resolution chain (keyring first, then environment).

mod http;

pub use http::{build_client, resolve_api_key, TransportError};
