// # dnssync-http
//
// JSON REST client shared by the hosted-DNS providers.
//
// ## Purpose
//
// Every hosted provider talks to a JSON API with the same shape of
// problems: a base URL, an authorization scheme, list endpoints that page,
// and error bodies in a provider-specific layout. [`RestClient`] handles
// the transport and status mapping once; an [`ApiDialect`] describes the
// parts that differ between APIs.
//
// ## Usage
//
// ```rust,ignore
// use dnssync_http::{ApiDialect, Auth, RestClient};
//
// struct Linode;
//
// impl ApiDialect for Linode {
//     fn provider(&self) -> &'static str {
//         "linode"
//     }
//
//     fn select_data(&self, body: serde_json::Value) -> serde_json::Value {
//         body.get("data").cloned().unwrap_or(body)
//     }
// }
//
// let client = RestClient::new(
//     "https://api.linode.com/v4/",
//     Auth::Bearer(token),
//     Box::new(Linode),
// )?;
// let domains = client.get_all("domains", &[]).await?;
// ```
//
// ## Error Mapping
//
// - 401 / 403: `Error::Authentication`
// - 429: `Error::RateLimited`
// - anything else outside 2xx: `Error::Http` with the status and the
//   message the dialect extracted from the body

mod client;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{ApiDialect, Auth, DEFAULT_HTTP_TIMEOUT, RestClient, join_url, query_param, status_error};
