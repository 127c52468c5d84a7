//! Remote content fetching
//!
//! The archive engine never talks to the network directly. It consumes the
//! [`Fetcher`] capability, which is used twice per reference: once to check
//! reachability before the reference is accepted, and again to pull the
//! bytes when the archive is assembled.
//!
//! - [`HttpFetcher`]: reqwest-backed implementation used by the service

mod http;
mod traits;

pub use http::HttpFetcher;
pub use traits::Fetcher;
