// src/fetch/mod.rs
// =============================================================================
// Everything that goes over the network for the target page.
//
// Submodules:
// - validate: the public-address (SSRF) gate every fetch goes through
// - client: client construction, the page fetch, response timing
// - sizes: concurrent, cached sub-resource sizing
// =============================================================================

mod client;
mod sizes;
mod validate;

pub use client::{build_client, fetch_page, measure_response_time};
pub(crate) use client::describe_error;
pub use sizes::{FetchFailure, SizeOutcome, SizeResolver, SkipReason};
pub use validate::{check_host, check_url, is_public_ip, validate_url, UrlRejection};
