use aliri_reqwest::{AccessTokenMiddleware, ExactHostMatch};
use aliri_tokens::TokenWatcher;
use reqwest::Url;
use thiserror::Error;

/// The provider URL has no host to match requests against
#[derive(Clone, Copy, Debug, Error)]
#[error("identity provider URL has no host")]
pub struct MissingHost;

/// Middleware attaching the watcher's current token to provider-bound requests
pub type BearerTokenMiddleware = AccessTokenMiddleware<ExactHostMatch>;

/// Attaches tokens from `token_watcher` only to requests sent to the host of
/// `provider`
///
/// Matching is by host alone, so a provider on a non-default port still
/// receives the token.
pub fn provider_token_middleware(
    token_watcher: TokenWatcher,
    provider: &Url,
) -> Result<BearerTokenMiddleware, MissingHost> {
    let host = provider.host_str().ok_or(MissingHost)?;
    tracing::debug!(host, "admin tokens restricted to provider host");

    Ok(AccessTokenMiddleware::new(token_watcher).with_predicate(ExactHostMatch::new(host)))
}
