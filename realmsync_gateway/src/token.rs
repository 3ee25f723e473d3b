use aliri_clock::DurationSecs;
use aliri_tokens::{
    sources::AsyncTokenSource, AccessToken, ClientId, ClientSecret, IdToken, TokenLifetimeConfig,
    TokenWithLifetime,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Obtains access tokens for a confidential client through the client
/// credentials grant
///
/// Credentials are posted as form data, the encoding Keycloak requires on
/// its token endpoint.
#[derive(Debug)]
pub struct KeycloakTokenSource {
    client: reqwest::Client,
    token_url: reqwest::Url,
    client_id: ClientId,
    client_secret: ClientSecret,
    lifetime_config: TokenLifetimeConfig,
}

impl KeycloakTokenSource {
    /// Constructs a token source with the default lifetime configuration
    pub fn new(
        client: reqwest::Client,
        token_url: reqwest::Url,
        client_id: ClientId,
        client_secret: ClientSecret,
    ) -> Self {
        Self {
            client,
            token_url,
            client_id,
            client_secret,
            lifetime_config: TokenLifetimeConfig::default(),
        }
    }

    /// The endpoint tokens are requested from
    #[inline]
    pub fn token_url(&self) -> &reqwest::Url {
        &self.token_url
    }
}

/// An error while requesting a token from the provider
#[derive(Debug, Error)]
pub enum TokenRequestError {
    /// The provider rejected the request
    #[error("token request rejected with {status}: {body}")]
    Rejected {
        /// The status returned by the provider
        status: reqwest::StatusCode,
        /// The body of the rejection
        body: String,
    },
    /// Unable to deserialize the token body
    #[error("error deserializing token body from provider")]
    TokenBody(#[from] serde_json::Error),
    /// Unable to send the request or read its response
    #[error("error communicating with the token endpoint")]
    Transport(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct ClientCredentialsForm<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: AccessToken,
    expires_in: DurationSecs,
}

#[async_trait]
impl AsyncTokenSource for KeycloakTokenSource {
    type Error = TokenRequestError;

    #[tracing::instrument(
        err,
        skip(self),
        fields(token_url = %self.token_url, client_id = %self.client_id),
    )]
    async fn request_token(&mut self) -> Result<TokenWithLifetime, Self::Error> {
        tracing::trace!("requesting token from provider");

        let form = ClientCredentialsForm {
            grant_type: "client_credentials",
            client_id: self.client_id.as_str(),
            client_secret: self.client_secret.as_str(),
        };

        let resp = self
            .client
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        tracing::debug!(
            response.status = status.as_u16(),
            "received token response from provider"
        );

        if !status.is_success() {
            let body = resp.text().await?;
            return Err(TokenRequestError::Rejected { status, body });
        }

        let body = resp.bytes().await?;
        let resp: TokenResponse = serde_json::from_slice(&body)?;

        let token =
            self.lifetime_config
                .create_token(resp.access_token, None::<IdToken>, resp.expires_in);

        tracing::info!(
            lifetime = token.lifetime().0,
            stale = token.stale().0,
            expiry = token.expiry().0,
            "received new access token"
        );

        Ok(token)
    }
}
