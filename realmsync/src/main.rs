use std::sync::Arc;

use aliri::{jwa, jwt};
use aliri_clock::DurationSecs;
use aliri_oauth2::Authority;
use aliri_tokens::{backoff::ErrorBackoffConfig, jitter::RandomEarlyJitter, TokenWatcher};
use aliri_tower::Oauth2Authorizer;
use clap::Parser;
use realmsync::{
    http::{self, AppState, Authz},
    Config, RoleReconciler, UserService,
};
use realmsync_claims::{AccessClaims, ClaimResolver};
use realmsync_gateway::{
    provider_token_middleware, IdentityProviderGateway, KeycloakGateway, KeycloakTokenSource,
};
use reqwest_middleware::ClientBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    tracing::info!(
        realm = %config.realm,
        auth_server = %config.auth_server_url,
        "starting realmsync"
    );

    let authority = construct_authority(&config).await?;
    let gateway = construct_gateway(&config).await?;

    let state = AppState::new(
        Authz::new(
            ClaimResolver::new(config.default_client()),
            config.admin_policy(),
        ),
        UserService::new(gateway.clone(), config.realm.clone()),
        RoleReconciler::new(gateway, config.realm.clone())
            .with_compensation(config.compensate_on_failure),
    );

    let authorizer = Oauth2Authorizer::new()
        .with_claims::<AccessClaims>()
        .with_terse_error_handler::<axum::body::Body>();

    let app = http::router(http::api().layer(authorizer.jwt_layer(authority)), state);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn construct_authority(config: &Config) -> color_eyre::Result<Authority> {
    let issuer = config.issuer()?;

    let mut validator = jwt::CoreValidator::default()
        .add_approved_algorithm(jwa::Algorithm::RS256)
        .require_issuer(jwt::Issuer::from(issuer.as_str()));

    if let Some(audience) = &config.audience {
        validator = validator.add_allowed_audience(jwt::Audience::from(audience.as_str()));
    }

    let authority = Authority::new_from_url(config.jwks_url()?.to_string(), validator).await?;
    authority.spawn_refresh(config.jwks_refresh());

    Ok(authority)
}

async fn construct_gateway(
    config: &Config,
) -> color_eyre::Result<Arc<dyn IdentityProviderGateway>> {
    let token_source = KeycloakTokenSource::new(
        reqwest::Client::new(),
        config.token_url()?,
        config.client_id.clone(),
        config.client_secret.clone(),
    );

    let watcher = TokenWatcher::spawn_from_token_source(
        token_source,
        RandomEarlyJitter::new(DurationSecs(60)),
        ErrorBackoffConfig::default(),
    )
    .await?;

    let client = ClientBuilder::new(reqwest::Client::new())
        .with(provider_token_middleware(watcher, &config.auth_server_url)?)
        .build();

    let gateway = KeycloakGateway::new(client, config.auth_server_url.clone())
        .with_timeout(config.upstream_timeout());

    Ok(Arc::new(gateway))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down");
}
