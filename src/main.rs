// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use audio_vault_server::{
    api::router,
    audit::{AuditLog, RedbAuditLog},
    auth::{JwksManager, TokenVerifier},
    config::AppConfig,
    files::FileService,
    state::AppState,
    storage::S3Storage,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // The subscriber depends on LOG_FORMAT, which may be the bad value.
            init_tracing(Default::default());
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server terminated with error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn Error>> {
    let jwks = JwksManager::new(config.auth.jwks_uri.as_str())?
        .with_cache_ttl(config.auth.jwks_cache_ttl)
        .with_requests_per_minute(config.auth.jwks_requests_per_minute);
    let mut verifier = TokenVerifier::new(Arc::new(jwks));
    if let Some(ref issuer) = config.auth.issuer {
        verifier = verifier.with_issuer(issuer);
    }
    if let Some(ref audience) = config.auth.audience {
        verifier = verifier.with_audience(audience);
    }
    if config.auth.issuer.is_none() || config.auth.audience.is_none() {
        tracing::warn!(
            issuer_checked = config.auth.issuer.is_some(),
            audience_checked = config.auth.audience.is_some(),
            "Token issuer or audience validation disabled"
        );
    }

    let storage = Arc::new(S3Storage::connect(&config.s3).await?);
    let audit: Arc<dyn AuditLog> = Arc::new(RedbAuditLog::open(&config.audit_db_path)?);
    let files = FileService::new(storage, audit.clone(), config.files);

    let app = router(AppState::new(verifier, files, audit));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Audio Vault server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
