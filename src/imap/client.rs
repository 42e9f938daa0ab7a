// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use async_imap::Client as AsyncImapClient;
use log;
use rustls::pki_types::ServerName as PkiServerName;
use rustls::{ClientConfig, RootCertStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream as TokioTcpStream;
use tokio::time::timeout;
use tokio_rustls::{client::TlsStream as TokioTlsStreamClient, TlsConnector};
use tokio_util::compat::TokioAsyncReadCompatExt;

use crate::config::{Credentials, ServerConfig};
use crate::imap::error::ImapError;
use crate::imap::session::{AsyncImapSessionWrapper, TlsCompatibleStream, TlsImapSession};

type BaseTlsStream = TokioTlsStreamClient<TokioTcpStream>;

/// Establishes TCP connection and performs the TLS handshake.
async fn setup_tls_stream(
    host: &str,
    port: u16,
    tls_connector: TlsConnector,
    server_name_for_tls: PkiServerName<'static>,
) -> Result<BaseTlsStream, ImapError> {
    log::debug!("Attempting TCP connection to {}:{}...", host, port);
    let tcp_stream = TokioTcpStream::connect((host, port)).await?;
    log::debug!("TCP connected. Performing TLS handshake...");

    let tls_stream = tls_connector
        .connect(server_name_for_tls, tcp_stream)
        .await
        .map_err(|e| ImapError::Tls(e.to_string()))?;
    log::debug!("TLS handshake successful.");
    Ok(tls_stream)
}

/// Performs IMAP login using the compatible stream.
async fn perform_imap_login(
    compat_stream: TlsCompatibleStream,
    credentials: &Credentials,
    timeout_duration: Duration,
) -> Result<TlsImapSession, ImapError> {
    let client = AsyncImapClient::new(compat_stream);
    log::debug!("IMAP client created. Attempting login for user '{}'...", credentials.username);

    match timeout(timeout_duration, client.login(&credentials.username, &credentials.password)).await {
        Ok(Ok(session)) => {
            log::info!("IMAP login successful for user: {}", credentials.username);
            Ok(session)
        }
        Ok(Err((e, _client))) => {
            log::error!("IMAP login failed for user {}: {:?}", credentials.username, e);
            Err(ImapError::Auth(e.to_string()))
        }
        Err(_elapsed) => {
            log::error!("IMAP login timed out for user {} after {:?}", credentials.username, timeout_duration);
            Err(ImapError::Connection("Login timed out".to_string()))
        }
    }
}

fn tls_connector() -> Result<TlsConnector, ImapError> {
    let mut root_cert_store = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs()?;
    let (added, ignored) = root_cert_store.add_parsable_certificates(certs);
    log::debug!("Loaded {} native certs, ignored {}.", added, ignored);
    if root_cert_store.is_empty() {
        log::warn!("Root certificate store is empty after loading native certs.");
    }

    let config = ClientConfig::builder()
        .with_root_certificates(root_cert_store)
        .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Connects over TLS and logs in, returning a session ready for the purge run.
///
/// Any failure here is fatal for the run; a rejected LOGIN surfaces as
/// [`ImapError::Auth`].
pub async fn connect(
    server: &ServerConfig,
    credentials: &Credentials,
) -> Result<AsyncImapSessionWrapper, ImapError> {
    log::info!("Connecting as '{}' to {}:{}", credentials.username, server.host, server.port);

    let server_name: PkiServerName<'static> = PkiServerName::try_from(server.host.clone())
        .map_err(|_| ImapError::Connection(format!("Invalid server name format: {}", server.host)))?;

    let tls_stream = setup_tls_stream(&server.host, server.port, tls_connector()?, server_name).await?;
    let login_timeout = Duration::from_secs(server.login_timeout_secs);
    let session = perform_imap_login(tls_stream.compat(), credentials, login_timeout).await?;

    Ok(AsyncImapSessionWrapper::new(session))
}
