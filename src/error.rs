// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::config::SettingsError;
use crate::imap::error::ImapError;

/// Run-level failures.
///
/// `Selection` and `Transaction` are recoverable: they are logged and
/// counted in the run report while processing moves on. Everything else
/// stops the run.
#[derive(Debug, Error)]
pub enum PurgeError {
    #[error(transparent)]
    Config(#[from] SettingsError),

    #[error("Could not connect to the IMAP server: {0}")]
    Connect(ImapError),

    #[error("Login rejected: {0}")]
    Auth(ImapError),

    #[error("Label '{label}' does not exist on the server: {source}")]
    FolderNotFound {
        label: String,
        #[source]
        source: ImapError,
    },

    #[error("Could not read label '{label}': {source}")]
    Selection {
        label: String,
        #[source]
        source: ImapError,
    },

    #[error("Failed to process '{subject}' from {from}: {source}")]
    Transaction {
        subject: String,
        from: String,
        #[source]
        source: ImapError,
    },
}

impl PurgeError {
    /// Classifies a failure to open the session: only a refused login is
    /// reported as an authentication problem.
    pub fn from_connect(err: ImapError) -> Self {
        match err {
            ImapError::Auth(_) => PurgeError::Auth(err),
            other => PurgeError::Connect(other),
        }
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self, PurgeError::Selection { .. } | PurgeError::Transaction { .. })
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors_are_not_fatal() {
        let selection = PurgeError::Selection {
            label: "Newsletters".into(),
            source: ImapError::Operation("SEARCH failed".into()),
        };
        let transaction = PurgeError::Transaction {
            subject: "Hi".into(),
            from: "a@b.c".into(),
            source: ImapError::Operation("COPY failed".into()),
        };
        assert!(!selection.is_fatal());
        assert!(!transaction.is_fatal());
        assert_eq!(transaction.exit_code(), 0);
    }

    #[test]
    fn test_fatal_errors() {
        let auth = PurgeError::Auth(ImapError::Auth("bad password".into()));
        let missing = PurgeError::FolderNotFound {
            label: "Nope".into(),
            source: ImapError::FolderNotFound("Nope".into()),
        };
        assert!(auth.is_fatal());
        assert_eq!(missing.exit_code(), 1);
    }

    #[test]
    fn test_connect_failures_are_not_reported_as_auth() {
        let tls = PurgeError::from_connect(ImapError::Tls("invalid peer certificate".into()));
        assert!(matches!(tls, PurgeError::Connect(ImapError::Tls(_))));
        assert!(tls.to_string().starts_with("Could not connect to the IMAP server"));
        assert_eq!(tls.exit_code(), 1);

        let refused = PurgeError::from_connect(ImapError::Auth("AUTHENTICATIONFAILED".into()));
        assert!(matches!(refused, PurgeError::Auth(_)));
        assert_eq!(refused.to_string(), "Login rejected: Authentication error: AUTHENTICATIONFAILED");
    }
}
