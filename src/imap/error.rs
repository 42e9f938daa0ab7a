// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImapError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Message not found: UID {0}")]
    MessageNotFound(u32),

    #[error("Operation error: {0}")]
    Operation(String),

    #[error("Command error: {0}")]
    Command(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Bad response: {0}")]
    BadResponse(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<async_imap::error::Error> for ImapError {
    fn from(err: async_imap::error::Error) -> Self {
        match err {
            async_imap::error::Error::Parse(e) => ImapError::Parse(e.to_string()),
            async_imap::error::Error::No(msg) => ImapError::Operation(msg),
            async_imap::error::Error::Bad(msg) => ImapError::BadResponse(msg),
            async_imap::error::Error::Io(e) => ImapError::Connection(e.to_string()),
            async_imap::error::Error::Validate(e) => ImapError::Command(e.to_string()),
            _ => ImapError::Unknown(err.to_string()),
        }
    }
}

impl From<std::io::Error> for ImapError {
    fn from(err: std::io::Error) -> Self {
        ImapError::Connection(err.to_string())
    }
}
