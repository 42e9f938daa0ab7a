// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use std::fmt;

/// Placeholder shown for header fields a message does not carry.
pub const UNKNOWN_FIELD: &str = "(unknown)";

/// A message addressed by its server-assigned UID inside a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub uid: u32,
    pub label: String,
    /// Read state seen when the message was selected, if it was captured
    /// before anything could touch it
    pub state: Option<MessageState>,
}

impl MessageRef {
    pub fn new(uid: u32, label: impl Into<String>) -> Self {
        Self {
            uid,
            label: label.into(),
            state: None,
        }
    }

    pub fn with_state(mut self, state: MessageState) -> Self {
        self.state = Some(state);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageHeaders {
    pub subject: Option<String>,
    pub from: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl MessageHeaders {
    pub fn subject_or_unknown(&self) -> &str {
        self.subject.as_deref().unwrap_or(UNKNOWN_FIELD)
    }

    pub fn from_or_unknown(&self) -> &str {
        self.from.as_deref().unwrap_or(UNKNOWN_FIELD)
    }
}

/// Read state captured before a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageState {
    pub was_seen: bool,
}

impl MessageState {
    pub fn from_flags(flags: &[Flag]) -> Self {
        Self { was_seen: flags.contains(&Flag::Seen) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    Seen,
    Deleted,
    Flagged,
    Answered,
    Draft,
    Other(String),
}

impl Flag {
    pub fn as_imap_str(&self) -> &str {
        match self {
            Flag::Seen => "\\Seen",
            Flag::Deleted => "\\Deleted",
            Flag::Flagged => "\\Flagged",
            Flag::Answered => "\\Answered",
            Flag::Draft => "\\Draft",
            Flag::Other(name) => name,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_imap_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagOperation {
    Add,
    Remove,
}

impl FlagOperation {
    pub fn from_state(on: bool) -> Self {
        if on {
            FlagOperation::Add
        } else {
            FlagOperation::Remove
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxInfo {
    pub exists: u32,
    pub recent: u32,
    pub unseen: Option<u32>,
    pub uid_next: Option<u32>,
    pub uid_validity: Option<u32>,
}

/// Locale-dependent system folder names, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNames {
    pub root_folder: String,
    pub trash_folder: String,
}
