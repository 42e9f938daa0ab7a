// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Applies the delete or archive effect to one message at a time.
//!
//! The read state of a message is captured before anything else happens and
//! put back on whatever copy survives the transaction: fetching headers is
//! allowed to mark a message as read on some servers, and a purge must not
//! leave that trace behind.

use log::{debug, info, log, warn, Level};

use crate::error::PurgeError;
use crate::imap::error::ImapError;
use crate::imap::session::MailboxSession;
use crate::imap::types::{Flag, FolderNames, MessageHeaders, MessageRef, MessageState};
use crate::purge::RunOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeAction {
    /// Copy to the trash folder, then remove from the label
    Delete,
    /// Remove from the label only; label-based stores keep the message in
    /// their all-mail view
    Archive,
}

impl PurgeAction {
    pub fn from_archive_flag(archive: bool) -> Self {
        if archive {
            PurgeAction::Archive
        } else {
            PurgeAction::Delete
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            PurgeAction::Delete => "Deleting",
            PurgeAction::Archive => "Archiving",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Pretend mode: reported, nothing changed
    Reported,
    /// Transaction done and the message is gone from the label
    Removed,
    /// Transaction done but the server still lists the message in the label;
    /// its read state has been restored
    Retained,
}

pub struct FlagPreservingExecutor<'a, S: MailboxSession + ?Sized> {
    session: &'a S,
    folders: &'a FolderNames,
    action: PurgeAction,
    pretend: bool,
    narration: Level,
}

impl<'a, S: MailboxSession + ?Sized> FlagPreservingExecutor<'a, S> {
    pub fn new(session: &'a S, folders: &'a FolderNames, options: &RunOptions) -> Self {
        Self {
            session,
            folders,
            action: PurgeAction::from_archive_flag(options.archive),
            pretend: options.pretend,
            narration: if options.verbose { Level::Info } else { Level::Debug },
        }
    }

    pub fn action(&self) -> PurgeAction {
        self.action
    }

    /// Runs the whole per-message protocol. Any transport failure comes back
    /// as [`PurgeError::Transaction`] so the caller can move on.
    pub async fn execute(&self, message: &MessageRef) -> Result<ExecutionOutcome, PurgeError> {
        let uid = message.uid;
        let state = match message.state {
            Some(state) => state,
            None => self
                .session
                .fetch_flags(uid)
                .await
                .map(|flags| MessageState::from_flags(&flags))
                .map_err(|source| transaction_error(&MessageHeaders::default(), source))?,
        };
        let headers = self
            .session
            .fetch_headers(uid)
            .await
            .map_err(|source| transaction_error(&MessageHeaders::default(), source))?;

        if self.pretend {
            info!(
                "[pretend] {} '{}' from {} in '{}'",
                self.action.verb(),
                headers.subject_or_unknown(),
                headers.from_or_unknown(),
                message.label
            );
            return Ok(ExecutionOutcome::Reported);
        }

        log!(
            self.narration,
            "{} '{}' from {} in '{}'",
            self.action.verb(),
            headers.subject_or_unknown(),
            headers.from_or_unknown(),
            message.label
        );

        self.transact(uid, state)
            .await
            .map_err(|source| transaction_error(&headers, source))?;

        Ok(self.restore_if_retained(uid, state).await)
    }

    async fn transact(&self, uid: u32, state: MessageState) -> Result<(), ImapError> {
        // Undo a \Seen the header fetch may have set before the surviving
        // copy (trash or all-mail) is made
        if !state.was_seen {
            self.session.set_flag(uid, Flag::Seen, false).await?;
        }
        if self.action == PurgeAction::Delete {
            self.session.copy(uid, &self.folders.trash_folder).await?;
        }
        self.session.set_flag(uid, Flag::Deleted, true).await?;
        self.session.expunge().await
    }

    async fn restore_if_retained(&self, uid: u32, state: MessageState) -> ExecutionOutcome {
        let flags = match self.session.fetch_flags(uid).await {
            Ok(flags) => flags,
            Err(ImapError::MessageNotFound(_)) => return ExecutionOutcome::Removed,
            Err(e) => {
                debug!("Could not re-read flags of UID {}: {}", uid, e);
                return ExecutionOutcome::Removed;
            }
        };

        if MessageState::from_flags(&flags) != state {
            if let Err(e) = self.session.set_flag(uid, Flag::Seen, state.was_seen).await {
                warn!("Could not restore read state of UID {}: {}", uid, e);
            }
        }
        ExecutionOutcome::Retained
    }
}

fn transaction_error(headers: &MessageHeaders, source: ImapError) -> PurgeError {
    PurgeError::Transaction {
        subject: headers.subject_or_unknown().to_string(),
        from: headers.from_or_unknown().to_string(),
        source,
    }
}
