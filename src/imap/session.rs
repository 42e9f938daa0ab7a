// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use async_imap::types::{Fetch, Flag as AsyncImapFlag};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::stream::TryStreamExt;
use log::debug;
use tokio::net::TcpStream as TokioTcpStream;
use tokio::sync::Mutex as TokioMutex;
use tokio_rustls::client::TlsStream;
use tokio_util::compat::Compat;

use crate::imap::{
    error::ImapError,
    headers::parse_header_block,
    types::{Flag, FlagOperation, MailboxInfo, MessageHeaders},
    utf7,
};

// TLS Stream types
pub type TlsCompatibleStream = Compat<TlsStream<TokioTcpStream>>;
pub type TlsImapSession = async_imap::Session<TlsCompatibleStream>;

/// IMAP date format used by SEARCH (`17-Oct-2026`).
const SEARCH_DATE_FORMAT: &str = "%d-%b-%Y";

/// The mailbox operations the purge engine relies on.
///
/// Folder names are passed as Unicode; implementations talking to a real
/// server encode them with [`utf7::encode`]. Every message-level call is
/// addressed by UID.
#[async_trait]
pub trait MailboxSession: Send + Sync {
    /// Selects a folder for subsequent operations
    async fn select_folder(&self, name: &str) -> Result<MailboxInfo, ImapError>;

    /// UIDs of messages in the selected folder sent strictly before `date`
    async fn search_sent_before(&self, date: NaiveDate) -> Result<Vec<u32>, ImapError>;

    /// UIDs of every message in the selected folder
    async fn search_all(&self) -> Result<Vec<u32>, ImapError>;

    /// Fetches Subject, From and Date without setting `\Seen`
    async fn fetch_headers(&self, uid: u32) -> Result<MessageHeaders, ImapError>;

    async fn fetch_flags(&self, uid: u32) -> Result<Vec<Flag>, ImapError>;

    async fn set_flag(&self, uid: u32, flag: Flag, on: bool) -> Result<(), ImapError>;

    /// Copies a message from the selected folder into `destination`
    async fn copy(&self, uid: u32, destination: &str) -> Result<(), ImapError>;

    /// Permanently removes messages marked with the \Deleted flag
    async fn expunge(&self) -> Result<(), ImapError>;

    async fn close(&self) -> Result<(), ImapError>;

    async fn logout(&self) -> Result<(), ImapError>;
}

fn convert_flag(flag: AsyncImapFlag<'_>) -> Flag {
    match flag {
        AsyncImapFlag::Seen => Flag::Seen,
        AsyncImapFlag::Deleted => Flag::Deleted,
        AsyncImapFlag::Flagged => Flag::Flagged,
        AsyncImapFlag::Answered => Flag::Answered,
        AsyncImapFlag::Draft => Flag::Draft,
        other => Flag::Other(format!("{:?}", other)),
    }
}

fn sorted(uids: impl IntoIterator<Item = u32>) -> Vec<u32> {
    let mut uids: Vec<u32> = uids.into_iter().collect();
    uids.sort_unstable();
    uids
}

/// Store query for a single flag change, e.g. `+FLAGS.SILENT (\Seen)`.
pub fn store_query(operation: FlagOperation, flag: &Flag) -> String {
    let op = match operation {
        FlagOperation::Add => "+FLAGS.SILENT",
        FlagOperation::Remove => "-FLAGS.SILENT",
    };
    format!("{} ({})", op, flag.as_imap_str())
}

/// Wraps an authenticated async-imap session.
#[derive(Debug)]
pub struct AsyncImapSessionWrapper {
    session: TokioMutex<TlsImapSession>,
}

impl AsyncImapSessionWrapper {
    pub fn new(session: TlsImapSession) -> Self {
        Self {
            session: TokioMutex::new(session),
        }
    }

    async fn uid_fetch_one(&self, uid: u32, query: &str) -> Result<Fetch, ImapError> {
        let mut session_guard = self.session.lock().await;
        let fetches: Vec<Fetch> = session_guard
            .uid_fetch(uid.to_string(), query)
            .await?
            .try_collect()
            .await?;
        fetches
            .into_iter()
            .find(|fetch| fetch.uid.map_or(true, |fetched| fetched == uid))
            .ok_or(ImapError::MessageNotFound(uid))
    }
}

#[async_trait]
impl MailboxSession for AsyncImapSessionWrapper {
    async fn select_folder(&self, name: &str) -> Result<MailboxInfo, ImapError> {
        let encoded = utf7::encode(name);
        let mut session_guard = self.session.lock().await;
        let mailbox = session_guard.select(&encoded).await.map_err(|e| match e {
            async_imap::error::Error::No(_) => ImapError::FolderNotFound(name.to_string()),
            other => ImapError::from(other),
        })?;
        Ok(MailboxInfo {
            exists: mailbox.exists,
            recent: mailbox.recent,
            unseen: mailbox.unseen,
            uid_next: mailbox.uid_next,
            uid_validity: mailbox.uid_validity,
        })
    }

    async fn search_sent_before(&self, date: NaiveDate) -> Result<Vec<u32>, ImapError> {
        let query = format!("SENTBEFORE {}", date.format(SEARCH_DATE_FORMAT));
        debug!("UID SEARCH {}", query);
        let mut session_guard = self.session.lock().await;
        let uids = session_guard.uid_search(&query).await?;
        Ok(sorted(uids))
    }

    async fn search_all(&self) -> Result<Vec<u32>, ImapError> {
        let mut session_guard = self.session.lock().await;
        let uids = session_guard.uid_search("ALL").await?;
        Ok(sorted(uids))
    }

    async fn fetch_headers(&self, uid: u32) -> Result<MessageHeaders, ImapError> {
        let fetch = self.uid_fetch_one(uid, "(UID BODY.PEEK[HEADER])").await?;
        let raw = fetch.header().ok_or(ImapError::MessageNotFound(uid))?;
        Ok(parse_header_block(raw))
    }

    async fn fetch_flags(&self, uid: u32) -> Result<Vec<Flag>, ImapError> {
        let fetch = self.uid_fetch_one(uid, "(UID FLAGS)").await?;
        Ok(fetch.flags().map(convert_flag).collect())
    }

    async fn set_flag(&self, uid: u32, flag: Flag, on: bool) -> Result<(), ImapError> {
        let query = store_query(FlagOperation::from_state(on), &flag);
        let mut session_guard = self.session.lock().await;
        let updates: Vec<Fetch> = session_guard
            .uid_store(uid.to_string(), &query)
            .await?
            .try_collect()
            .await?;
        debug!("STORE {} on UID {} returned {} update(s)", query, uid, updates.len());
        Ok(())
    }

    async fn copy(&self, uid: u32, destination: &str) -> Result<(), ImapError> {
        let encoded = utf7::encode(destination);
        let mut session_guard = self.session.lock().await;
        session_guard
            .uid_copy(uid.to_string(), &encoded)
            .await
            .map_err(ImapError::from)
    }

    async fn expunge(&self) -> Result<(), ImapError> {
        let mut session_guard = self.session.lock().await;
        let expunged: Vec<u32> = session_guard.expunge().await?.try_collect().await?;
        debug!("EXPUNGE removed {} message(s)", expunged.len());
        Ok(())
    }

    async fn close(&self) -> Result<(), ImapError> {
        let mut session_guard = self.session.lock().await;
        session_guard.close().await.map_err(ImapError::from)
    }

    async fn logout(&self) -> Result<(), ImapError> {
        let mut session_guard = self.session.lock().await;
        session_guard.logout().await.map_err(ImapError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_query() {
        assert_eq!(store_query(FlagOperation::Add, &Flag::Deleted), "+FLAGS.SILENT (\\Deleted)");
        assert_eq!(store_query(FlagOperation::Remove, &Flag::Seen), "-FLAGS.SILENT (\\Seen)");
    }

    #[test]
    fn test_search_date_format() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 7).unwrap();
        assert_eq!(date.format(SEARCH_DATE_FORMAT).to_string(), "07-Oct-2026");
    }

    #[test]
    fn test_sorted_uids() {
        assert_eq!(sorted([9, 3, 5]), vec![3, 5, 9]);
    }
}
