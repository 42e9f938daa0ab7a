// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use labelpurge::config::{Credentials, PurgeConfig, PurgeRule, SelectionStrategy, ServerConfig, Settings};
use labelpurge::imap::error::ImapError;
use labelpurge::imap::session::MailboxSession;
use labelpurge::imap::types::{Flag, MailboxInfo, MessageHeaders};
use labelpurge::purge::RunOptions;

/// Every call the purge engine made, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Select(String),
    SearchSentBefore(NaiveDate),
    SearchAll,
    FetchHeaders(u32),
    FetchFlags(u32),
    SetFlag(u32, Flag, bool),
    Copy(u32, String),
    Expunge,
    Close,
    Logout,
}

impl Call {
    pub fn is_mutating(&self) -> bool {
        matches!(self, Call::SetFlag(..) | Call::Copy(..) | Call::Expunge)
    }
}

#[derive(Debug, Clone)]
pub struct FakeMessage {
    pub uid: u32,
    pub subject: String,
    pub from: String,
    pub date: DateTime<Utc>,
    pub flags: HashSet<Flag>,
}

impl FakeMessage {
    pub fn is_seen(&self) -> bool {
        self.flags.contains(&Flag::Seen)
    }
}

#[derive(Debug, Default)]
struct FakeState {
    folders: BTreeMap<String, Vec<FakeMessage>>,
    /// Messages expunged from a label survive here, like an all-mail view
    all_mail: Vec<FakeMessage>,
    selected: Option<String>,
    next_uid: u32,
    calls: Vec<Call>,
    failing_copies: HashSet<u32>,
    seen_on_header_fetch: bool,
}

impl FakeState {
    fn selected_messages(&mut self) -> Result<&mut Vec<FakeMessage>, ImapError> {
        let name = self
            .selected
            .clone()
            .ok_or_else(|| ImapError::Command("No folder selected".into()))?;
        self.folders
            .get_mut(&name)
            .ok_or(ImapError::FolderNotFound(name))
    }

    fn message(&mut self, uid: u32) -> Result<&mut FakeMessage, ImapError> {
        self.selected_messages()?
            .iter_mut()
            .find(|m| m.uid == uid)
            .ok_or(ImapError::MessageNotFound(uid))
    }
}

/// In-memory IMAP account used by the integration tests.
#[derive(Debug, Default)]
pub struct FakeMailbox {
    state: Mutex<FakeState>,
}

impl FakeMailbox {
    pub fn new() -> Self {
        let mailbox = Self::default();
        mailbox.state.lock().unwrap().next_uid = 100;
        mailbox
    }

    /// A Gmail-like account in the default locale.
    pub fn gmail() -> Self {
        Self::new()
            .with_folder("INBOX")
            .with_folder("[Gmail]/Spam")
            .with_folder("[Gmail]/Trash")
    }

    pub fn with_folder(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .folders
            .entry(name.to_string())
            .or_default();
        self
    }

    pub fn with_message(self, folder: &str, subject: &str, date: DateTime<Utc>, seen: bool) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.next_uid += 1;
            let uid = state.next_uid;
            let mut flags = HashSet::new();
            if seen {
                flags.insert(Flag::Seen);
            }
            state
                .folders
                .entry(folder.to_string())
                .or_default()
                .push(FakeMessage {
                    uid,
                    subject: subject.to_string(),
                    from: format!("sender-{}@example.com", uid),
                    date,
                    flags,
                });
        }
        self
    }

    /// Simulates servers that set \Seen when headers are fetched.
    pub fn marking_seen_on_header_fetch(self) -> Self {
        self.state.lock().unwrap().seen_on_header_fetch = true;
        self
    }

    pub fn failing_copy_of(self, subject: &str) -> Self {
        let uid = self.uid_of(subject).expect("unknown subject");
        self.state.lock().unwrap().failing_copies.insert(uid);
        self
    }

    pub fn uid_of(&self, subject: &str) -> Option<u32> {
        let state = self.state.lock().unwrap();
        state
            .folders
            .values()
            .flatten()
            .find(|m| m.subject == subject)
            .map(|m| m.uid)
    }

    pub fn subjects_in(&self, folder: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .folders
            .get(folder)
            .map(|messages| messages.iter().map(|m| m.subject.clone()).collect())
            .unwrap_or_default()
    }

    pub fn folder(&self, folder: &str) -> Vec<FakeMessage> {
        self.state
            .lock()
            .unwrap()
            .folders
            .get(folder)
            .cloned()
            .unwrap_or_default()
    }

    pub fn all_mail(&self) -> Vec<FakeMessage> {
        self.state.lock().unwrap().all_mail.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    fn record(&self, call: Call) -> std::sync::MutexGuard<'_, FakeState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

#[async_trait]
impl MailboxSession for FakeMailbox {
    async fn select_folder(&self, name: &str) -> Result<MailboxInfo, ImapError> {
        let mut state = self.record(Call::Select(name.to_string()));
        let exists = state
            .folders
            .get(name)
            .map(|messages| messages.len() as u32)
            .ok_or_else(|| ImapError::FolderNotFound(name.to_string()))?;
        state.selected = Some(name.to_string());
        Ok(MailboxInfo {
            exists,
            ..MailboxInfo::default()
        })
    }

    async fn search_sent_before(&self, date: NaiveDate) -> Result<Vec<u32>, ImapError> {
        let mut state = self.record(Call::SearchSentBefore(date));
        Ok(state
            .selected_messages()?
            .iter()
            .filter(|m| m.date.date_naive() < date)
            .map(|m| m.uid)
            .collect())
    }

    async fn search_all(&self) -> Result<Vec<u32>, ImapError> {
        let mut state = self.record(Call::SearchAll);
        Ok(state.selected_messages()?.iter().map(|m| m.uid).collect())
    }

    async fn fetch_headers(&self, uid: u32) -> Result<MessageHeaders, ImapError> {
        let mut state = self.record(Call::FetchHeaders(uid));
        let mark_seen = state.seen_on_header_fetch;
        let message = state.message(uid)?;
        if mark_seen {
            message.flags.insert(Flag::Seen);
        }
        Ok(MessageHeaders {
            subject: Some(message.subject.clone()),
            from: Some(message.from.clone()),
            date: Some(message.date),
        })
    }

    async fn fetch_flags(&self, uid: u32) -> Result<Vec<Flag>, ImapError> {
        let mut state = self.record(Call::FetchFlags(uid));
        Ok(state.message(uid)?.flags.iter().cloned().collect())
    }

    async fn set_flag(&self, uid: u32, flag: Flag, on: bool) -> Result<(), ImapError> {
        let mut state = self.record(Call::SetFlag(uid, flag.clone(), on));
        let message = state.message(uid)?;
        if on {
            message.flags.insert(flag);
        } else {
            message.flags.remove(&flag);
        }
        Ok(())
    }

    async fn copy(&self, uid: u32, destination: &str) -> Result<(), ImapError> {
        let mut state = self.record(Call::Copy(uid, destination.to_string()));
        if state.failing_copies.contains(&uid) {
            return Err(ImapError::Operation("COPY failed: quota exceeded".into()));
        }
        let mut copy = state.message(uid)?.clone();
        state.next_uid += 1;
        copy.uid = state.next_uid;
        state
            .folders
            .get_mut(destination)
            .ok_or_else(|| ImapError::Operation(format!("[TRYCREATE] {}", destination)))?
            .push(copy);
        Ok(())
    }

    async fn expunge(&self) -> Result<(), ImapError> {
        let mut state = self.record(Call::Expunge);
        let messages = state.selected_messages()?;
        let (deleted, kept): (Vec<_>, Vec<_>) = messages
            .drain(..)
            .partition(|m| m.flags.contains(&Flag::Deleted));
        *messages = kept;
        state.all_mail.extend(deleted.into_iter().map(|mut m| {
            m.flags.remove(&Flag::Deleted);
            m
        }));
        Ok(())
    }

    async fn close(&self) -> Result<(), ImapError> {
        let mut state = self.record(Call::Close);
        state.selected = None;
        Ok(())
    }

    async fn logout(&self) -> Result<(), ImapError> {
        self.record(Call::Logout);
        Ok(())
    }
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

pub fn settings(rules: Vec<PurgeRule>) -> Settings {
    Settings {
        account: Credentials {
            username: "someone@gmail.com".into(),
            password: "secret".into(),
        },
        server: ServerConfig::default(),
        purge: PurgeConfig::default(),
        rules,
    }
}

pub fn options(strategy: SelectionStrategy) -> RunOptions {
    RunOptions {
        pretend: false,
        verbose: true,
        archive: false,
        strategy,
    }
}
