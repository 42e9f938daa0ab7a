// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{debug, info, warn};

use crate::config::{PurgeRule, SelectionStrategy};
use crate::error::PurgeError;
use crate::imap::error::ImapError;
use crate::imap::session::MailboxSession;
use crate::imap::types::{MessageRef, MessageState};

/// Last day a message may have been sent on to survive a server-side search:
/// anything strictly before `today - (max_age_days + 1)` is old.
pub fn cutoff_date(now: DateTime<Utc>, max_age_days: u32) -> NaiveDate {
    now.date_naive() - Duration::days(i64::from(max_age_days) + 1)
}

/// True when more than `max_age_days` whole days separate `sent` and `now`.
pub fn is_older_than(sent: DateTime<Utc>, now: DateTime<Utc>, max_age_days: u32) -> bool {
    (now - sent).num_days() > i64::from(max_age_days)
}

/// Selects the messages of one rule's label that are past its age limit.
#[derive(Debug, Clone, Copy)]
pub struct AgeSelector {
    strategy: SelectionStrategy,
    now: DateTime<Utc>,
}

impl AgeSelector {
    pub fn new(strategy: SelectionStrategy, now: DateTime<Utc>) -> Self {
        Self { strategy, now }
    }

    /// Selects the label and returns the old messages in UID order.
    ///
    /// A label that cannot be selected yields [`PurgeError::FolderNotFound`];
    /// a failed search yields [`PurgeError::Selection`].
    pub async fn select<S: MailboxSession + ?Sized>(
        &self,
        session: &S,
        rule: &PurgeRule,
    ) -> Result<Vec<MessageRef>, PurgeError> {
        let mailbox = session
            .select_folder(&rule.label)
            .await
            .map_err(|source| match source {
                ImapError::FolderNotFound(_) => PurgeError::FolderNotFound {
                    label: rule.label.clone(),
                    source,
                },
                source => PurgeError::Selection {
                    label: rule.label.clone(),
                    source,
                },
            })?;
        debug!("Selected '{}' ({} messages)", rule.label, mailbox.exists);

        let messages = match self.strategy {
            SelectionStrategy::Server => self.search_server_side(session, rule).await,
            SelectionStrategy::Client => self.scan_client_side(session, rule).await,
        }
        .map_err(|source| PurgeError::Selection {
            label: rule.label.clone(),
            source,
        })?;

        info!(
            "{} message(s) in '{}' older than {} day(s)",
            messages.len(),
            rule.label,
            rule.max_age_days
        );
        Ok(messages)
    }

    async fn search_server_side<S: MailboxSession + ?Sized>(
        &self,
        session: &S,
        rule: &PurgeRule,
    ) -> Result<Vec<MessageRef>, ImapError> {
        let cutoff = cutoff_date(self.now, rule.max_age_days);
        debug!("Searching '{}' for messages sent before {}", rule.label, cutoff);
        let uids = session.search_sent_before(cutoff).await?;
        Ok(uids
            .into_iter()
            .map(|uid| MessageRef::new(uid, rule.label.as_str()))
            .collect())
    }

    /// Reads every message's Date header. The read state is captured first
    /// since a header fetch may set `\Seen` on some servers.
    async fn scan_client_side<S: MailboxSession + ?Sized>(
        &self,
        session: &S,
        rule: &PurgeRule,
    ) -> Result<Vec<MessageRef>, ImapError> {
        let all = session.search_all().await?;
        debug!("Scanning {} header(s) in '{}'", all.len(), rule.label);

        let mut old = Vec::new();
        for uid in all {
            let state = match session.fetch_flags(uid).await {
                Ok(flags) => MessageState::from_flags(&flags),
                Err(e) => {
                    warn!("Skipping UID {} in '{}': could not fetch flags: {}", uid, rule.label, e);
                    continue;
                }
            };
            let headers = match session.fetch_headers(uid).await {
                Ok(headers) => headers,
                Err(e) => {
                    warn!("Skipping UID {} in '{}': could not fetch headers: {}", uid, rule.label, e);
                    continue;
                }
            };
            match headers.date {
                Some(sent) if is_older_than(sent, self.now, rule.max_age_days) => {
                    old.push(MessageRef::new(uid, rule.label.as_str()).with_state(state))
                }
                Some(_) => {}
                None => debug!("Skipping UID {} in '{}': no usable Date header", uid, rule.label),
            }
        }
        Ok(old)
    }
}
