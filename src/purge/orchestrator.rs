// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use crate::config::{PurgeRule, Settings};
use crate::error::PurgeError;
use crate::imap::{self, session::MailboxSession, types::{FolderNames, MessageRef}};
use crate::purge::{
    executor::{ExecutionOutcome, FlagPreservingExecutor},
    resolver::resolve_folder_names,
    selector::AgeSelector,
    RunOptions,
};

/// Counters for one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSummary {
    pub label: String,
    pub max_age_days: u32,
    pub selected: usize,
    /// Transactions completed (or reported, in pretend mode)
    pub processed: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct MessageFailure {
    pub message: MessageRef,
    pub error: PurgeError,
}

#[derive(Debug)]
pub struct PurgeReport {
    pub folders: FolderNames,
    pub rules: Vec<RuleSummary>,
    /// Labels whose age query failed and were skipped
    pub skipped_labels: Vec<PurgeError>,
    pub failures: Vec<MessageFailure>,
}

impl PurgeReport {
    pub fn processed(&self) -> usize {
        self.rules.iter().map(|rule| rule.processed).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.skipped_labels.is_empty() && self.failures.is_empty()
    }
}

/// Drives one purge run over an already authenticated session.
pub struct Purger<'a, S: MailboxSession + ?Sized> {
    session: &'a S,
    rules: &'a [PurgeRule],
    root_candidates: &'a [String],
    options: RunOptions,
    now: DateTime<Utc>,
}

impl<'a, S: MailboxSession + ?Sized> Purger<'a, S> {
    pub fn new(session: &'a S, settings: &'a Settings, options: RunOptions) -> Self {
        Self {
            session,
            rules: &settings.rules,
            root_candidates: &settings.purge.root_candidates,
            options,
            now: Utc::now(),
        }
    }

    /// Fixes the instant ages are measured against.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Resolves folder names, processes every rule in order and logs out.
    ///
    /// Recoverable failures end up in the report. A missing label stops the
    /// run; the session is still closed before the error is returned.
    pub async fn run(&self) -> Result<PurgeReport, PurgeError> {
        let result = self.process_rules().await;
        self.teardown().await;
        result
    }

    async fn process_rules(&self) -> Result<PurgeReport, PurgeError> {
        let folders = resolve_folder_names(self.session, self.root_candidates).await;
        let selector = AgeSelector::new(self.options.strategy, self.now);
        let executor = FlagPreservingExecutor::new(self.session, &folders, &self.options);

        let mut rules = Vec::with_capacity(self.rules.len());
        let mut skipped_labels = Vec::new();
        let mut failures = Vec::new();

        for rule in self.rules {
            if self.options.verbose {
                info!("Processing '{}' (older than {} days)", rule.label, rule.max_age_days);
            }
            let mut summary = RuleSummary {
                label: rule.label.clone(),
                max_age_days: rule.max_age_days,
                selected: 0,
                processed: 0,
                failed: 0,
            };

            let messages = match selector.select(self.session, rule).await {
                Ok(messages) => messages,
                Err(e) if !e.is_fatal() => {
                    warn!("{}; continuing with the next label", e);
                    skipped_labels.push(e);
                    rules.push(summary);
                    continue;
                }
                Err(e) => return Err(e),
            };
            summary.selected = messages.len();

            for message in messages {
                match executor.execute(&message).await {
                    Ok(ExecutionOutcome::Retained) => {
                        warn!("UID {} is still present in '{}' after expunge", message.uid, message.label);
                        summary.processed += 1;
                    }
                    Ok(_) => summary.processed += 1,
                    Err(e) => {
                        error!("{}", e);
                        summary.failed += 1;
                        failures.push(MessageFailure { message, error: e });
                    }
                }
            }
            rules.push(summary);
        }

        Ok(PurgeReport {
            folders,
            rules,
            skipped_labels,
            failures,
        })
    }

    async fn teardown(&self) {
        if let Err(e) = self.session.close().await {
            debug!("Ignoring CLOSE failure: {}", e);
        }
        if let Err(e) = self.session.logout().await {
            debug!("Ignoring LOGOUT failure: {}", e);
        }
    }
}

/// Connects with the configured credentials and runs the purge.
///
/// A rejected login is returned as [`PurgeError::Auth`], any other failure
/// to open the session as [`PurgeError::Connect`]. Both are fatal.
pub async fn run_purge(settings: &Settings, options: RunOptions) -> Result<PurgeReport, PurgeError> {
    let session = imap::connect(&settings.server, settings.credentials())
        .await
        .map_err(PurgeError::from_connect)?;
    Purger::new(&session, settings, options).run().await
}
