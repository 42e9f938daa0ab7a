// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

pub mod executor;
pub mod orchestrator;
pub mod resolver;
pub mod selector;

pub use executor::{ExecutionOutcome, FlagPreservingExecutor, PurgeAction};
pub use orchestrator::{run_purge, MessageFailure, PurgeReport, Purger, RuleSummary};
pub use resolver::resolve_folder_names;
pub use selector::AgeSelector;

use crate::config::SelectionStrategy;

/// Run-wide switches, applied uniformly to every rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Report what would happen without changing anything
    pub pretend: bool,
    /// Narrate each message at info level
    pub verbose: bool,
    /// Archive instead of moving to trash
    pub archive: bool,
    pub strategy: SelectionStrategy,
}
