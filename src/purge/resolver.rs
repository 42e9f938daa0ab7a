// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Finds the localized names of the system folders.
//!
//! Providers rename the root of their system folders per locale
//! (`[Gmail]` vs `[Google Mail]`) and some locales call the trash `Bin`.
//! Both are discovered by probing SELECT on a well-known subfolder; a failed
//! probe only means "not this one", never a failed run.

use log::{debug, info};

use crate::imap::session::MailboxSession;
use crate::imap::types::FolderNames;

pub const MAILBOX_DELIMITER: &str = "/";
pub const FALLBACK_ROOT: &str = "[Gmail]";
/// Subfolder whose presence identifies the root folder.
pub const ROOT_PROBE: &str = "Spam";
/// Regional name of the trash folder.
pub const REGIONAL_TRASH: &str = "Bin";
pub const DEFAULT_TRASH: &str = "Trash";

fn child(root: &str, name: &str) -> String {
    format!("{}{}{}", root, MAILBOX_DELIMITER, name)
}

async fn probe<S: MailboxSession + ?Sized>(session: &S, folder: &str) -> bool {
    match session.select_folder(folder).await {
        Ok(_) => true,
        Err(e) => {
            debug!("Probe of '{}' failed: {}", folder, e);
            false
        }
    }
}

/// Resolves root and trash folder names. Never fails: when no candidate
/// answers, the first candidate (or `[Gmail]`) and `Trash` are assumed.
pub async fn resolve_folder_names<S: MailboxSession + ?Sized>(
    session: &S,
    root_candidates: &[String],
) -> FolderNames {
    let default_root = root_candidates
        .first()
        .map(String::as_str)
        .unwrap_or(FALLBACK_ROOT);

    let mut root_folder = default_root.to_string();
    for candidate in root_candidates {
        if probe(session, &child(candidate, ROOT_PROBE)).await {
            root_folder = candidate.clone();
            break;
        }
    }

    let regional_trash = child(&root_folder, REGIONAL_TRASH);
    let trash_folder = if probe(session, &regional_trash).await {
        regional_trash
    } else {
        child(&root_folder, DEFAULT_TRASH)
    };

    info!("Using root folder '{}' and trash folder '{}'", root_folder, trash_folder);
    FolderNames {
        root_folder,
        trash_folder,
    }
}
