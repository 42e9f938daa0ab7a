// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

// Mailbox session boundary: everything that talks IMAP lives here.
pub mod client;
pub mod error;
pub mod headers;
pub mod session;
pub mod types;
pub mod utf7;

pub use client::connect;
pub use error::ImapError;
pub use session::{AsyncImapSessionWrapper, MailboxSession};
