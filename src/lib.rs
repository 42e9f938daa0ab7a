//! Library core for labelpurge.

// --- Modules ---
pub mod config;
pub mod error;
pub mod imap;
pub mod purge;

// Re-export key types for convenience
pub mod prelude {
    // Config
    pub use crate::config::{Credentials, PurgeRule, SelectionStrategy, Settings};
    pub use crate::error::PurgeError;

    // IMAP
    pub use crate::imap::error::ImapError;
    pub use crate::imap::session::{AsyncImapSessionWrapper, MailboxSession};
    pub use crate::imap::types::{Flag, FolderNames, MailboxInfo, MessageHeaders, MessageRef, MessageState};
    pub use crate::imap::utf7;

    // Purge engine
    pub use crate::purge::{run_purge, PurgeReport, Purger, RunOptions};

    // Common Libs
    pub use log::{debug, error, info, trace, warn};
}
