//! Shared Rust core for the komik comic library browser.
//! Lists comic archives and folders, keeps the browse state observable and
//! soft-deletes entries with a grace period during which the user may undo.

pub mod adapter;
pub mod browser;
pub mod config;
pub mod deletion;
pub mod errors;
pub mod fs;
pub mod helpers;
pub mod listing;
pub mod models;
pub mod preferences;
pub mod thumbnails;

pub use adapter::{BoundItem, BrowserAdapter, OnComicClicked, Placeholder};
pub use browser::{BrowseStateMachine, BrowserViewModel};
pub use config::{BrowserConfig, DEFAULT_GRACE_PERIOD_MS};
pub use deletion::{DeferredDeletion, PendingView};
pub use errors::{CoreError, Result, PERMISSION_DENIED_MESSAGE};
pub use fs::{delete_path, FileSystem, RealFileSystem};
pub use helpers::{
    format_grace_period,
    format_modified,
    has_comic_extension,
    print_size,
    sanitize_user_path,
};
pub use listing::{ComicDirectoryListing, DirectoryListing};
pub use models::{BrowsePhase, BrowseState, Entry, EntryKind, FlushReport, LastSession};
pub use preferences::{
    Preferences,
    PREF_CURRENT_PAGE_LAST_COMIC,
    PREF_LAST_COMIC_PATH,
    PREF_ROOT_DIR,
};
pub use thumbnails::{
    SlotId,
    SlotToken,
    ThumbnailFailure,
    ThumbnailLoader,
    ThumbnailOutcome,
    ThumbnailSlots,
};

/// Re-export a small stable API surface for front-ends.
pub mod prelude {
    pub use crate::{
        browser::*,
        config::BrowserConfig,
        deletion::*,
        errors::{CoreError, Result},
        fs::{FileSystem, RealFileSystem},
        helpers::*,
        models::*,
        preferences::*,
    };
}
