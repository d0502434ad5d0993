use crate::config::BrowserConfig;
use crate::deletion::{DeferredDeletion, PendingView};
use crate::errors::PERMISSION_DENIED_MESSAGE;
use crate::fs::{FileSystem, RealFileSystem};
use crate::listing::{ComicDirectoryListing, DirectoryListing};
use crate::models::{BrowseState, Entry, FlushReport, LastSession};
use crate::preferences::{
    Preferences, PREF_CURRENT_PAGE_LAST_COMIC, PREF_LAST_COMIC_PATH, PREF_ROOT_DIR,
};
use log::{debug, trace};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// Owns the browse state and moves it through its phases.
///
/// `load` does blocking filesystem work; callers on a UI context should run
/// it elsewhere. Concurrent loads are not ordered: the last one to finish
/// wins.
pub struct BrowseStateMachine {
    listing: Box<dyn DirectoryListing>,
    pending: PendingView,
    state: watch::Sender<BrowseState>,
    initialized: bool,
    current_dir: Option<PathBuf>,
}

impl BrowseStateMachine {
    pub fn new(listing: Box<dyn DirectoryListing>, pending: PendingView) -> Self {
        let (state, _) = watch::channel(BrowseState::default());
        Self {
            listing,
            pending,
            state,
            initialized: false,
            current_dir: None,
        }
    }

    fn set(&mut self, state: BrowseState) {
        self.initialized = state.initialized;
        self.state.send_replace(state);
    }

    pub fn initialize(&mut self, session: LastSession) {
        debug!("initialize({session:?})");
        self.set(BrowseState::uninitialized(session, self.initialized));
    }

    pub fn initialize_from_preferences(&mut self, prefs: &Preferences) {
        let session = LastSession::from_stored(
            prefs.get(PREF_ROOT_DIR, ""),
            prefs.get(PREF_LAST_COMIC_PATH, ""),
            &prefs.get(PREF_CURRENT_PAGE_LAST_COMIC, "0"),
        );
        self.initialize(session);
    }

    pub fn load(&mut self, dir: &Path) {
        debug!("----- load({}) -----", dir.display());
        self.set(BrowseState::loading(dir.to_path_buf()));

        let listed = match self.listing.list(dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!("load({}) failed: {err}", dir.display());
                self.set(BrowseState::error(err.user_message(), self.initialized));
                return;
            }
        };

        let hidden = self.pending.snapshot();
        trace!("  pending deletion = {hidden:?}");
        let entries: Vec<Entry> = listed
            .into_iter()
            .filter(|entry| {
                let skip = hidden.contains(&entry.path);
                trace!("   => {} {}", entry.name, if skip { "SKIPPED" } else { "ADDED" });
                !skip
            })
            .collect();

        self.current_dir = Some(dir.to_path_buf());
        self.set(BrowseState::ready(dir.to_path_buf(), entries));
    }

    pub fn error_permission_denied(&mut self) {
        debug!("error_permission_denied");
        self.set(BrowseState::error(PERMISSION_DENIED_MESSAGE, self.initialized));
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn state(&self) -> BrowseState {
        self.state.borrow().clone()
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn subscribe(&self) -> watch::Receiver<BrowseState> {
        self.state.subscribe()
    }
}

/// The browser screen's model: listing, soft delete and remembered session.
pub struct BrowserViewModel {
    browser: BrowseStateMachine,
    deletion: DeferredDeletion,
    prefs: Arc<Preferences>,
}

impl BrowserViewModel {
    pub fn new(
        listing: Box<dyn DirectoryListing>,
        deletion: DeferredDeletion,
        prefs: Arc<Preferences>,
    ) -> Self {
        let browser = BrowseStateMachine::new(listing, deletion.view());
        Self {
            browser,
            deletion,
            prefs,
        }
    }

    /// Wires the production listing and deletion over `fs`.
    pub fn with_filesystem(
        fs: Arc<dyn FileSystem>,
        config: &BrowserConfig,
        prefs: Arc<Preferences>,
    ) -> Self {
        let listing = ComicDirectoryListing::new(Arc::clone(&fs), config);
        let deletion = DeferredDeletion::new(fs, config.grace_period());
        Self::new(Box::new(listing), deletion, prefs)
    }

    pub fn open(config: &BrowserConfig, prefs: Arc<Preferences>) -> Self {
        Self::with_filesystem(Arc::new(RealFileSystem), config, prefs)
    }

    pub fn init(&mut self) {
        self.browser.initialize_from_preferences(&self.prefs);
    }

    pub fn load_comics(&mut self, dir: &Path) {
        self.browser.load(dir);
    }

    /// Hides `paths` now and deletes them once the grace period is over.
    ///
    /// Returns the report of the earlier batch this request forced out. On
    /// error nothing was hidden and the view is left as it was.
    pub fn prepare_delete_files(&mut self, paths: Vec<PathBuf>) -> crate::Result<FlushReport> {
        let report = self.deletion.request_deletion(paths)?;
        self.refresh();
        Ok(report)
    }

    /// Cancels the pending deletion. On true the caller should refresh.
    pub fn undo_delete_files(&mut self) -> bool {
        self.deletion.undo_deletion()
    }

    /// Reloads the current directory, if one was loaded.
    pub fn refresh(&mut self) {
        match self.browser.current_dir().map(Path::to_path_buf) {
            Some(dir) => self.browser.load(&dir),
            None => debug!("refresh: no directory loaded yet"),
        }
    }

    pub fn flush_pending_deletion(&self) -> FlushReport {
        self.deletion.flush_pending_deletion()
    }

    pub fn set_pref_root_dir(&self, path: &Path) {
        self.prefs.set(PREF_ROOT_DIR, &path.to_string_lossy());
    }

    pub fn set_pref_last_comic_path(&self, path: &Path) {
        self.prefs.set(PREF_LAST_COMIC_PATH, &path.to_string_lossy());
    }

    pub fn set_pref_current_page(&self, page: u32) {
        self.prefs.set(PREF_CURRENT_PAGE_LAST_COMIC, &page.to_string());
    }

    pub fn browser(&self) -> &BrowseStateMachine {
        &self.browser
    }

    pub fn deletion(&self) -> &DeferredDeletion {
        &self.deletion
    }

    pub fn state(&self) -> BrowseState {
        self.browser.state()
    }
}
