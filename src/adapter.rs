use crate::models::Entry;
use crate::thumbnails::{SlotId, SlotToken, ThumbnailLoader, ThumbnailOutcome, ThumbnailSlots};
use log::debug;
use std::path::PathBuf;

/// Receives clicks on listed entries.
pub trait OnComicClicked {
    fn on_comic_clicked(&self, entry: &Entry);
}

/// Artwork to show while the real thumbnail is loading.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Placeholder {
    Comic,
    Library,
}

/// What a display slot shows after `bind`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BoundItem {
    pub label: String,
    pub placeholder: Placeholder,
    pub token: SlotToken,
}

/// Presents a listing to a recycling list view.
pub struct BrowserAdapter<'a> {
    entries: Vec<Entry>,
    slots: ThumbnailSlots,
    listener: Option<&'a dyn OnComicClicked>,
}

impl<'a> BrowserAdapter<'a> {
    pub fn new(entries: Vec<Entry>, listener: Option<&'a dyn OnComicClicked>) -> Self {
        Self {
            entries,
            slots: ThumbnailSlots::new(),
            listener,
        }
    }

    pub fn item_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Shows the entry at `position` in `slot` and requests its thumbnail.
    pub fn bind(
        &self,
        position: usize,
        slot: SlotId,
        loader: &dyn ThumbnailLoader,
    ) -> Option<BoundItem> {
        let entry = self.entries.get(position)?;
        let token = self.slots.assign(slot, &entry.path);
        let placeholder = if entry.is_dir() {
            loader.load_directory(&entry.path, token);
            Placeholder::Library
        } else {
            loader.load_comic(&entry.path, token);
            Placeholder::Comic
        };
        Some(BoundItem {
            label: entry.name.clone(),
            placeholder,
            token,
        })
    }

    pub fn recycle(&self, slot: SlotId) {
        self.slots.release(slot);
    }

    pub fn on_click(&self, slot: SlotId) {
        let Some(path) = self.slots.bound_entry(slot) else {
            return;
        };
        let entry = self.entries.iter().find(|e| e.path == path);
        if let (Some(listener), Some(entry)) = (self.listener, entry) {
            listener.on_comic_clicked(entry);
        }
    }

    /// Image to display for a finished thumbnail, if it still applies.
    pub fn on_finished(&self, token: SlotToken, outcome: ThumbnailOutcome) -> Option<PathBuf> {
        debug!("on_finished {:?} {:?}", token, outcome);
        self.slots.accept(token, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingLoader {
        requests: RefCell<Vec<(String, PathBuf)>>,
    }

    impl ThumbnailLoader for RecordingLoader {
        fn load_comic(&self, comic: &Path, _token: SlotToken) {
            self.requests.borrow_mut().push(("comic".into(), comic.to_path_buf()));
        }

        fn load_directory(&self, dir: &Path, _token: SlotToken) {
            self.requests.borrow_mut().push(("dir".into(), dir.to_path_buf()));
        }
    }

    #[derive(Default)]
    struct ClickLog {
        clicked: RefCell<Vec<PathBuf>>,
    }

    impl OnComicClicked for ClickLog {
        fn on_comic_clicked(&self, entry: &Entry) {
            self.clicked.borrow_mut().push(entry.path.clone());
        }
    }

    fn listing() -> Vec<Entry> {
        vec![Entry::directory("/comics/series"), Entry::file("/comics/a.cbz")]
    }

    #[test]
    fn bind_picks_placeholder_and_loader_by_kind() {
        let loader = RecordingLoader::default();
        let adapter = BrowserAdapter::new(listing(), None);

        let dir = adapter.bind(0, SlotId(0), &loader).unwrap();
        let comic = adapter.bind(1, SlotId(1), &loader).unwrap();

        assert_eq!(adapter.item_count(), 2);
        assert_eq!(dir.placeholder, Placeholder::Library);
        assert_eq!(comic.placeholder, Placeholder::Comic);
        assert_eq!(comic.label, "a.cbz");
        assert_eq!(loader.requests.borrow()[0].0, "dir");
        assert_eq!(loader.requests.borrow()[1].0, "comic");
        assert!(adapter.bind(5, SlotId(2), &loader).is_none());
    }

    #[test]
    fn click_reports_the_entry_bound_to_the_slot() {
        let clicks = ClickLog::default();
        let loader = RecordingLoader::default();
        let adapter = BrowserAdapter::new(listing(), Some(&clicks as &dyn OnComicClicked));

        adapter.bind(0, SlotId(0), &loader);
        adapter.bind(1, SlotId(0), &loader);
        adapter.on_click(SlotId(0));
        adapter.on_click(SlotId(9));

        assert_eq!(*clicks.clicked.borrow(), vec![PathBuf::from("/comics/a.cbz")]);
    }

    #[test]
    fn late_thumbnail_for_recycled_slot_is_dropped() {
        let tmp = TempDir::new().unwrap();
        let image = tmp.path().join("cover.png");
        std::fs::write(&image, b"png").unwrap();
        let loader = RecordingLoader::default();
        let adapter = BrowserAdapter::new(listing(), None);

        let old = adapter.bind(1, SlotId(0), &loader).unwrap().token;
        let new = adapter.bind(0, SlotId(0), &loader).unwrap().token;

        assert_eq!(adapter.on_finished(old, ThumbnailOutcome::Success(image.clone())), None);
        assert_eq!(adapter.on_finished(new, ThumbnailOutcome::Success(image.clone())), Some(image));
    }
}
