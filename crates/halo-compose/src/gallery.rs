//! View model for the history grid and its detail modal.
//!
//! A [`Gallery`] is rebuilt from [`HistoryStore::list`] output after
//! every store change; it never caches across changes. Grid entries only
//! carry thumbnails. The full-resolution composite is reachable solely
//! through [`Gallery::open`].
//!
//! [`HistoryStore::list`]: crate::history::HistoryStore::list

use crate::history::{HistoryRecord, RecordId};
use crate::types::EncodedImage;

/// One cell of the history grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryEntry {
    id: RecordId,
    position: usize,
    thumbnail: EncodedImage,
}

impl GalleryEntry {
    /// Record key, used to open the detail view.
    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.id
    }

    /// 1-based position in the grid, newest first.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Thumbnail PNG shown in the grid cell.
    #[must_use]
    pub const fn thumbnail(&self) -> &EncodedImage {
        &self.thumbnail
    }

    /// Accessible description of the thumbnail.
    #[must_use]
    pub fn alt_text(&self) -> String {
        format!("Saved avatar #{}", self.position)
    }

    /// File name offered by the per-entry download link.
    #[must_use]
    pub fn thumbnail_download_name(&self) -> String {
        format!("avatar-history-thumb-{}.png", self.position)
    }
}

/// Full-resolution view of one record, shown in the modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    /// Record key.
    pub id: RecordId,
    /// Full-resolution composite PNG.
    pub image: EncodedImage,
    /// Creation time, epoch milliseconds.
    pub timestamp: u64,
}

/// The history grid, in store list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
    records: Vec<HistoryRecord>,
}

impl Gallery {
    /// Build the grid from records as returned by the store, which are
    /// already newest first.
    #[must_use]
    pub fn from_records(records: Vec<HistoryRecord>) -> Self {
        let entries = records
            .iter()
            .enumerate()
            .map(|(index, record)| GalleryEntry {
                id: record.id,
                position: index + 1,
                thumbnail: record.thumbnail.clone(),
            })
            .collect();
        Self { entries, records }
    }

    /// Grid cells in display order.
    #[must_use]
    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the "no history yet" message should be shown instead of
    /// the grid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The full-resolution view for `id`, if it is in this gallery.
    #[must_use]
    pub fn open(&self, id: RecordId) -> Option<DetailView> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .map(|r| DetailView {
                id: r.id,
                image: r.full.clone(),
                timestamp: r.timestamp,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rec(id: u64, ts: u64) -> HistoryRecord {
        HistoryRecord {
            id: RecordId(id),
            thumbnail: EncodedImage::new(vec![u8::try_from(id).unwrap(); 2]),
            full: EncodedImage::new(vec![0xF0, u8::try_from(id).unwrap()]),
            timestamp: ts,
        }
    }

    #[test]
    fn empty_records_give_empty_gallery() {
        let gallery = Gallery::from_records(Vec::new());
        assert!(gallery.is_empty());
        assert_eq!(gallery.len(), 0);
        assert_eq!(gallery.open(RecordId(1)), None);
    }

    #[test]
    fn entries_follow_list_order_with_one_based_positions() {
        let gallery = Gallery::from_records(vec![rec(7, 300), rec(3, 200), rec(5, 100)]);
        let ids: Vec<_> = gallery.entries().iter().map(GalleryEntry::id).collect();
        assert_eq!(ids, vec![RecordId(7), RecordId(3), RecordId(5)]);

        let second = &gallery.entries()[1];
        assert_eq!(second.position(), 2);
        assert_eq!(second.alt_text(), "Saved avatar #2");
        assert_eq!(second.thumbnail_download_name(), "avatar-history-thumb-2.png");
        assert_eq!(second.thumbnail().as_bytes(), &[3, 3]);
    }

    #[test]
    fn open_returns_full_resolution_image() {
        let gallery = Gallery::from_records(vec![rec(2, 20), rec(1, 10)]);
        let detail = gallery.open(RecordId(1)).unwrap();
        assert_eq!(detail.image.as_bytes(), &[0xF0, 1]);
        assert_eq!(detail.timestamp, 10);
        assert_eq!(gallery.open(RecordId(9)), None);
    }
}
