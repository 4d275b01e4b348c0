//! The paginated application list.
//!
//! Entries only ever accumulate: pages and pushed creations are merged by
//! id, and nothing already held is dropped.

use ethica_shared::protocol::ApplicationPage;
use ethica_shared::{ApplicationSummary, RecordId};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct ApplicationList {
    entries: Vec<ApplicationSummary>,
    current_page: u32,
    last_page: u32,
    per_page: u32,
    total: u64,
}

impl ApplicationList {
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page,
            ..Default::default()
        }
    }

    pub fn from_page(page: ApplicationPage) -> Self {
        let mut list = Self::new(page.per_page);
        list.merge_page(page);
        list
    }

    /// Fold a fetched page in. Returns whether any entry changed.
    pub fn merge_page(&mut self, page: ApplicationPage) -> bool {
        self.current_page = self.current_page.max(page.current_page);
        self.last_page = page.last_page;
        self.per_page = page.per_page;
        self.total = self.total.max(page.total);

        let mut changed = false;
        for summary in page.data {
            changed |= self.upsert(summary);
        }
        changed
    }

    /// Append an application announced on the list topic.
    pub fn push_created(&mut self, summary: ApplicationSummary) -> bool {
        let is_new = self.position(&summary.id).is_none();
        let changed = self.upsert(summary);
        if is_new {
            self.total += 1;
        }
        debug!(is_new, changed, total = self.total, "Application announced");
        changed
    }

    pub fn get(&self, id: &RecordId) -> Option<&ApplicationSummary> {
        self.position(id).map(|idx| &self.entries[idx])
    }

    pub fn entries(&self) -> &[ApplicationSummary] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn has_more(&self) -> bool {
        self.current_page < self.last_page
    }

    /// The page number to request next, if any.
    pub fn next_page(&self) -> Option<u32> {
        self.has_more().then_some(self.current_page + 1)
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.entries.iter().position(|e| &e.id == id)
    }

    fn upsert(&mut self, summary: ApplicationSummary) -> bool {
        match self.position(&summary.id) {
            Some(idx) if self.entries[idx] == summary => false,
            Some(idx) => {
                self.entries[idx] = summary;
                true
            }
            None => {
                self.entries.push(summary);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, title: &str) -> ApplicationSummary {
        ApplicationSummary {
            id: RecordId::from(id),
            research_title: title.to_string(),
            ..Default::default()
        }
    }

    fn page(n: u32, ids: &[&str]) -> ApplicationPage {
        ApplicationPage {
            data: ids.iter().map(|id| summary(id, "Study")).collect(),
            current_page: n,
            last_page: 3,
            per_page: 2,
            total: 6,
        }
    }

    #[test]
    fn test_pages_accumulate() {
        let mut list = ApplicationList::from_page(page(1, &["1", "2"]));
        assert_eq!(list.next_page(), Some(2));

        assert!(list.merge_page(page(2, &["3", "4"])));
        assert_eq!(list.len(), 4);
        assert_eq!(list.current_page(), 2);
    }

    #[test]
    fn test_created_entry_is_appended_once() {
        let mut list = ApplicationList::from_page(page(1, &["1", "2"]));
        assert!(list.push_created(summary("9", "New study")));
        assert!(!list.push_created(summary("9", "New study")));
        assert_eq!(list.len(), 3);
        assert_eq!(list.total(), 7);
        assert_eq!(list.entries().last().map(|e| e.id.as_str()), Some("9"));
    }

    #[test]
    fn test_refetch_never_drops_entries() {
        let mut list = ApplicationList::from_page(page(1, &["1", "2"]));
        list.push_created(summary("9", "New study"));

        // Page 1 refetched after the new application shifted the ordering.
        list.merge_page(page(1, &["9", "1"]));
        assert_eq!(list.len(), 3);
        assert!(list.get(&RecordId::from("2")).is_some());
    }
}
