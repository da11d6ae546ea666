//! One page of a result set and its arithmetic.

use serde::Serialize;

/// Page size used when the caller supplies an invalid one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A page of `T` plus the numbers needed to navigate the full result set.
///
/// Only `pageNo`, `pageSize`, `totalCount` and `list` are serialized; the
/// derived values (`total_page`, boundary flags) are recomputed on demand.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    page_no: u32,
    page_size: u32,
    total_count: u64,
    #[serde(rename = "list")]
    items: Vec<T>,
}

impl<T> Page<T> {
    /// Build a page shell with an empty item list.
    ///
    /// Field order matters: total count, then page size, then page number,
    /// then a single clamp pass that lowers an overshooting page number to
    /// the last page. Clamping happens here, not on every access.
    pub fn new(page_no: u32, page_size: u32, total_count: i64) -> Self {
        let mut page = Page {
            page_no: 1,
            page_size: DEFAULT_PAGE_SIZE,
            total_count: 0,
            items: Vec::new(),
        };
        page.set_total_count(total_count);
        page.set_page_size(page_size);
        page.set_page_no(page_no);
        page.adjust_page_no();
        page
    }

    pub fn with_items(mut self, items: Vec<T>) -> Self {
        self.items = items;
        self
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Lower the page number to the last page if it overshoots. Page 1 is
    /// always valid, whatever the total count.
    fn adjust_page_no(&mut self) {
        if self.page_no == 1 {
            return;
        }
        let tp = self.total_page();
        if u64::from(self.page_no) > tp {
            self.page_no = tp as u32;
        }
    }

    /// A value below 1 is forced to 1.
    pub fn set_page_no(&mut self, page_no: u32) {
        self.page_no = page_no.max(1);
    }

    /// A value below 1 falls back to [`DEFAULT_PAGE_SIZE`].
    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = if page_size < 1 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
    }

    /// A negative count is forced to 0.
    pub fn set_total_count(&mut self, total_count: i64) {
        self.total_count = total_count.max(0) as u64;
    }

    pub fn page_no(&self) -> u32 {
        self.page_no
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Total number of pages; at least 1 even for an empty result set.
    pub fn total_page(&self) -> u64 {
        let mut total_page = self.total_count / u64::from(self.page_size);
        if total_page == 0 || self.total_count % u64::from(self.page_size) != 0 {
            total_page += 1;
        }
        total_page
    }

    pub fn is_first_page(&self) -> bool {
        self.page_no <= 1
    }

    pub fn is_last_page(&self) -> bool {
        u64::from(self.page_no) >= self.total_page()
    }

    /// Next page number; unchanged when already on the last page.
    pub fn next_page(&self) -> u32 {
        if self.is_last_page() {
            self.page_no
        } else {
            self.page_no + 1
        }
    }

    /// Previous page number; unchanged when already on the first page.
    pub fn prev_page(&self) -> u32 {
        if self.is_first_page() {
            self.page_no
        } else {
            self.page_no - 1
        }
    }

    /// Row offset of the first record of this page.
    pub fn first_result(&self) -> u64 {
        u64::from(self.page_no - 1) * u64::from(self.page_size)
    }

    /// Rebuild the page around items of another type, keeping the numbers.
    pub fn try_map_items<U, E>(
        self,
        f: impl FnMut(T) -> Result<U, E>,
    ) -> Result<Page<U>, E> {
        let Page {
            page_no,
            page_size,
            total_count,
            items,
        } = self;
        let items = items.into_iter().map(f).collect::<Result<Vec<U>, E>>()?;
        Ok(Page {
            page_no,
            page_size,
            total_count,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_page_is_at_least_one() {
        assert_eq!(Page::<()>::new(1, 20, 0).total_page(), 1);
        assert_eq!(Page::<()>::new(1, 20, 20).total_page(), 1);
        assert_eq!(Page::<()>::new(1, 20, 21).total_page(), 2);
    }

    #[test]
    fn overshooting_page_no_is_clamped_at_construction() {
        let p = Page::<()>::new(100, 10, 25);
        assert_eq!(p.total_page(), 3);
        assert_eq!(p.page_no(), 3);
    }

    #[test]
    fn page_one_is_never_clamped() {
        let p = Page::<()>::new(1, 10, 0);
        assert_eq!(p.page_no(), 1);
    }

    #[test]
    fn invalid_inputs_fall_back() {
        let mut p = Page::<()>::new(0, 0, -5);
        assert_eq!(p.page_no(), 1);
        assert_eq!(p.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(p.total_count(), 0);
        p.set_page_no(0);
        assert_eq!(p.page_no(), 1);
        p.set_page_size(0);
        assert_eq!(p.page_size(), DEFAULT_PAGE_SIZE);
        p.set_total_count(-1);
        assert_eq!(p.total_count(), 0);
    }

    #[test]
    fn single_page_is_both_first_and_last() {
        let p = Page::<()>::new(1, 20, 5);
        assert!(p.is_first_page());
        assert!(p.is_last_page());
    }

    #[test]
    fn boundary_navigation_is_idempotent() {
        let last = Page::<()>::new(3, 10, 25);
        assert!(last.is_last_page());
        assert_eq!(last.next_page(), 3);
        assert_eq!(last.prev_page(), 2);

        let first = Page::<()>::new(1, 10, 25);
        assert!(first.is_first_page());
        assert_eq!(first.prev_page(), 1);
        assert_eq!(first.next_page(), 2);
    }

    #[test]
    fn first_result_is_row_offset() {
        assert_eq!(Page::<()>::new(1, 20, 100).first_result(), 0);
        assert_eq!(Page::<()>::new(3, 20, 100).first_result(), 40);
    }

    #[test]
    fn serializes_exactly_four_fields() {
        let p = Page::new(2, 10, 25).with_items(vec![1, 2, 3]);
        let v = serde_json::to_value(&p).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(v["pageNo"], 2);
        assert_eq!(v["pageSize"], 10);
        assert_eq!(v["totalCount"], 25);
        assert_eq!(v["list"], serde_json::json!([1, 2, 3]));
    }
}
