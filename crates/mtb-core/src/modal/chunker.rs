/// Discord's hard limit on text inputs per modal.
pub const MAX_FIELDS_PER_PAGE: usize = 5;

/// Paging progress for a form of `total` fields with `collected` answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageProgress {
    /// 1-indexed page just completed; 0 before anything was collected.
    pub current_page: usize,
    pub total_pages: usize,
    pub is_complete: bool,
}

/// The next page to render: up to five fields starting at `collected`.
pub fn next_page<T>(fields: &[T], collected: usize) -> &[T] {
    let start = collected.min(fields.len());
    let end = (start + MAX_FIELDS_PER_PAGE).min(fields.len());
    &fields[start..end]
}

/// All pages in order.
pub fn pages<T>(fields: &[T]) -> std::slice::Chunks<'_, T> {
    fields.chunks(MAX_FIELDS_PER_PAGE)
}

pub fn total_pages(total: usize) -> usize {
    total.div_ceil(MAX_FIELDS_PER_PAGE)
}

pub fn progress(total: usize, collected: usize) -> PageProgress {
    PageProgress {
        current_page: collected.div_ceil(MAX_FIELDS_PER_PAGE),
        total_pages: total_pages(total),
        is_complete: collected >= total,
    }
}

/// Whether a form needs the multi-page flow at all.
pub fn needs_paging(total: usize) -> bool {
    total > MAX_FIELDS_PER_PAGE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_fields_split_five_five_two() {
        let fields: Vec<usize> = (0..12).collect();
        let sizes: Vec<usize> = pages(&fields).map(|p| p.len()).collect();
        assert_eq!(sizes, vec![5, 5, 2]);
        assert_eq!(total_pages(12), 3);

        assert_eq!(next_page(&fields, 0), &[0, 1, 2, 3, 4]);
        assert_eq!(next_page(&fields, 5), &[5, 6, 7, 8, 9]);
        assert_eq!(next_page(&fields, 10), &[10, 11]);
        assert!(next_page(&fields, 12).is_empty());
    }

    #[test]
    fn page_sizes_cover_every_field() {
        for n in 0..=31 {
            let fields: Vec<usize> = (0..n).collect();
            let sizes: Vec<usize> = pages(&fields).map(|p| p.len()).collect();
            assert_eq!(sizes.iter().sum::<usize>(), n);
            assert!(sizes.iter().all(|s| *s <= MAX_FIELDS_PER_PAGE));
            assert_eq!(sizes.len(), total_pages(n));
        }
    }

    #[test]
    fn progress_reports_pages_and_completion() {
        assert_eq!(
            progress(7, 0),
            PageProgress {
                current_page: 0,
                total_pages: 2,
                is_complete: false
            }
        );
        assert_eq!(progress(7, 5).current_page, 1);
        assert!(!progress(7, 5).is_complete);
        assert!(progress(7, 7).is_complete);
        assert_eq!(progress(7, 7).current_page, 2);
    }

    #[test]
    fn empty_form_is_complete_immediately() {
        let fields: Vec<u8> = Vec::new();
        assert!(progress(0, 0).is_complete);
        assert_eq!(total_pages(0), 0);
        assert!(next_page(&fields, 0).is_empty());
    }

    #[test]
    fn collected_past_end_yields_empty_page() {
        let fields = [1, 2, 3];
        assert!(next_page(&fields, 10).is_empty());
    }

    #[test]
    fn paging_starts_above_five_fields() {
        assert!(!needs_paging(5));
        assert!(needs_paging(6));
    }
}
