//! Page arithmetic. Pure function of `(total_results, page, page_size)`;
//! inputs are assumed validated by the query model.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
   pub total_results: u64,
   pub total_pages:   u64,
   pub page:          u32,
   pub page_size:     u32,
   /// Index of the first record of the page in the ordered result set.
   pub offset:        u64,
   /// Records the page actually holds; zero past the last page.
   pub len:           u64,
}

impl PageWindow {
   pub const fn is_empty(&self) -> bool {
      self.len == 0
   }

   /// Slices an already ordered, fully materialised result set.
   pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
      let start = usize::try_from(self.offset)
         .unwrap_or(usize::MAX)
         .min(items.len());
      let end = start
         .saturating_add(usize::try_from(self.len).unwrap_or(usize::MAX))
         .min(items.len());
      &items[start..end]
   }
}

pub fn paginate(total_results: u64, page: u32, page_size: u32) -> PageWindow {
   let size = u64::from(page_size.max(1));
   let total_pages = total_results.div_ceil(size);
   let offset = u64::from(page.max(1) - 1) * size;
   let len = total_results.saturating_sub(offset).min(size);

   PageWindow { total_results, total_pages, page, page_size, offset, len }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn empty_result_set_has_no_pages() {
      let window = paginate(0, 1, 20);
      assert_eq!(window.total_pages, 0);
      assert!(window.is_empty());
   }

   #[test]
   fn total_pages_is_ceiling() {
      for (total, size, pages) in [(1, 20, 1), (20, 20, 1), (21, 20, 2), (45, 10, 5), (100, 100, 1)]
      {
         assert_eq!(paginate(total, 1, size).total_pages, pages, "{total}/{size}");
      }
   }

   #[test]
   fn last_page_is_partial() {
      let window = paginate(45, 3, 20);
      assert_eq!(window.offset, 40);
      assert_eq!(window.len, 5);
   }

   #[test]
   fn page_past_the_end_is_empty_not_an_error() {
      let window = paginate(45, 4, 20);
      assert_eq!(window.total_results, 45);
      assert_eq!(window.total_pages, 3);
      assert_eq!(window.offset, 60);
      assert!(window.is_empty());
   }

   #[test]
   fn pages_concatenate_to_the_full_set_once() {
      let items: Vec<u32> = (0..47).collect();
      for size in [1, 5, 10, 47, 50] {
         let total_pages = paginate(items.len() as u64, 1, size).total_pages;
         let mut joined = Vec::new();
         for page in 1..=total_pages as u32 + 1 {
            let window = paginate(items.len() as u64, page, size);
            let slice = window.slice(&items);
            assert_eq!(slice.len() as u64, window.len);
            joined.extend_from_slice(slice);
         }
         assert_eq!(joined, items, "page size {size}");
      }
   }
}
