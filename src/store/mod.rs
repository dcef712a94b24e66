pub mod memory;
pub mod sqlite;

use std::sync::Arc;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::{
   error::StoreError,
   search::predicate::{Filter, OrderDirective},
   types::Post,
};

/// Read interface the search engine runs against. Adapters translate the
/// predicate tree into their native query form.
pub trait Store: Send + Sync {
   /// Number of posts matching every predicate of `filter`.
   fn count(&self, filter: &Filter) -> Result<u64, StoreError>;

   /// Matching posts in `order`, skipping `offset` and returning at most
   /// `limit`.
   fn fetch(
      &self,
      filter: &Filter,
      order: OrderDirective,
      offset: u64,
      limit: u64,
   ) -> Result<Vec<Post>, StoreError>;
}

impl<T: Store + ?Sized> Store for Arc<T> {
   fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
      (**self).count(filter)
   }

   fn fetch(
      &self,
      filter: &Filter,
      order: OrderDirective,
      offset: u64,
      limit: u64,
   ) -> Result<Vec<Post>, StoreError> {
      (**self).fetch(filter, order, offset, limit)
   }
}
