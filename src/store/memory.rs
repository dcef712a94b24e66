use parking_lot::RwLock;

use super::Store;
use crate::{
   error::StoreError,
   search::predicate::{Filter, OrderDirective},
   types::Post,
};

/// Posts held in memory. Evaluates predicates directly instead of
/// translating them.
#[derive(Debug, Default)]
pub struct MemoryStore {
   posts: RwLock<Vec<Post>>,
}

impl MemoryStore {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn with_posts(posts: impl IntoIterator<Item = Post>) -> Self {
      let store = Self::new();
      for post in posts {
         store.insert(post);
      }
      store
   }

   /// Inserts a post, replacing any post with the same id.
   pub fn insert(&self, post: Post) {
      let mut posts = self.posts.write();
      match posts.iter_mut().find(|p| p.id == post.id) {
         Some(existing) => *existing = post,
         None => posts.push(post),
      }
   }

   pub fn len(&self) -> usize {
      self.posts.read().len()
   }

   pub fn is_empty(&self) -> bool {
      self.posts.read().is_empty()
   }
}

impl Store for MemoryStore {
   fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
      let posts = self.posts.read();
      Ok(posts.iter().filter(|p| filter.matches(p)).count() as u64)
   }

   fn fetch(
      &self,
      filter: &Filter,
      order: OrderDirective,
      offset: u64,
      limit: u64,
   ) -> Result<Vec<Post>, StoreError> {
      let mut matched: Vec<Post> = {
         let posts = self.posts.read();
         posts.iter().filter(|p| filter.matches(p)).cloned().collect()
      };
      matched.sort_by(|a, b| order.compare(a, b));

      let skip = usize::try_from(offset).unwrap_or(usize::MAX);
      let take = usize::try_from(limit).unwrap_or(usize::MAX);
      Ok(matched.into_iter().skip(skip).take(take).collect())
   }
}
