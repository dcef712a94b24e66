pub mod highlight;
pub mod paginate;
pub mod predicate;
pub mod ranking;

use std::sync::Arc;

use tracing::debug;

use crate::{
   Error,
   error::Result,
   labels::LabelClassifier,
   query::SearchQuery,
   store::Store,
   types::{SearchHit, SearchResult},
};

/// Runs validated queries against a [`Store`]: one count, one paginated
/// fetch, then in-page ranking and highlighting.
pub struct SearchEngine {
   store:     Arc<dyn Store>,
   labels:    Arc<dyn LabelClassifier>,
   highlight: bool,
}

impl SearchEngine {
   pub fn new(store: Arc<dyn Store>, labels: Arc<dyn LabelClassifier>) -> Self {
      Self { store, labels, highlight: true }
   }

   /// Enables or disables title highlighting for text queries.
   pub fn with_highlight(mut self, enabled: bool) -> Self {
      self.highlight = enabled;
      self
   }

   /// Rejects invalid queries and unknown labels before the store is touched.
   fn plan(&self, query: &SearchQuery) -> Result<predicate::QueryPlan> {
      let errors = query.validate();
      if !errors.is_empty() {
         return Err(Error::Validation(errors));
      }
      if !query.labels().is_empty() {
         query.check_labels(&self.labels.known_labels())?;
      }

      let plan = predicate::build(query);
      debug!(predicates = plan.filter.predicates().len(), order = ?plan.order, "query plan");
      Ok(plan)
   }

   pub fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
      let plan = self.plan(query)?;

      let total = self.store.count(&plan.filter)?;
      let window = paginate::paginate(total, query.page(), query.page_size());
      debug!(total, page = window.page, offset = window.offset, len = window.len, "search");

      if window.is_empty() {
         return Ok(SearchResult::empty(
            window.total_results,
            window.page,
            window.page_size,
            window.total_pages,
         ));
      }

      let posts = self
         .store
         .fetch(&plan.filter, plan.order, window.offset, window.len)?;
      let mut hits: Vec<SearchHit> = posts.into_iter().map(SearchHit::new).collect();

      let words = query.text_words();
      if plan.order.is_relevance() {
         ranking::rank_by_relevance(&mut hits, &words);
      }
      if self.highlight && query.has_text_search() {
         for hit in &mut hits {
            let spans = highlight::find_spans(&hit.post.title, &words);
            hit.highlighted_title = Some(highlight::mark(&hit.post.title, &spans));
            hit.highlights = spans;
         }
      }

      Ok(SearchResult {
         hits,
         total_results: window.total_results,
         page: window.page,
         page_size: window.page_size,
         total_pages: window.total_pages,
      })
   }

   /// Match count for `query`, without fetching any post.
   pub fn count_results(&self, query: &SearchQuery) -> Result<u64> {
      let plan = self.plan(query)?;
      Ok(self.store.count(&plan.filter)?)
   }
}
