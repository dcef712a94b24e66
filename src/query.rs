//! Immutable, self-validating search request.
//!
//! A [`SearchQuery`] can only be obtained from [`QueryBuilder::build`], which
//! reports every broken rule at once instead of stopping at the first.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
   Error, Result,
   config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MAX_SUGGESTIONS},
   types::OrderBy,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
   text:       Option<String>,
   author:     Option<String>,
   labels:     Vec<String>,
   min_score:  Option<i64>,
   max_score:  Option<i64>,
   start_date: Option<NaiveDate>,
   end_date:   Option<NaiveDate>,
   order_by:   OrderBy,
   page:       u32,
   page_size:  u32,
}

impl SearchQuery {
   pub fn builder() -> QueryBuilder {
      QueryBuilder::default()
   }

   pub fn text(&self) -> Option<&str> {
      self.text.as_deref()
   }

   /// Whitespace-separated words of the text term.
   pub fn text_words(&self) -> Vec<&str> {
      self
         .text
         .as_deref()
         .map(|t| t.split_whitespace().collect())
         .unwrap_or_default()
   }

   pub fn author(&self) -> Option<&str> {
      self.author.as_deref()
   }

   pub fn labels(&self) -> &[String] {
      &self.labels
   }

   pub const fn min_score(&self) -> Option<i64> {
      self.min_score
   }

   pub const fn max_score(&self) -> Option<i64> {
      self.max_score
   }

   pub const fn start_date(&self) -> Option<NaiveDate> {
      self.start_date
   }

   pub const fn end_date(&self) -> Option<NaiveDate> {
      self.end_date
   }

   pub const fn order_by(&self) -> OrderBy {
      self.order_by
   }

   pub const fn page(&self) -> u32 {
      self.page
   }

   pub const fn page_size(&self) -> u32 {
      self.page_size
   }

   pub const fn has_text_search(&self) -> bool {
      self.text.is_some()
   }

   pub fn has_any_criteria(&self) -> bool {
      self.to_builder().has_any_criteria()
   }

   /// Re-checks every invariant. Always empty for a query produced by
   /// [`QueryBuilder::build`].
   pub fn validate(&self) -> Vec<String> {
      self.to_builder().validate()
   }

   /// Same query, different page.
   pub fn with_page(&self, page: u32) -> Result<Self> {
      self.to_builder().page(page).build()
   }

   pub fn to_builder(&self) -> QueryBuilder {
      QueryBuilder {
         text:          self.text.clone(),
         author:        self.author.clone(),
         labels:        self.labels.clone(),
         min_score:     self.min_score,
         max_score:     self.max_score,
         start_date:    self.start_date,
         end_date:      self.end_date,
         order_by:      self.order_by,
         invalid_order: None,
         page:          self.page,
         page_size:     self.page_size,
      }
   }

   /// Rejects the first requested label that the classifier does not know,
   /// with suggestions drawn from `known`.
   pub fn check_labels(&self, known: &BTreeSet<String>) -> Result<()> {
      for label in &self.labels {
         if !known.contains(label) {
            return Err(Error::UnknownLabel {
               label:       label.clone(),
               suggestions: crate::labels::suggest_labels(label, known, MAX_SUGGESTIONS),
            });
         }
      }
      Ok(())
   }
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
   text:          Option<String>,
   author:        Option<String>,
   labels:        Vec<String>,
   min_score:     Option<i64>,
   max_score:     Option<i64>,
   start_date:    Option<NaiveDate>,
   end_date:      Option<NaiveDate>,
   order_by:      OrderBy,
   invalid_order: Option<String>,
   page:          u32,
   page_size:     u32,
}

impl Default for QueryBuilder {
   fn default() -> Self {
      Self {
         text:          None,
         author:        None,
         labels:        Vec::new(),
         min_score:     None,
         max_score:     None,
         start_date:    None,
         end_date:      None,
         order_by:      OrderBy::default(),
         invalid_order: None,
         page:          1,
         page_size:     DEFAULT_PAGE_SIZE,
      }
   }
}

impl QueryBuilder {
   /// The term is trimmed. A blank term is kept so validation can reject it.
   pub fn text(mut self, text: impl Into<String>) -> Self {
      self.text = Some(text.into().trim().to_string());
      self
   }

   /// A blank author is treated as no author filter.
   pub fn author(mut self, author: impl Into<String>) -> Self {
      let author = author.into().trim().to_string();
      self.author = (!author.is_empty()).then_some(author);
      self
   }

   pub fn label(mut self, label: impl Into<String>) -> Self {
      let label = label.into().trim().to_string();
      if !label.is_empty() && !self.labels.contains(&label) {
         self.labels.push(label);
      }
      self
   }

   pub fn labels<I, S>(self, labels: I) -> Self
   where
      I: IntoIterator<Item = S>,
      S: Into<String>,
   {
      labels.into_iter().fold(self, |builder, label| builder.label(label))
   }

   pub fn min_score(mut self, score: i64) -> Self {
      self.min_score = Some(score);
      self
   }

   pub fn max_score(mut self, score: i64) -> Self {
      self.max_score = Some(score);
      self
   }

   pub fn start_date(mut self, date: NaiveDate) -> Self {
      self.start_date = Some(date);
      self
   }

   pub fn end_date(mut self, date: NaiveDate) -> Self {
      self.end_date = Some(date);
      self
   }

   pub fn order_by(mut self, order: OrderBy) -> Self {
      self.order_by = order;
      self.invalid_order = None;
      self
   }

   /// Parses an ordering name. An unknown name surfaces as a validation
   /// error from [`QueryBuilder::build`].
   pub fn order_by_name(self, name: &str) -> Self {
      match name.parse::<OrderBy>() {
         Ok(order) => self.order_by(order),
         Err(_) => Self { invalid_order: Some(name.to_string()), ..self },
      }
   }

   pub fn page(mut self, page: u32) -> Self {
      self.page = page;
      self
   }

   pub fn page_size(mut self, page_size: u32) -> Self {
      self.page_size = page_size;
      self
   }

   pub const fn has_text_search(&self) -> bool {
      self.text.is_some()
   }

   pub fn has_any_criteria(&self) -> bool {
      self.text.is_some()
         || self.author.is_some()
         || !self.labels.is_empty()
         || self.min_score.is_some()
         || self.max_score.is_some()
         || self.start_date.is_some()
         || self.end_date.is_some()
   }

   /// Every violated rule, in a stable order. Never fails.
   pub fn validate(&self) -> Vec<String> {
      let mut errors = Vec::new();

      if !self.has_any_criteria() {
         errors.push(
            "at least one search criterion is required (text, author, labels, score or date \
             range)"
               .to_string(),
         );
      }

      if self.text.as_deref().is_some_and(str::is_empty) {
         errors.push("search text cannot be empty".to_string());
      }

      if let Some(min) = self.min_score
         && min < 0
      {
         errors.push(format!("min_score must be non-negative, got {min}"));
      }
      if let Some(max) = self.max_score
         && max < 0
      {
         errors.push(format!("max_score must be non-negative, got {max}"));
      }
      if let (Some(min), Some(max)) = (self.min_score, self.max_score)
         && min > max
      {
         errors.push(format!("min_score ({min}) cannot exceed max_score ({max})"));
      }

      if let (Some(start), Some(end)) = (self.start_date, self.end_date)
         && start > end
      {
         errors.push(format!("start_date ({start}) cannot be after end_date ({end})"));
      }

      if let Some(name) = &self.invalid_order {
         errors.push(
            name
               .parse::<OrderBy>()
               .err()
               .unwrap_or_else(|| format!("invalid order_by '{name}'")),
         );
      }

      if self.page < 1 {
         errors.push(format!("page must be at least 1, got {}", self.page));
      }
      if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
         errors.push(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
            self.page_size
         ));
      }

      errors
   }

   pub fn build(self) -> Result<SearchQuery> {
      let errors = self.validate();
      if !errors.is_empty() {
         return Err(Error::Validation(errors));
      }

      Ok(SearchQuery {
         text:       self.text,
         author:     self.author,
         labels:     self.labels,
         min_score:  self.min_score,
         max_score:  self.max_score,
         start_date: self.start_date,
         end_date:   self.end_date,
         order_by:   self.order_by,
         page:       self.page,
         page_size:  self.page_size,
      })
   }
}
