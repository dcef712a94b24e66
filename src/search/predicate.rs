//! Translation of a validated [`SearchQuery`] into a predicate tree and an
//! ordering directive.
//!
//! Predicates in a [`Filter`] are combined with AND. Within
//! [`Predicate::LabelAnyOf`] labels are combined with OR, and within
//! [`Predicate::TextMatch`] every word must match. Store adapters translate
//! the tree into their native query form.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;
use smallvec::SmallVec;

use crate::{
   query::SearchQuery,
   types::{OrderBy, Post},
};

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
   /// Every word occurs in the title, case-insensitively. Words are stored
   /// lowercased.
   TextMatch { words: Vec<String> },
   /// Lowercased substring of the author.
   AuthorMatch { term: String },
   /// The post carries at least one of these labels.
   LabelAnyOf { labels: Vec<String> },
   ScoreRange { min: Option<i64>, max: Option<i64> },
   /// Inclusive bounds on `created_at`, in seconds.
   DateRange { start: Option<i64>, end: Option<i64> },
}

impl Predicate {
   pub fn matches(&self, post: &Post) -> bool {
      match self {
         Self::TextMatch { words } => {
            let title = post.title.to_lowercase();
            words.iter().all(|w| title.contains(w.as_str()))
         },
         Self::AuthorMatch { term } => post.author.to_lowercase().contains(term.as_str()),
         Self::LabelAnyOf { labels } => labels.iter().any(|l| post.has_label(l)),
         Self::ScoreRange { min, max } => within(post.score, *min, *max),
         Self::DateRange { start, end } => within(post.created_at, *start, *end),
      }
   }
}

fn within(value: i64, min: Option<i64>, max: Option<i64>) -> bool {
   min.is_none_or(|m| value >= m) && max.is_none_or(|m| value <= m)
}

/// Conjunction of predicates, at most one per class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filter {
   predicates: SmallVec<[Predicate; 5]>,
}

impl Filter {
   pub fn predicates(&self) -> &[Predicate] {
      &self.predicates
   }

   pub fn is_empty(&self) -> bool {
      self.predicates.is_empty()
   }

   pub fn matches(&self, post: &Post) -> bool {
      self.predicates.iter().all(|p| p.matches(post))
   }

   fn push(&mut self, predicate: Predicate) {
      self.predicates.push(predicate);
   }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
   CreatedAt,
   Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
   Asc,
   Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirective {
   /// Order by a column. Ties break on `id` in the same direction.
   Column { field: SortField, direction: Direction },
   /// Final order comes from relevance ranking of the fetched page. The store
   /// fetches in ranking tie-break order (`created_at DESC, id DESC`).
   Relevance,
}

impl OrderDirective {
   pub const fn from_order_by(order_by: OrderBy, has_text: bool) -> Self {
      let (field, direction) = match order_by {
         OrderBy::Relevance if has_text => return Self::Relevance,
         OrderBy::Relevance | OrderBy::DateDesc => (SortField::CreatedAt, Direction::Desc),
         OrderBy::DateAsc => (SortField::CreatedAt, Direction::Asc),
         OrderBy::ScoreDesc => (SortField::Score, Direction::Desc),
         OrderBy::ScoreAsc => (SortField::Score, Direction::Asc),
      };
      Self::Column { field, direction }
   }

   /// The column order a store applies when fetching.
   pub const fn fetch_order(self) -> (SortField, Direction) {
      match self {
         Self::Column { field, direction } => (field, direction),
         Self::Relevance => (SortField::CreatedAt, Direction::Desc),
      }
   }

   pub const fn is_relevance(self) -> bool {
      matches!(self, Self::Relevance)
   }

   /// Total order over posts matching [`OrderDirective::fetch_order`].
   pub fn compare(self, a: &Post, b: &Post) -> Ordering {
      let (field, direction) = self.fetch_order();
      let key = |p: &Post| match field {
         SortField::CreatedAt => (p.created_at, p.id),
         SortField::Score => (p.score, p.id),
      };
      match direction {
         Direction::Asc => key(a).cmp(&key(b)),
         Direction::Desc => key(b).cmp(&key(a)),
      }
   }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
   pub filter: Filter,
   pub order:  OrderDirective,
}

/// Builds the predicate tree and order directive for a query. Deterministic:
/// predicate order is always text, author, labels, score, date.
pub fn build(query: &SearchQuery) -> QueryPlan {
   let mut filter = Filter::default();

   let words: Vec<String> = query
      .text_words()
      .into_iter()
      .map(str::to_lowercase)
      .collect();
   if !words.is_empty() {
      filter.push(Predicate::TextMatch { words });
   }

   if let Some(author) = query.author() {
      filter.push(Predicate::AuthorMatch { term: author.to_lowercase() });
   }

   if !query.labels().is_empty() {
      filter.push(Predicate::LabelAnyOf { labels: query.labels().to_vec() });
   }

   if query.min_score().is_some() || query.max_score().is_some() {
      filter.push(Predicate::ScoreRange { min: query.min_score(), max: query.max_score() });
   }

   if query.start_date().is_some() || query.end_date().is_some() {
      filter.push(Predicate::DateRange {
         start: query.start_date().map(start_of_day),
         end:   query.end_date().map(end_of_day),
      });
   }

   let order = OrderDirective::from_order_by(query.order_by(), query.has_text_search());
   QueryPlan { filter, order }
}

/// First second of `date`, UTC.
pub fn start_of_day(date: NaiveDate) -> i64 {
   date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

/// Last whole second of `date`, UTC.
pub fn end_of_day(date: NaiveDate) -> i64 {
   start_of_day(date) + SECONDS_PER_DAY - 1
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::types::Category;

   fn post(id: i64, title: &str, author: &str, score: i64, created_at: i64) -> Post {
      Post {
         id,
         title: title.into(),
         author: author.into(),
         score,
         url: None,
         created_at,
         kind: "story".into(),
         category: Category::Story,
         fetched_at: created_at,
         labels: vec![],
      }
   }

   fn date(y: i32, m: u32, d: u32) -> NaiveDate {
      NaiveDate::from_ymd_opt(y, m, d).unwrap()
   }

   #[test]
   fn builds_every_class_in_fixed_order() {
      let query = SearchQuery::builder()
         .end_date(date(2024, 1, 2))
         .min_score(10)
         .label("Rust")
         .author("PG")
         .text("Rust  Async")
         .build()
         .unwrap();

      let plan = build(&query);
      assert_eq!(plan.filter.predicates(), &[
         Predicate::TextMatch { words: vec!["rust".into(), "async".into()] },
         Predicate::AuthorMatch { term: "pg".into() },
         Predicate::LabelAnyOf { labels: vec!["Rust".into()] },
         Predicate::ScoreRange { min: Some(10), max: None },
         Predicate::DateRange { start: None, end: Some(1_704_239_999) },
      ]);
      assert_eq!(plan.order, OrderDirective::Relevance);
   }

   #[test]
   fn day_bounds_are_inclusive_utc() {
      assert_eq!(start_of_day(date(2024, 1, 1)), 1_704_067_200);
      assert_eq!(end_of_day(date(2024, 1, 1)), 1_704_153_599);
   }

   #[test]
   fn order_directive_defaults() {
      assert_eq!(
         OrderDirective::from_order_by(OrderBy::Relevance, false),
         OrderDirective::Column { field: SortField::CreatedAt, direction: Direction::Desc }
      );
      assert_eq!(OrderDirective::from_order_by(OrderBy::Relevance, true), OrderDirective::Relevance);
      assert_eq!(
         OrderDirective::from_order_by(OrderBy::ScoreAsc, true),
         OrderDirective::Column { field: SortField::Score, direction: Direction::Asc }
      );
   }

   #[test]
   fn text_requires_every_word_in_any_order() {
      let predicate = Predicate::TextMatch { words: vec!["async".into(), "rust".into()] };
      assert!(predicate.matches(&post(1, "Rust gets ASYNC closures", "a", 1, 1)));
      assert!(!predicate.matches(&post(2, "Rust 2024 edition", "a", 1, 1)));
   }

   #[test]
   fn author_is_case_insensitive_substring() {
      let predicate = Predicate::AuthorMatch { term: "dang".into() };
      assert!(predicate.matches(&post(1, "t", "Dang", 1, 1)));
      assert!(predicate.matches(&post(1, "t", "xdangerx", 1, 1)));
      assert!(!predicate.matches(&post(1, "t", "pg", 1, 1)));
   }

   #[test]
   fn labels_are_any_of() {
      let predicate = Predicate::LabelAnyOf { labels: vec!["Rust".into(), "Go".into()] };
      let mut rust = post(1, "t", "a", 1, 1);
      rust.labels = vec!["Rust".into(), "Tools".into()];
      let mut other = post(2, "t", "a", 1, 1);
      other.labels = vec!["Python".into()];
      assert!(predicate.matches(&rust));
      assert!(!predicate.matches(&other));
   }

   #[test]
   fn ranges_are_inclusive() {
      let score = Predicate::ScoreRange { min: Some(10), max: Some(20) };
      assert!(score.matches(&post(1, "t", "a", 10, 1)));
      assert!(score.matches(&post(1, "t", "a", 20, 1)));
      assert!(!score.matches(&post(1, "t", "a", 21, 1)));

      let dates = Predicate::DateRange {
         start: Some(start_of_day(date(2024, 6, 1))),
         end:   Some(end_of_day(date(2024, 6, 1))),
      };
      assert!(dates.matches(&post(1, "t", "a", 1, 1_717_200_000)));
      assert!(dates.matches(&post(1, "t", "a", 1, 1_717_286_399)));
      assert!(!dates.matches(&post(1, "t", "a", 1, 1_717_286_400)));
   }

   #[test]
   fn compare_breaks_ties_on_id() {
      let a = post(1, "t", "a", 5, 100);
      let b = post(2, "t", "a", 5, 100);
      let newest = OrderDirective::Column { field: SortField::CreatedAt, direction: Direction::Desc };
      let lowest = OrderDirective::Column { field: SortField::Score, direction: Direction::Asc };

      assert_eq!(newest.compare(&a, &b), Ordering::Greater);
      assert_eq!(lowest.compare(&a, &b), Ordering::Less);
      assert_eq!(OrderDirective::Relevance.compare(&a, &b), Ordering::Greater);
   }
}
