use std::{fmt, ops::Range, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
   Story,
   Job,
   Ask,
   Poll,
   Other,
}

impl Category {
   pub const ALL: [Self; 5] = [Self::Story, Self::Job, Self::Ask, Self::Poll, Self::Other];

   /// Maps an item type reported by the API onto a category. Unknown types
   /// land in [`Category::Other`].
   pub fn from_kind(kind: &str) -> Self {
      match kind {
         "story" => Self::Story,
         "job" => Self::Job,
         "ask" => Self::Ask,
         "poll" => Self::Poll,
         _ => Self::Other,
      }
   }

   pub const fn as_str(self) -> &'static str {
      match self {
         Self::Story => "story",
         Self::Job => "job",
         Self::Ask => "ask",
         Self::Poll => "poll",
         Self::Other => "other",
      }
   }
}

impl fmt::Display for Category {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.as_str())
   }
}

impl FromStr for Category {
   type Err = String;

   fn from_str(s: &str) -> Result<Self, Self::Err> {
      Self::ALL
         .into_iter()
         .find(|c| c.as_str() == s)
         .ok_or_else(|| format!("unknown category '{s}'"))
   }
}

/// A single indexed post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
   pub id:         i64,
   pub title:      String,
   pub author:     String,
   pub score:      i64,
   pub url:        Option<String>,
   /// Seconds since the Unix epoch.
   pub created_at: i64,
   #[serde(rename = "type")]
   pub kind:       String,
   pub category:   Category,
   pub fetched_at: i64,
   #[serde(default)]
   pub labels:     Vec<String>,
}

impl Post {
   pub fn is_valid(&self) -> bool {
      self.id > 0
         && !self.title.is_empty()
         && !self.author.is_empty()
         && self.score >= 0
         && !self.kind.is_empty()
         && self.created_at > 0
         && self.fetched_at > 0
   }

   /// Builds a post from a raw API item. Missing fields fall back to empty
   /// values, so the result must still pass [`Post::is_valid`] before storage.
   pub fn from_api_item(item: ApiItem, fetched_at: i64) -> Self {
      let kind = item.kind.unwrap_or_default();
      Self {
         id: item.id,
         title: item.title.unwrap_or_default(),
         author: item.by.unwrap_or_default(),
         score: item.score.unwrap_or(0),
         url: item.url,
         created_at: item.time.unwrap_or(0),
         category: Category::from_kind(&kind),
         kind,
         fetched_at,
         labels: Vec::new(),
      }
   }

   pub fn has_label(&self, label: &str) -> bool {
      self.labels.iter().any(|l| l == label)
   }
}

/// Item shape returned by the Hacker News item endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiItem {
   pub id:    i64,
   pub title: Option<String>,
   pub by:    Option<String>,
   pub score: Option<i64>,
   pub url:   Option<String>,
   pub time:  Option<i64>,
   #[serde(rename = "type")]
   pub kind:  Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
   #[default]
   Relevance,
   DateDesc,
   DateAsc,
   ScoreDesc,
   ScoreAsc,
}

impl OrderBy {
   pub const ALL: [Self; 5] =
      [Self::Relevance, Self::DateDesc, Self::DateAsc, Self::ScoreDesc, Self::ScoreAsc];

   pub const fn as_str(self) -> &'static str {
      match self {
         Self::Relevance => "relevance",
         Self::DateDesc => "date_desc",
         Self::DateAsc => "date_asc",
         Self::ScoreDesc => "score_desc",
         Self::ScoreAsc => "score_asc",
      }
   }
}

impl fmt::Display for OrderBy {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.as_str())
   }
}

impl FromStr for OrderBy {
   type Err = String;

   fn from_str(s: &str) -> Result<Self, Self::Err> {
      Self::ALL
         .into_iter()
         .find(|o| o.as_str() == s)
         .ok_or_else(|| {
            let valid: Vec<_> = Self::ALL.iter().map(|o| o.as_str()).collect();
            format!("invalid order_by '{s}', expected one of: {}", valid.join(", "))
         })
   }
}

/// One record of a result page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
   pub post:              Post,
   /// Present when the page was ordered by relevance.
   #[serde(skip_serializing_if = "Option::is_none")]
   pub relevance:         Option<f64>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub highlighted_title: Option<String>,
   /// Byte ranges of `post.title` covered by the highlight markers.
   #[serde(skip)]
   pub highlights:        Vec<Range<usize>>,
}

impl SearchHit {
   pub fn new(post: Post) -> Self {
      Self { post, relevance: None, highlighted_title: None, highlights: Vec::new() }
   }

   /// Title to display: the highlighted form when one was produced.
   pub fn display_title(&self) -> &str {
      self
         .highlighted_title
         .as_deref()
         .unwrap_or(&self.post.title)
   }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
   pub hits:          Vec<SearchHit>,
   /// Match count before pagination.
   pub total_results: u64,
   pub page:          u32,
   pub page_size:     u32,
   pub total_pages:   u64,
}

impl SearchResult {
   pub fn empty(total_results: u64, page: u32, page_size: u32, total_pages: u64) -> Self {
      Self { hits: Vec::new(), total_results, page, page_size, total_pages }
   }

   pub fn posts(&self) -> impl Iterator<Item = &Post> {
      self.hits.iter().map(|h| &h.post)
   }

   pub fn is_empty(&self) -> bool {
      self.hits.is_empty()
   }

   pub const fn has_next_page(&self) -> bool {
      (self.page as u64) < self.total_pages
   }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCount {
   pub category: Category,
   pub count:    u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelCount {
   pub label: String,
   pub count: u64,
}
