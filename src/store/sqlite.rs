//! SQLite-backed post store. Owns the schema and the write path used by
//! imports; searches go through the [`Store`] read interface.

use std::{
   collections::BTreeMap,
   path::{Path, PathBuf},
};

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, functions::FunctionFlags, params};
use tracing::{debug, info};

use super::Store;
use crate::{
   error::StoreError,
   search::predicate::{Direction, Filter, OrderDirective, Predicate, SortField},
   types::{Category, CategoryCount, LabelCount, Post},
};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS posts (
   id         INTEGER PRIMARY KEY,
   title      TEXT NOT NULL,
   author     TEXT NOT NULL,
   score      INTEGER NOT NULL DEFAULT 0,
   url        TEXT,
   created_at INTEGER NOT NULL,
   type       TEXT NOT NULL,
   category   TEXT NOT NULL,
   fetched_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_posts_type ON posts(type);
CREATE INDEX IF NOT EXISTS idx_posts_category ON posts(category);
CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_posts_title_lower ON posts(LOWER(title));
CREATE INDEX IF NOT EXISTS idx_posts_author_lower ON posts(LOWER(author));
CREATE INDEX IF NOT EXISTS idx_posts_score ON posts(score);
CREATE INDEX IF NOT EXISTS idx_posts_score_created ON posts(score DESC, created_at DESC);

CREATE TABLE IF NOT EXISTS post_labels (
   post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
   label   TEXT NOT NULL,
   PRIMARY KEY (post_id, label)
);
CREATE INDEX IF NOT EXISTS idx_post_labels_label ON post_labels(label);
";

const SELECT_POSTS: &str = "SELECT p.id, p.title, p.author, p.score, p.url, p.created_at, p.type, \
                            p.category, p.fetched_at, (SELECT GROUP_CONCAT(pl.label, char(31)) \
                            FROM post_labels pl WHERE pl.post_id = p.id) FROM posts p";

const LABEL_SEPARATOR: char = '\u{1f}';

/// Unicode-aware replacement for SQLite's ASCII-only `LOWER`.
const FOLD_FN: &str = "hn_fold";

/// Whether [`SqliteStore::upsert_post`] created or replaced the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
   Inserted,
   Updated,
}

pub struct SqliteStore {
   conn: Mutex<Connection>,
   path: Option<PathBuf>,
}

impl SqliteStore {
   /// Opens (creating if needed) the database at `path`, along with any
   /// missing parent directories.
   pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
      let path = path.as_ref();
      if let Some(parent) = path.parent()
         && !parent.as_os_str().is_empty()
      {
         std::fs::create_dir_all(parent)?;
      }

      let conn = Connection::open(path)?;
      Self::init(&conn)?;
      info!("opened post store at {}", path.display());

      Ok(Self { conn: Mutex::new(conn), path: Some(path.to_path_buf()) })
   }

   pub fn open_in_memory() -> Result<Self, StoreError> {
      let conn = Connection::open_in_memory()?;
      Self::init(&conn)?;
      Ok(Self { conn: Mutex::new(conn), path: None })
   }

   fn init(conn: &Connection) -> Result<(), StoreError> {
      conn.pragma_update(None, "foreign_keys", true)?;
      conn.create_scalar_function(
         FOLD_FN,
         1,
         FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
         |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
      )?;
      conn.execute_batch(SCHEMA)?;
      Ok(())
   }

   /// Database file, `None` for in-memory stores.
   pub fn path(&self) -> Option<&Path> {
      self.path.as_deref()
   }

   /// Inserts or replaces a post together with its labels.
   pub fn upsert_post(&self, post: &Post) -> Result<Upsert, StoreError> {
      let mut conn = self.conn.lock();
      let tx = conn.transaction()?;

      let existed: bool =
         tx.query_row("SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)", [post.id], |row| {
            row.get(0)
         })?;

      tx.execute(
         "INSERT INTO posts (id, title, author, score, url, created_at, type, category, fetched_at)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
          ON CONFLICT(id) DO UPDATE SET
             title = excluded.title,
             author = excluded.author,
             score = excluded.score,
             url = excluded.url,
             created_at = excluded.created_at,
             type = excluded.type,
             category = excluded.category,
             fetched_at = excluded.fetched_at",
         params![
            post.id,
            post.title,
            post.author,
            post.score,
            post.url,
            post.created_at,
            post.kind,
            post.category.as_str(),
            post.fetched_at,
         ],
      )?;

      tx.execute("DELETE FROM post_labels WHERE post_id = ?1", [post.id])?;
      {
         let mut insert =
            tx.prepare("INSERT OR IGNORE INTO post_labels (post_id, label) VALUES (?1, ?2)")?;
         for label in &post.labels {
            insert.execute(params![post.id, label])?;
         }
      }
      tx.commit()?;

      Ok(if existed { Upsert::Updated } else { Upsert::Inserted })
   }

   pub fn get_post(&self, id: i64) -> Result<Option<Post>, StoreError> {
      let conn = self.conn.lock();
      let raw = conn
         .query_row(&format!("{SELECT_POSTS} WHERE p.id = ?1"), [id], RawPost::from_row)
         .optional()?;
      raw.map(RawPost::into_post).transpose()
   }

   pub fn post_exists(&self, id: i64) -> Result<bool, StoreError> {
      let conn = self.conn.lock();
      let exists =
         conn.query_row("SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)", [id], |row| {
            row.get(0)
         })?;
      Ok(exists)
   }

   pub fn post_count(&self) -> Result<u64, StoreError> {
      let conn = self.conn.lock();
      let count: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
      Ok(count.max(0) as u64)
   }

   /// Posts per category, most populated first.
   pub fn category_counts(&self) -> Result<Vec<CategoryCount>, StoreError> {
      let conn = self.conn.lock();
      let mut stmt = conn.prepare("SELECT category, COUNT(*) FROM posts GROUP BY category")?;
      let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

      let mut counts: BTreeMap<Category, u64> = BTreeMap::new();
      for row in rows {
         let (category, count) = row?;
         *counts.entry(Category::from_kind(&category)).or_default() += count.max(0) as u64;
      }

      let mut counts: Vec<CategoryCount> = counts
         .into_iter()
         .map(|(category, count)| CategoryCount { category, count })
         .collect();
      counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));
      Ok(counts)
   }

   /// Posts per stored label, most used first.
   pub fn label_counts(&self) -> Result<Vec<LabelCount>, StoreError> {
      let conn = self.conn.lock();
      let mut stmt = conn.prepare(
         "SELECT label, COUNT(*) FROM post_labels GROUP BY label ORDER BY COUNT(*) DESC, label",
      )?;
      let counts = stmt
         .query_map([], |row| {
            Ok(LabelCount { label: row.get(0)?, count: row.get::<_, i64>(1)?.max(0) as u64 })
         })?
         .collect::<Result<Vec<_>, _>>()?;
      Ok(counts)
   }
}

impl Store for SqliteStore {
   fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
      let clause = WhereClause::from_filter(filter);
      let sql = format!("SELECT COUNT(*) FROM posts p{}", clause.sql);
      debug!(%sql, "count");

      let conn = self.conn.lock();
      let count: i64 = conn.query_row(&sql, clause.params().as_slice(), |row| row.get(0))?;
      Ok(count.max(0) as u64)
   }

   fn fetch(
      &self,
      filter: &Filter,
      order: OrderDirective,
      offset: u64,
      limit: u64,
   ) -> Result<Vec<Post>, StoreError> {
      let mut clause = WhereClause::from_filter(filter);
      let (field, direction) = order.fetch_order();
      let column = match field {
         SortField::CreatedAt => "p.created_at",
         SortField::Score => "p.score",
      };
      let dir = match direction {
         Direction::Asc => "ASC",
         Direction::Desc => "DESC",
      };
      let limit_at = clause.bind(i64::try_from(limit).unwrap_or(i64::MAX));
      let offset_at = clause.bind(i64::try_from(offset).unwrap_or(i64::MAX));

      let sql = format!(
         "{SELECT_POSTS}{} ORDER BY {column} {dir}, p.id {dir} LIMIT ?{limit_at} OFFSET ?{offset_at}",
         clause.sql
      );
      debug!(%sql, "fetch");

      let conn = self.conn.lock();
      let mut stmt = conn.prepare(&sql)?;
      let raw = stmt
         .query_map(clause.params().as_slice(), RawPost::from_row)?
         .collect::<Result<Vec<_>, _>>()?;
      raw.into_iter().map(RawPost::into_post).collect()
   }
}

/// SQL translation of a [`Filter`]: a ` WHERE ...` fragment (empty when the
/// filter is) and its numbered parameters.
struct WhereClause {
   sql:    String,
   values: Vec<Box<dyn ToSql>>,
}

impl WhereClause {
   fn from_filter(filter: &Filter) -> Self {
      let mut clause = Self { sql: String::new(), values: Vec::new() };
      let mut conditions = Vec::new();

      for predicate in filter.predicates() {
         match predicate {
            Predicate::TextMatch { words } => {
               for word in words {
                  let at = clause.bind(like_pattern(word));
                  conditions.push(format!(r"{FOLD_FN}(p.title) LIKE ?{at} ESCAPE '\'"));
               }
            },
            Predicate::AuthorMatch { term } => {
               let at = clause.bind(like_pattern(term));
               conditions.push(format!(r"{FOLD_FN}(p.author) LIKE ?{at} ESCAPE '\'"));
            },
            Predicate::LabelAnyOf { labels } => {
               let placeholders: Vec<String> = labels
                  .iter()
                  .map(|label| format!("?{}", clause.bind(label.clone())))
                  .collect();
               conditions.push(format!(
                  "EXISTS (SELECT 1 FROM post_labels pl WHERE pl.post_id = p.id AND pl.label IN \
                   ({}))",
                  placeholders.join(", ")
               ));
            },
            Predicate::ScoreRange { min, max } => {
               clause.push_range(&mut conditions, "p.score", *min, *max);
            },
            Predicate::DateRange { start, end } => {
               clause.push_range(&mut conditions, "p.created_at", *start, *end);
            },
         }
      }

      if !conditions.is_empty() {
         clause.sql = format!(" WHERE {}", conditions.join(" AND "));
      }
      clause
   }

   /// Adds a parameter and returns its 1-based position.
   fn bind<T: ToSql + 'static>(&mut self, value: T) -> usize {
      self.values.push(Box::new(value));
      self.values.len()
   }

   fn push_range(
      &mut self,
      conditions: &mut Vec<String>,
      column: &str,
      min: Option<i64>,
      max: Option<i64>,
   ) {
      if let Some(min) = min {
         conditions.push(format!("{column} >= ?{}", self.bind(min)));
      }
      if let Some(max) = max {
         conditions.push(format!("{column} <= ?{}", self.bind(max)));
      }
   }

   fn params(&self) -> Vec<&dyn ToSql> {
      self.values.iter().map(|v| v.as_ref()).collect()
   }
}

/// `%term%` with LIKE wildcards in `term` taken literally.
fn like_pattern(term: &str) -> String {
   let mut pattern = String::with_capacity(term.len() + 2);
   pattern.push('%');
   for c in term.chars() {
      if matches!(c, '%' | '_' | '\\') {
         pattern.push('\\');
      }
      pattern.push(c);
   }
   pattern.push('%');
   pattern
}

/// Row as stored, before domain checks.
struct RawPost {
   id:         i64,
   title:      String,
   author:     String,
   score:      i64,
   url:        Option<String>,
   created_at: i64,
   kind:       String,
   category:   String,
   fetched_at: i64,
   labels:     Option<String>,
}

impl RawPost {
   fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
      Ok(Self {
         id:         row.get(0)?,
         title:      row.get(1)?,
         author:     row.get(2)?,
         score:      row.get(3)?,
         url:        row.get(4)?,
         created_at: row.get(5)?,
         kind:       row.get(6)?,
         category:   row.get(7)?,
         fetched_at: row.get(8)?,
         labels:     row.get(9)?,
      })
   }

   fn into_post(self) -> Result<Post, StoreError> {
      let id = self.id;
      let malformed = move |reason: String| StoreError::Malformed { id, reason };
      if self.id <= 0 {
         return Err(malformed("non-positive id".into()));
      }
      if self.score < 0 {
         return Err(malformed(format!("negative score {}", self.score)));
      }
      let category: Category = self.category.parse().map_err(malformed)?;

      let mut labels: Vec<String> = self
         .labels
         .as_deref()
         .unwrap_or_default()
         .split(LABEL_SEPARATOR)
         .filter(|l| !l.is_empty())
         .map(String::from)
         .collect();
      labels.sort();

      Ok(Post {
         id: self.id,
         title: self.title,
         author: self.author,
         score: self.score,
         url: self.url,
         created_at: self.created_at,
         kind: self.kind,
         category,
         fetched_at: self.fetched_at,
         labels,
      })
   }
}

#[cfg(test)]
mod tests {
   use tempfile::TempDir;

   use super::*;
   use crate::{query::SearchQuery, search::predicate};

   fn post(id: i64, title: &str, author: &str, score: i64, created_at: i64) -> Post {
      Post {
         id,
         title: title.into(),
         author: author.into(),
         score,
         url: Some(format!("https://example.com/{id}")),
         created_at,
         kind: "story".into(),
         category: Category::Story,
         fetched_at: created_at + 1,
         labels: vec![],
      }
   }

   fn ids(posts: &[Post]) -> Vec<i64> {
      posts.iter().map(|p| p.id).collect()
   }

   fn fetch_all(store: &SqliteStore, query: &SearchQuery) -> Vec<Post> {
      let plan = predicate::build(query);
      store.fetch(&plan.filter, plan.order, 0, 100).unwrap()
   }

   #[test]
   fn open_creates_parent_directories() {
      let dir = TempDir::new().unwrap();
      let path = dir.path().join("nested").join("posts.db");

      let store = SqliteStore::open(&path).unwrap();
      assert!(path.exists());
      assert_eq!(store.path(), Some(path.as_path()));

      // reopening keeps the schema and the data
      store.upsert_post(&post(1, "Hello", "pg", 1, 10)).unwrap();
      drop(store);
      let reopened = SqliteStore::open(&path).unwrap();
      assert!(reopened.post_exists(1).unwrap());
   }

   #[test]
   fn upsert_reports_insert_then_update() {
      let store = SqliteStore::open_in_memory().unwrap();
      let mut original = post(7, "Original", "pg", 5, 100);
      original.labels = vec!["Rust".into(), "Tools".into()];

      assert_eq!(store.upsert_post(&original).unwrap(), Upsert::Inserted);

      let mut changed = original.clone();
      changed.title = "Changed".into();
      changed.score = 42;
      changed.labels = vec!["Go".into()];
      assert_eq!(store.upsert_post(&changed).unwrap(), Upsert::Updated);

      let stored = store.get_post(7).unwrap().unwrap();
      assert_eq!(stored, changed);
      assert_eq!(store.post_count().unwrap(), 1);
      assert!(store.get_post(8).unwrap().is_none());
   }

   #[test]
   fn text_and_author_are_case_insensitive() {
      let store = SqliteStore::open_in_memory().unwrap();
      store.upsert_post(&post(1, "Python 3.12 release", "Guido", 150, 100)).unwrap();
      store.upsert_post(&post(2, "Intro to rust", "steve", 200, 200)).unwrap();
      store.upsert_post(&post(3, "PYTHON tips", "guidance", 90, 300)).unwrap();

      let text = SearchQuery::builder().text("pYtHoN").build().unwrap();
      assert_eq!(ids(&fetch_all(&store, &text)), vec![3, 1]);

      let author = SearchQuery::builder().author("GUID").build().unwrap();
      assert_eq!(ids(&fetch_all(&store, &author)), vec![3, 1]);

      let both = SearchQuery::builder()
         .text("tips python")
         .author("guid")
         .build()
         .unwrap();
      assert_eq!(ids(&fetch_all(&store, &both)), vec![3]);
   }

   #[test]
   fn case_folding_covers_non_ascii() {
      let store = SqliteStore::open_in_memory().unwrap();
      store.upsert_post(&post(1, "École de Paris", "Ärger", 1, 100)).unwrap();
      store.upsert_post(&post(2, "ÜBER alles", "ärger", 1, 200)).unwrap();
      store.upsert_post(&post(3, "Uber drivers", "someone", 1, 300)).unwrap();

      for term in ["école", "ÉCOLE", "École"] {
         let query = SearchQuery::builder().text(term).build().unwrap();
         assert_eq!(ids(&fetch_all(&store, &query)), vec![1], "text {term}");
      }
      for term in ["über", "Über", "ÜBER"] {
         let query = SearchQuery::builder().text(term).build().unwrap();
         assert_eq!(ids(&fetch_all(&store, &query)), vec![2], "text {term}");
      }

      let author = SearchQuery::builder().author("ÄRGER").build().unwrap();
      let plan = predicate::build(&author);
      assert_eq!(store.count(&plan.filter).unwrap(), 2);
      assert_eq!(ids(&fetch_all(&store, &author)), vec![2, 1]);
   }

   #[test]
   fn like_wildcards_are_literal() {
      let store = SqliteStore::open_in_memory().unwrap();
      store.upsert_post(&post(1, "100% uptime", "a", 1, 1)).unwrap();
      store.upsert_post(&post(2, "1000 users", "a", 1, 2)).unwrap();
      store.upsert_post(&post(3, "snake_case names", "a", 1, 3)).unwrap();
      store.upsert_post(&post(4, "snakeXcase names", "a", 1, 4)).unwrap();

      let percent = SearchQuery::builder().text("100%").build().unwrap();
      assert_eq!(ids(&fetch_all(&store, &percent)), vec![1]);

      let underscore = SearchQuery::builder().text("snake_case").build().unwrap();
      assert_eq!(ids(&fetch_all(&store, &underscore)), vec![3]);

      assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
   }

   #[test]
   fn labels_match_any_of() {
      let store = SqliteStore::open_in_memory().unwrap();
      let mut rust = post(1, "a", "a", 1, 1);
      rust.labels = vec!["Rust".into()];
      let mut go = post(2, "b", "a", 1, 2);
      go.labels = vec!["Go".into(), "Tools".into()];
      let mut python = post(3, "c", "a", 1, 3);
      python.labels = vec!["Python".into()];
      for p in [&rust, &go, &python] {
         store.upsert_post(p).unwrap();
      }

      let query = SearchQuery::builder().labels(["Rust", "Go"]).build().unwrap();
      let found = fetch_all(&store, &query);
      assert_eq!(ids(&found), vec![2, 1]);
      assert_eq!(found[0].labels, vec!["Go", "Tools"]);
   }

   #[test]
   fn ranges_and_ordering() {
      let store = SqliteStore::open_in_memory().unwrap();
      for (id, score, created_at) in [(1, 10, 500), (2, 20, 400), (3, 20, 300), (4, 30, 200)] {
         store.upsert_post(&post(id, "t", "a", score, created_at)).unwrap();
      }

      let query = SearchQuery::builder()
         .min_score(20)
         .max_score(30)
         .order_by_name("score_desc")
         .build()
         .unwrap();
      // equal scores fall back to id in the same direction
      assert_eq!(ids(&fetch_all(&store, &query)), vec![4, 3, 2]);

      let plan = predicate::build(&query);
      assert_eq!(store.count(&plan.filter).unwrap(), 3);
      assert_eq!(ids(&store.fetch(&plan.filter, plan.order, 1, 1).unwrap()), vec![3]);
   }

   #[test]
   fn empty_filter_counts_everything() {
      let store = SqliteStore::open_in_memory().unwrap();
      store.upsert_post(&post(1, "a", "a", 1, 1)).unwrap();
      store.upsert_post(&post(2, "b", "a", 1, 2)).unwrap();
      assert_eq!(store.count(&Filter::default()).unwrap(), 2);
   }

   #[test]
   fn aggregate_counts() {
      let store = SqliteStore::open_in_memory().unwrap();
      let mut job = post(1, "Hiring", "a", 1, 1);
      job.kind = "job".into();
      job.category = Category::Job;
      job.labels = vec!["Startup".into()];
      let mut story = post(2, "Rust", "a", 1, 2);
      story.labels = vec!["Rust".into(), "Startup".into()];
      store.upsert_post(&job).unwrap();
      store.upsert_post(&story).unwrap();
      store.upsert_post(&post(3, "Other story", "a", 1, 3)).unwrap();

      let categories = store.category_counts().unwrap();
      assert_eq!(categories[0].category, Category::Story);
      assert_eq!(categories[0].count, 2);
      assert_eq!(categories[1].category, Category::Job);

      let labels = store.label_counts().unwrap();
      assert_eq!(labels[0].label, "Startup");
      assert_eq!(labels[0].count, 2);
      assert_eq!(labels[1].label, "Rust");
   }

   #[test]
   fn malformed_rows_surface_as_store_errors() {
      let store = SqliteStore::open_in_memory().unwrap();
      store
         .conn
         .lock()
         .execute(
            "INSERT INTO posts (id, title, author, score, created_at, type, category, fetched_at)
             VALUES (9, 't', 'a', 1, 1, 'story', 'bogus', 1)",
            [],
         )
         .unwrap();

      let err = store.get_post(9).unwrap_err();
      assert!(matches!(err, StoreError::Malformed { id: 9, .. }));
   }
}
