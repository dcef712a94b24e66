use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use tracing::{info, warn};

use super::open_store;
use crate::{
   config::Config,
   labels::{KeywordClassifier, LabelClassifier},
   store::sqlite::Upsert,
   types::{ApiItem, Post},
};

pub fn execute(file: &Path, config: &Config) -> Result<()> {
   let raw = std::fs::read_to_string(file)
      .with_context(|| format!("failed to read {}", file.display()))?;
   let items: Vec<ApiItem> = serde_json::from_str(&raw)
      .with_context(|| format!("{} is not a JSON array of items", file.display()))?;

   let store = open_store(config)?;
   let classifier = KeywordClassifier::default();
   let fetched_at = chrono::Utc::now().timestamp();

   let (mut inserted, mut updated, mut skipped) = (0usize, 0usize, 0usize);
   for item in items {
      let mut post = Post::from_api_item(item, fetched_at);
      if !post.is_valid() {
         warn!(id = post.id, "skipping item with missing or invalid fields");
         skipped += 1;
         continue;
      }

      post.labels = classifier.classify(&post.title);
      match store
         .upsert_post(&post)
         .with_context(|| format!("failed to store post {}", post.id))?
      {
         Upsert::Inserted => inserted += 1,
         Upsert::Updated => updated += 1,
      }
   }

   info!(inserted, updated, skipped, "import finished");
   println!("{}", style(format!("Imported {}", file.display())).bold());
   println!("   {} {inserted}", style("inserted:").green());
   println!("   {} {updated}", style("updated: ").cyan());
   println!("   {} {skipped}", style("skipped: ").yellow());

   Ok(())
}
