use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate};
use clap::Args;
use console::style;

use super::open_store;
use crate::{
   Error,
   config::Config,
   labels::KeywordClassifier,
   query::SearchQuery,
   search::SearchEngine,
   types::{SearchHit, SearchResult},
};

#[derive(Debug, Args)]
pub struct SearchArgs {
   /// Words that must all appear in the title
   text: Option<String>,

   /// Author name, matched as a case-insensitive substring
   #[arg(long)]
   author: Option<String>,

   /// Only posts carrying this label (repeat for any-of)
   #[arg(long = "label", short = 'l')]
   labels: Vec<String>,

   #[arg(long)]
   min_score: Option<i64>,

   #[arg(long)]
   max_score: Option<i64>,

   /// First day to include (YYYY-MM-DD)
   #[arg(long)]
   since: Option<NaiveDate>,

   /// Last day to include (YYYY-MM-DD)
   #[arg(long)]
   until: Option<NaiveDate>,

   /// relevance, date_desc, date_asc, score_desc or score_asc
   #[arg(long, default_value = "relevance")]
   order: String,

   #[arg(long, default_value_t = 1)]
   page: u32,

   /// Results per page (defaults to the configured page size)
   #[arg(long)]
   page_size: Option<u32>,

   /// Print only the number of matches
   #[arg(long)]
   count: bool,

   #[arg(long)]
   json: bool,

   #[arg(long)]
   no_highlight: bool,
}

impl SearchArgs {
   fn to_query(&self, config: &Config) -> crate::Result<SearchQuery> {
      let mut builder = SearchQuery::builder()
         .labels(self.labels.iter().cloned())
         .order_by_name(&self.order)
         .page(self.page)
         .page_size(self.page_size.unwrap_or(config.page_size));

      if let Some(text) = &self.text {
         builder = builder.text(text.as_str());
      }
      if let Some(author) = &self.author {
         builder = builder.author(author.as_str());
      }
      if let Some(min) = self.min_score {
         builder = builder.min_score(min);
      }
      if let Some(max) = self.max_score {
         builder = builder.max_score(max);
      }
      if let Some(since) = self.since {
         builder = builder.start_date(since);
      }
      if let Some(until) = self.until {
         builder = builder.end_date(until);
      }

      builder.build()
   }
}

pub fn execute(args: SearchArgs, config: &Config) -> Result<()> {
   let query = match args.to_query(config) {
      Ok(query) => query,
      Err(Error::Validation(errors)) => {
         eprintln!("{}", style("Invalid search query:").red().bold());
         for error in &errors {
            eprintln!("  {} {error}", style("-").red());
         }
         bail!("search aborted with {} validation error(s)", errors.len());
      },
      Err(err) => return Err(err.into()),
   };

   let store = open_store(config)?;
   let engine = SearchEngine::new(Arc::new(store), Arc::new(KeywordClassifier::default()))
      .with_highlight(config.highlight && !args.no_highlight);

   if args.count {
      let count = engine.count_results(&query)?;
      if args.json {
         println!("{}", serde_json::json!({ "total_results": count }));
      } else {
         println!("{count}");
      }
      return Ok(());
   }

   let result = engine.search(&query)?;
   if args.json {
      println!("{}", serde_json::to_string_pretty(&result)?);
      return Ok(());
   }

   print_result(&result);
   Ok(())
}

fn print_result(result: &SearchResult) {
   if result.total_results == 0 {
      println!("{}", style("No posts matched").dim());
      return;
   }

   println!(
      "{}",
      style(format!(
         "Found {} posts (page {} of {})",
         result.total_results, result.page, result.total_pages
      ))
      .bold()
   );
   println!();

   if result.is_empty() {
      println!("{}", style("This page is past the last page of results").dim());
      return;
   }

   let first = u64::from(result.page - 1) * u64::from(result.page_size);
   for (i, hit) in result.hits.iter().enumerate() {
      print_hit(first + i as u64 + 1, hit);
   }

   if result.has_next_page() {
      println!("{}", style(format!("More results: --page {}", result.page + 1)).dim());
   }
}

fn print_hit(position: u64, hit: &SearchHit) {
   let post = &hit.post;
   println!("{} {}", style(format!("{position}.")).bold().cyan(), render_title(hit));

   let posted = DateTime::from_timestamp(post.created_at, 0)
      .map_or_else(|| post.created_at.to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string());
   print!(
      "   {} {} {}",
      style(format!("{} points", post.score)).green(),
      style(format!("by {}", post.author)),
      style(posted).dim()
   );
   if let Some(relevance) = hit.relevance {
      print!(" {}", style(format!("(relevance: {relevance:.3})")).dim());
   }
   println!();

   if !post.labels.is_empty() {
      println!("   {}", style(format!("[{}]", post.labels.join(", "))).yellow());
   }
   if let Some(url) = &post.url {
      println!("   {}", style(url).dim().underlined());
   }
   println!();
}

/// Title with highlighted spans in terminal emphasis. Marker-like text in
/// the title itself is printed as is.
fn render_title(hit: &SearchHit) -> String {
   let title = &hit.post.title;
   let mut out = String::with_capacity(title.len());
   let mut cursor = 0;
   for span in &hit.highlights {
      out.push_str(&title[cursor..span.start]);
      out.push_str(&style(&title[span.clone()]).bold().magenta().to_string());
      cursor = span.end;
   }
   out.push_str(&title[cursor..]);
   out
}
