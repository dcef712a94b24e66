use anyhow::Result;
use console::style;

use super::open_store;
use crate::{config::Config, types::Category};

pub fn execute(config: &Config) -> Result<()> {
   let store = open_store(config)?;
   let total = store.post_count()?;
   if total == 0 {
      println!("{}", style("No posts indexed yet").dim());
      return Ok(());
   }

   let counts = store.category_counts()?;
   println!("{}", style(format!("{total} posts")).bold());
   println!();

   for category in Category::ALL {
      let count = counts
         .iter()
         .find(|c| c.category == category)
         .map_or(0, |c| c.count);
      let share = count as f64 * 100.0 / total as f64;
      println!("  {:<6} {count:>8} {}", category.as_str(), style(format!("{share:5.1}%")).dim());
   }

   Ok(())
}
