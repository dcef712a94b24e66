use std::collections::HashMap;

use anyhow::Result;
use console::style;

use super::open_store;
use crate::{
   config::Config,
   labels::{KeywordClassifier, LabelClassifier},
};

pub fn execute(config: &Config) -> Result<()> {
   let store = open_store(config)?;
   let counts: HashMap<String, u64> = store
      .label_counts()?
      .into_iter()
      .map(|c| (c.label, c.count))
      .collect();

   let known = KeywordClassifier::default().known_labels();
   println!("{}", style(format!("{} labels", known.len())).bold());
   println!();

   for label in &known {
      let count = counts.get(label).copied().unwrap_or(0);
      let keywords = KeywordClassifier::keywords_for(label).join(", ");
      let line = format!("  {label:<14} {count:>6}");
      if count == 0 {
         println!("{} {}", style(line).dim(), style(keywords).dim());
      } else {
         println!("{} {}", line, style(keywords).dim());
      }
   }

   Ok(())
}
