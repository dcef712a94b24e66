use anyhow::Result;
use console::style;

use crate::config::{Config, config_path};

pub fn execute(config: &Config) -> Result<()> {
   println!("{}", style(format!("# {}", config_path().display())).dim());
   print!("{}", config.to_toml()?);
   Ok(())
}
