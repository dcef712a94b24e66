use std::path::{Path, PathBuf};

use directories::BaseDirs;
use figment::{
   Figment,
   providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

pub const HIGHLIGHT_OPEN: &str = "**";
pub const HIGHLIGHT_CLOSE: &str = "**";

pub const MAX_LABELS_PER_POST: usize = 5;
pub const MAX_SUGGESTIONS: usize = 5;

pub const ENV_PREFIX: &str = "HNSEARCH_";

pub fn data_dir() -> PathBuf {
   BaseDirs::new().map_or_else(
      || PathBuf::from(".hnsearch"),
      |dirs| dirs.home_dir().join(".hnsearch"),
   )
}

pub fn config_path() -> PathBuf {
   data_dir().join("config.toml")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
   pub db_path:   PathBuf,
   pub page_size: u32,
   pub highlight: bool,
   pub log_level: String,
}

impl Default for Config {
   fn default() -> Self {
      Self {
         db_path:   data_dir().join("posts.db"),
         page_size: DEFAULT_PAGE_SIZE,
         highlight: true,
         log_level: "info".to_string(),
      }
   }
}

impl Config {
   /// Loads defaults, then `~/.hnsearch/config.toml`, then `HNSEARCH_*`
   /// environment variables.
   pub fn load() -> Result<Self> {
      Self::load_from(&config_path())
   }

   pub fn load_from(path: &Path) -> Result<Self> {
      let config: Self = Figment::from(Serialized::defaults(Self::default()))
         .merge(Toml::file(path))
         .merge(Env::prefixed(ENV_PREFIX))
         .extract()?;
      config.validate()?;
      Ok(config)
   }

   fn validate(&self) -> Result<()> {
      if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
         return Err(Error::InvalidConfig(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
            self.page_size
         )));
      }
      Ok(())
   }

   pub fn to_toml(&self) -> Result<String> {
      Ok(toml::to_string_pretty(self)?)
   }
}
