use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
   /// The query broke one or more invariants. Every violated rule is listed.
   #[error("invalid search query: {}", .0.join("; "))]
   Validation(Vec<String>),

   #[error("{}", unknown_label_message(.label, .suggestions))]
   UnknownLabel { label: String, suggestions: Vec<String> },

   #[error("store error: {0}")]
   Store(#[from] StoreError),

   #[error("configuration error: {0}")]
   Config(#[from] Box<figment::Error>),

   /// A configuration value parsed but is out of range.
   #[error("invalid configuration: {0}")]
   InvalidConfig(String),

   #[error("failed to render configuration: {0}")]
   ConfigRender(#[from] toml::ser::Error),

   #[error("io error: {0}")]
   Io(#[from] std::io::Error),

   #[error("json error: {0}")]
   Json(#[from] serde_json::Error),
}

impl From<figment::Error> for Error {
   fn from(err: figment::Error) -> Self {
      Self::Config(Box::new(err))
   }
}

fn unknown_label_message(label: &str, suggestions: &[String]) -> String {
   if suggestions.is_empty() {
      format!("invalid label '{label}'")
   } else {
      format!("invalid label '{label}'. Did you mean: {}?", suggestions.join(", "))
   }
}

/// Failures raised by a [`crate::store::Store`] adapter.
#[derive(Debug, Error)]
pub enum StoreError {
   #[error("sqlite: {0}")]
   Sqlite(#[from] rusqlite::Error),

   #[error("failed to prepare database location: {0}")]
   Io(#[from] std::io::Error),

   #[error("malformed row for post {id}: {reason}")]
   Malformed { id: i64, reason: String },
}

#[cfg(test)]
mod tests {
   use std::error::Error as _;

   use super::*;

   #[test]
   fn validation_lists_every_problem() {
      let err = Error::Validation(vec!["first".into(), "second".into()]);
      assert_eq!(err.to_string(), "invalid search query: first; second");
   }

   #[test]
   fn unknown_label_mentions_suggestions() {
      let err = Error::UnknownLabel {
         label:       "python".into(),
         suggestions: vec!["Python".into()],
      };
      assert_eq!(err.to_string(), "invalid label 'python'. Did you mean: Python?");

      let bare = Error::UnknownLabel { label: "zzz".into(), suggestions: vec![] };
      assert_eq!(bare.to_string(), "invalid label 'zzz'");
   }

   #[test]
   fn store_error_keeps_cause() {
      let err = Error::from(StoreError::Sqlite(rusqlite::Error::InvalidQuery));
      let source = err.source().expect("store error has a source");
      assert!(source.to_string().contains("sqlite"));
   }
}
