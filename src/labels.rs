//! Topical labels assigned to post titles.

use std::{collections::BTreeSet, sync::Arc};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::MAX_LABELS_PER_POST;

/// Assigns labels to titles and reports the full label vocabulary.
pub trait LabelClassifier: Send + Sync {
   fn classify(&self, title: &str) -> Vec<String>;

   fn known_labels(&self) -> BTreeSet<String>;
}

impl<T: LabelClassifier + ?Sized> LabelClassifier for Arc<T> {
   fn classify(&self, title: &str) -> Vec<String> {
      (**self).classify(title)
   }

   fn known_labels(&self) -> BTreeSet<String> {
      (**self).known_labels()
   }
}

const KEYWORDS: &[(&str, &[&str])] = &[
   ("OpenAI", &["openai", "chatgpt", "gpt", "dall-e", "sora"]),
   ("Claude", &["claude", "anthropic"]),
   ("Google AI", &["gemini", "deepmind", "bard"]),
   ("xAI", &["xai", "grok"]),
   ("Mistral", &["mistral"]),
   ("LLMs", &["llm", "large language model", "foundation model"]),
   ("GenAI", &["genai", "generative ai"]),
   ("Agents", &["agent", "agents", "autonomous agents"]),
   ("RAG", &["rag", "retrieval augmented generation"]),
   ("NLP", &["nlp", "natural language processing"]),
   ("AI", &[
      "artificial intelligence",
      "machine learning",
      "ml",
      "deep learning",
      "neural network",
      "copilot",
      "transformer",
      "diffusion",
      "stable diffusion",
      "midjourney",
      "llama",
   ]),
   ("Python", &["python", "django", "flask", "fastapi", "pytorch", "tensorflow"]),
   ("JavaScript", &[
      "javascript",
      "js",
      "typescript",
      "ts",
      "node",
      "nodejs",
      "react",
      "vue",
      "angular",
      "next.js",
      "svelte",
   ]),
   ("Rust", &["rust", "cargo", "rustc"]),
   ("Go", &["golang", "go"]),
   ("C/C++", &["c++", "cpp", "c", "clang", "gcc"]),
   ("Java", &["java", "jvm", "kotlin", "spring"]),
   ("Web Dev", &[
      "web", "frontend", "backend", "fullstack", "html", "css", "browser", "chrome", "firefox",
      "safari",
   ]),
   ("Cloud", &[
      "aws",
      "azure",
      "gcp",
      "google cloud",
      "cloud",
      "kubernetes",
      "k8s",
      "docker",
      "container",
   ]),
   ("DevOps", &["devops", "ci/cd", "jenkins", "github actions", "gitlab"]),
   ("Database", &[
      "database",
      "sql",
      "postgresql",
      "postgres",
      "mysql",
      "mongodb",
      "redis",
      "elasticsearch",
      "sqlite",
   ]),
   ("Science", &[
      "science", "research", "study", "paper", "arxiv", "nature", "physics", "chemistry", "biology",
   ]),
   ("Space", &["space", "nasa", "spacex", "rocket", "satellite", "mars", "moon", "astronomy"]),
   ("Climate", &["climate", "global warming", "carbon", "renewable", "solar", "wind energy"]),
   ("Security", &[
      "security",
      "vulnerability",
      "exploit",
      "hack",
      "breach",
      "encryption",
      "crypto",
      "password",
   ]),
   ("Privacy", &["privacy", "gdpr", "tracking", "surveillance", "data collection"]),
   ("Blockchain", &[
      "blockchain",
      "bitcoin",
      "ethereum",
      "crypto",
      "cryptocurrency",
      "web3",
      "nft",
      "defi",
   ]),
   ("Hardware", &[
      "hardware", "chip", "processor", "cpu", "gpu", "nvidia", "amd", "intel", "arm", "risc-v",
   ]),
   ("Mobile", &["mobile", "ios", "android", "iphone", "app store", "play store", "swift"]),
   ("Startup", &["startup", "founder", "vc", "venture capital", "funding", "series a", "ipo"]),
   ("Business", &["business", "company", "ceo", "revenue", "profit", "market"]),
   ("Open Source", &[
      "open source",
      "opensource",
      "github",
      "gitlab",
      "license",
      "mit",
      "apache",
      "gpl",
   ]),
   ("Linux", &["linux", "ubuntu", "debian", "arch", "fedora", "kernel"]),
   ("macOS", &["macos", "mac os", "apple", "m1", "m2", "m3"]),
   ("Windows", &["windows", "microsoft", "windows 11"]),
   ("Tools", &["tool", "cli", "terminal", "vim", "emacs", "vscode", "ide"]),
   ("Gaming", &["game", "gaming", "unity", "unreal", "steam", "nintendo", "playstation", "xbox"]),
   ("API", &["api", "rest", "graphql", "grpc"]),
   ("Performance", &["performance", "optimization", "speed", "benchmark", "latency"]),
   ("Testing", &["test", "testing", "qa", "unit test", "integration test"]),
];

#[derive(Debug, Clone)]
struct LabelRule {
   label:   String,
   pattern: Regex,
}

static BUILTIN_RULES: Lazy<Vec<LabelRule>> = Lazy::new(|| {
   KEYWORDS
      .iter()
      .map(|(label, keywords)| {
         build_rule(label, *keywords).expect("built-in keyword patterns are valid")
      })
      .collect()
});

fn build_rule<S: AsRef<str>>(label: &str, keywords: &[S]) -> Result<LabelRule, regex::Error> {
   let alternatives: Vec<String> = keywords
      .iter()
      .map(|k| regex::escape(k.as_ref().trim()))
      .collect();
   // Keywords may start or end in punctuation ("c++", "next.js"), where `\b`
   // would never match, so boundaries are spelled out.
   let pattern = format!(r"(?i)(?:^|[^\w])(?:{})(?:$|[^\w])", alternatives.join("|"));
   Ok(LabelRule { label: label.to_string(), pattern: Regex::new(&pattern)? })
}

/// Labels titles by case-insensitive whole-word keyword matches.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
   rules:    Vec<LabelRule>,
   max_tags: usize,
}

impl Default for KeywordClassifier {
   fn default() -> Self {
      Self { rules: BUILTIN_RULES.clone(), max_tags: MAX_LABELS_PER_POST }
   }
}

impl KeywordClassifier {
   /// Builds a classifier from a custom `(label, keywords)` table. Table order
   /// decides which labels win when a title matches more than `max_tags`.
   pub fn with_table<L, K>(table: L, max_tags: usize) -> Result<Self, regex::Error>
   where
      L: IntoIterator<Item = (String, Vec<K>)>,
      K: AsRef<str>,
   {
      let rules = table
         .into_iter()
         .map(|(label, keywords)| build_rule(&label, keywords.as_slice()))
         .collect::<Result<_, _>>()?;
      Ok(Self { rules, max_tags })
   }

   pub fn keywords_for(label: &str) -> &'static [&'static str] {
      KEYWORDS
         .iter()
         .find(|(l, _)| *l == label)
         .map_or(&[][..], |(_, keywords)| *keywords)
   }
}

impl LabelClassifier for KeywordClassifier {
   fn classify(&self, title: &str) -> Vec<String> {
      if title.is_empty() {
         return Vec::new();
      }

      self
         .rules
         .iter()
         .filter(|rule| rule.pattern.is_match(title))
         .take(self.max_tags)
         .map(|rule| rule.label.clone())
         .collect()
   }

   fn known_labels(&self) -> BTreeSet<String> {
      self.rules.iter().map(|r| r.label.clone()).collect()
   }
}

/// Known labels related to `requested` by case-insensitive containment in
/// either direction, sorted, at most `limit`.
pub fn suggest_labels(requested: &str, known: &BTreeSet<String>, limit: usize) -> Vec<String> {
   let needle = requested.trim().to_lowercase();
   if needle.is_empty() {
      return Vec::new();
   }

   known
      .iter()
      .filter(|label| {
         let candidate = label.to_lowercase();
         candidate.contains(&needle) || needle.contains(&candidate)
      })
      .take(limit)
      .cloned()
      .collect()
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn classifies_by_whole_word() {
      let classifier = KeywordClassifier::default();

      assert_eq!(classifier.classify("Show HN: a Rust CLI"), vec!["Rust", "Tools"]);
      assert_eq!(classifier.classify("Python 3.12 release"), vec!["Python"]);
      // "go" must not fire inside "google"
      assert!(!classifier.classify("Googlers protest").contains(&"Go".to_string()));
      assert!(classifier.classify("").is_empty());
   }

   #[test]
   fn matches_punctuated_keywords() {
      let classifier = KeywordClassifier::default();
      assert!(classifier.classify("Modern C++ in 2024").contains(&"C/C++".to_string()));
      assert!(classifier.classify("Next.js 15 is out").contains(&"JavaScript".to_string()));
   }

   #[test]
   fn caps_label_count() {
      let classifier = KeywordClassifier::default();
      let labels =
         classifier.classify("OpenAI Claude Gemini Grok Mistral LLM GenAI agents RAG NLP python");
      assert_eq!(labels.len(), MAX_LABELS_PER_POST);
      assert_eq!(labels[0], "OpenAI");
   }

   #[test]
   fn custom_table() {
      let classifier = KeywordClassifier::with_table(
         vec![("Zig".to_string(), vec!["zig", "ziglang"])],
         3,
      )
      .unwrap();
      assert_eq!(classifier.classify("Why I moved to Zig"), vec!["Zig"]);
      assert_eq!(classifier.known_labels().len(), 1);
   }

   #[test]
   fn known_labels_cover_table() {
      let known = KeywordClassifier::default().known_labels();
      assert_eq!(known.len(), KEYWORDS.len());
      assert!(known.contains("Web Dev"));
      assert_eq!(KeywordClassifier::keywords_for("Claude"), &["claude", "anthropic"]);
      assert!(KeywordClassifier::keywords_for("Nope").is_empty());
   }

   #[test]
   fn suggestions_by_containment() {
      let known = KeywordClassifier::default().known_labels();

      assert_eq!(suggest_labels("python", &known, 5), vec!["Python"]);
      assert_eq!(suggest_labels("java", &known, 5), vec!["Java", "JavaScript"]);
      assert!(suggest_labels("xyz123", &known, 5).is_empty());
      assert!(suggest_labels("  ", &known, 5).is_empty());
      assert_eq!(suggest_labels("a", &known, 2).len(), 2);
   }
}
