//! Marks query terms inside titles.

use std::ops::Range;

use crate::config::{HIGHLIGHT_CLOSE, HIGHLIGHT_OPEN};

/// Wraps each case-insensitive occurrence of the terms in `**` markers,
/// keeping the title's original casing.
pub fn highlight(title: &str, terms: &[&str]) -> String {
   highlight_with(title, terms, HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE)
}

pub fn highlight_with(title: &str, terms: &[&str], open: &str, close: &str) -> String {
   mark_with(title, &find_spans(title, terms), open, close)
}

/// Wraps already computed spans of `title` in `**` markers.
pub fn mark(title: &str, spans: &[Range<usize>]) -> String {
   mark_with(title, spans, HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE)
}

fn mark_with(title: &str, spans: &[Range<usize>], open: &str, close: &str) -> String {
   if spans.is_empty() {
      return title.to_string();
   }

   let mut out = String::with_capacity(title.len() + spans.len() * (open.len() + close.len()));
   let mut cursor = 0;
   for span in spans {
      out.push_str(&title[cursor..span.start]);
      out.push_str(open);
      out.push_str(&title[span.clone()]);
      out.push_str(close);
      cursor = span.end;
   }
   out.push_str(&title[cursor..]);
   out
}

/// Lowercased title plus, for every original character, where its folded
/// form starts and where the character sits in the original.
struct Folded {
   text:   String,
   /// `(folded_start, original_start, original_end)`, ascending.
   groups: Vec<(usize, usize, usize)>,
}

impl Folded {
   fn new(title: &str) -> Self {
      let mut text = String::with_capacity(title.len());
      let mut groups = Vec::with_capacity(title.len());
      for (start, c) in title.char_indices() {
         groups.push((text.len(), start, start + c.len_utf8()));
         text.extend(c.to_lowercase());
      }
      Self { text, groups }
   }

   /// Original span covering every character whose folded form overlaps
   /// the folded range `start..end`.
   fn original(&self, start: usize, end: usize) -> Range<usize> {
      let group_of = |pos: usize| self.groups.partition_point(|g| g.0 <= pos).saturating_sub(1);
      let first = self.groups[group_of(start)];
      let last = self.groups[group_of(end - 1)];
      first.1..last.2
   }
}

/// Byte ranges of `title` to mark, sorted and non-overlapping.
///
/// Matching runs on the lowercased title, the same text the title filter
/// checks, so every occurrence the filter sees gets a span. Longer terms
/// claim their occurrences first; shorter terms only mark spans that do not
/// overlap an existing mark.
pub fn find_spans(title: &str, terms: &[&str]) -> Vec<Range<usize>> {
   let mut needles: Vec<String> = terms
      .iter()
      .map(|t| t.trim().to_lowercase())
      .filter(|t| !t.is_empty())
      .collect();
   needles.sort_by(|a, b| {
      b.chars()
         .count()
         .cmp(&a.chars().count())
         .then_with(|| a.cmp(b))
   });
   needles.dedup();

   let folded = Folded::new(title);
   let mut spans: Vec<Range<usize>> = Vec::new();
   for needle in &needles {
      let mut from = 0;
      while let Some(found) = folded.text[from..].find(needle.as_str()) {
         let start = from + found;
         let end = start + needle.len();
         let span = folded.original(start, end);

         if spans.iter().any(|s| s.start < span.end && span.start < s.end) {
            // retry one character further on
            from = start + folded.text[start..].chars().next().map_or(1, char::len_utf8);
            continue;
         }
         from = end;
         spans.push(span);
      }
   }

   spans.sort_by_key(|s| s.start);
   spans
}
