//! Relevance scoring for text queries. Scores only order results; they never
//! filter them.

use std::cmp::Ordering;

use crate::types::SearchHit;

pub const WHOLE_WORD_WEIGHT: f64 = 10.0;
pub const TITLE_START_WEIGHT: f64 = 5.0;
pub const SUBSTRING_WEIGHT: f64 = 1.0;

fn is_word_char(c: char) -> bool {
   c.is_alphanumeric() || c == '_'
}

/// Scores one title against the query words.
///
/// Every case-insensitive occurrence of a word earns [`WHOLE_WORD_WEIGHT`]
/// when it stands as a whole word and [`SUBSTRING_WEIGHT`] otherwise; an
/// occurrence at the very start of the title adds [`TITLE_START_WEIGHT`].
/// The sum is divided by the title length in characters.
pub fn relevance_score(words: &[&str], title: &str) -> f64 {
   let haystack = title.to_lowercase();
   let mut score = 0.0;

   for word in words {
      let needle = word.to_lowercase();
      if needle.is_empty() {
         continue;
      }

      for (pos, matched) in haystack.match_indices(needle.as_str()) {
         let before = haystack[..pos].chars().next_back();
         let after = haystack[pos + matched.len()..].chars().next();
         let whole = !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char);

         score += if whole { WHOLE_WORD_WEIGHT } else { SUBSTRING_WEIGHT };
         if pos == 0 {
            score += TITLE_START_WEIGHT;
         }
      }
   }

   score / title.chars().count().max(1) as f64
}

/// Higher relevance first, then newer, then higher id.
fn compare_hits(a: &SearchHit, b: &SearchHit) -> Ordering {
   let relevance = |h: &SearchHit| h.relevance.unwrap_or(0.0);
   relevance(b)
      .total_cmp(&relevance(a))
      .then_with(|| b.post.created_at.cmp(&a.post.created_at))
      .then_with(|| b.post.id.cmp(&a.post.id))
}

/// Scores every hit and sorts the slice by relevance.
pub fn rank_by_relevance(hits: &mut [SearchHit], words: &[&str]) {
   for hit in hits.iter_mut() {
      hit.relevance = Some(relevance_score(words, &hit.post.title));
   }
   hits.sort_by(compare_hits);
}
