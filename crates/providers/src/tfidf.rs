//! Single-document TF-IDF term ranking.
//!
//! With one document every IDF is 1, so weights are term counts over the
//! selected vocabulary, L2-normalised.

use crate::{ExtractError, RankedTerm, TermRanker};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("valid token pattern"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
        "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
        "amongst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything",
        "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became", "because",
        "become", "becomes", "becoming", "been", "before", "beforehand", "behind", "being",
        "below", "beside", "besides", "between", "beyond", "both", "bottom", "but", "by",
        "call", "can", "cannot", "could", "do", "done", "down", "due", "during", "each", "eg",
        "eight", "either", "else", "elsewhere", "empty", "enough", "etc", "even", "ever",
        "every", "everyone", "everything", "everywhere", "except", "few", "fifteen", "fifty",
        "fill", "find", "first", "five", "for", "former", "formerly", "forty", "four", "from",
        "front", "full", "further", "get", "give", "go", "had", "has", "have", "he", "hence",
        "her", "here", "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him",
        "himself", "his", "how", "however", "hundred", "i", "ie", "if", "in", "indeed",
        "interest", "into", "is", "it", "its", "itself", "keep", "last", "latter", "latterly",
        "least", "less", "ltd", "made", "many", "may", "me", "meanwhile", "might", "mine",
        "more", "moreover", "most", "mostly", "move", "much", "must", "my", "myself", "name",
        "namely", "neither", "never", "nevertheless", "next", "nine", "no", "nobody", "none",
        "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off", "often", "on", "once",
        "one", "only", "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves",
        "out", "over", "own", "part", "per", "perhaps", "please", "put", "rather", "re", "same",
        "see", "seem", "seemed", "seeming", "seems", "serious", "several", "she", "should",
        "show", "side", "since", "six", "sixty", "so", "some", "somehow", "someone",
        "something", "sometime", "sometimes", "somewhere", "still", "such", "take", "ten",
        "than", "that", "the", "their", "them", "themselves", "then", "thence", "there",
        "thereafter", "thereby", "therefore", "therein", "thereupon", "these", "they", "third",
        "this", "those", "though", "three", "through", "throughout", "thru", "thus", "to",
        "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "under",
        "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what",
        "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby",
        "wherein", "whereupon", "wherever", "whether", "which", "while", "whither", "who",
        "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without",
        "would", "yet", "you", "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Default, Clone, Copy)]
pub struct TfIdfRanker;

impl TermRanker for TfIdfRanker {
    fn rank(&self, text: &str, limit: usize) -> Result<Vec<RankedTerm>, ExtractError> {
        let lowered = text.to_lowercase();
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for token in TOKEN_RE.find_iter(&lowered).map(|m| m.as_str()) {
            if STOP_WORDS.contains(token) {
                continue;
            }
            *counts.entry(token).or_insert(0) += 1;
        }

        let mut terms: Vec<(&str, u64)> = counts.into_iter().collect();
        // Highest count first; alphabetical among equals keeps output deterministic.
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(limit);

        let norm = terms
            .iter()
            .map(|(_, c)| (*c as f64).powi(2))
            .sum::<f64>()
            .sqrt();
        if norm == 0.0 {
            return Ok(Vec::new());
        }
        Ok(terms
            .into_iter()
            .map(|(term, count)| RankedTerm {
                term: term.to_string(),
                weight: count as f64 / norm,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_frequency_and_drops_stop_words() {
        let ranked = TfIdfRanker
            .rank("The budget and the budget forecast for finance", 5)
            .unwrap();
        let terms: Vec<&str> = ranked.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(terms, vec!["budget", "finance", "forecast"]);
        assert!(ranked[0].weight > ranked[1].weight);
    }

    #[test]
    fn weights_are_unit_length() {
        let ranked = TfIdfRanker.rank("alpha beta beta gamma", 5).unwrap();
        let length: f64 = ranked.iter().map(|t| t.weight * t.weight).sum();
        assert!((length - 1.0).abs() < 1e-9);
    }

    #[test]
    fn only_stop_words_yields_nothing() {
        assert!(TfIdfRanker.rank("the and of", 5).unwrap().is_empty());
    }
}
