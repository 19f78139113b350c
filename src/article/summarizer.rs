//! Extractive summarization: score sentences by word frequency and keep the
//! best ones in document order.

use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashMap;

use crate::error::{NewsError, Result};

/// Synchronous, CPU-bound summarizer. Callers run it on the blocking pool.
pub trait Summarizer: Send + Sync {
    /// `ratio` is the share of sentences to keep; a non-zero `words` target
    /// overrides it and keeps sentences until that many words are covered.
    fn summarize(&self, text: &str, ratio: f32, words: usize) -> Result<String>;
}

#[derive(Debug, Default, Clone)]
pub struct FrequencySummarizer;

fn sentence_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"[^.!?。！？\n]+[.!?。！？]*").expect("static regex"))
}

fn token_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}]+").expect("static regex"))
}

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "was", "were", "with", "are", "this", "that", "from", "has", "have",
    "its", "will", "into", "than", "then", "they", "their", "been", "also", "but", "not",
];

fn is_cjk(c: char) -> bool {
    matches!(c as u32, 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF)
}

/// Lowercased word tokens; CJK runs are split into single characters.
fn tokens(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    for m in token_re().find_iter(s) {
        let w = m.as_str().to_lowercase();
        if w.chars().any(is_cjk) {
            out.extend(w.chars().filter(|c| is_cjk(*c)).map(String::from));
        } else if w.chars().count() > 2 && !STOPWORDS.contains(&w.as_str()) {
            out.push(w);
        }
    }
    out
}

fn split_sentences(text: &str) -> Vec<&str> {
    sentence_re()
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Summarizer for FrequencySummarizer {
    fn summarize(&self, text: &str, ratio: f32, words: usize) -> Result<String> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(NewsError::Summarization(format!("invalid ratio {ratio}")));
        }
        let sentences = split_sentences(text);
        if sentences.len() <= 1 {
            return Ok(sentences.first().map(|s| s.to_string()).unwrap_or_default());
        }

        let per_sentence: Vec<Vec<String>> = sentences.iter().map(|s| tokens(s)).collect();
        let mut freq: HashMap<&str, f32> = HashMap::new();
        for t in per_sentence.iter().flatten() {
            *freq.entry(t.as_str()).or_default() += 1.0;
        }

        let mut ranked: Vec<(usize, f32)> = per_sentence
            .iter()
            .enumerate()
            .map(|(i, toks)| {
                let score = if toks.is_empty() {
                    0.0
                } else {
                    toks.iter().map(|t| freq[t.as_str()]).sum::<f32>() / toks.len() as f32
                };
                (i, score)
            })
            .collect();
        // Highest score first; earlier sentence wins ties.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut keep = Vec::new();
        if words > 0 {
            let mut covered = 0usize;
            for (i, _) in &ranked {
                if covered >= words {
                    break;
                }
                covered += sentences[*i].split_whitespace().count().max(per_sentence[*i].len());
                keep.push(*i);
            }
        } else {
            let n = ((sentences.len() as f32 * ratio).ceil() as usize).clamp(1, sentences.len());
            keep.extend(ranked.iter().take(n).map(|(i, _)| *i));
        }
        keep.sort_unstable();

        Ok(keep
            .into_iter()
            .map(|i| sentences[i])
            .collect::<Vec<_>>()
            .join(" "))
    }
}

/// Cut `s` to `max_chars` characters and append `...` when it was longer.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
