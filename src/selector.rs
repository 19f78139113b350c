//! Keyword filter plus diversity-aware sampling over summarized outcomes.

use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::news::ArticleOutcome;

/// Pick up to `target_count` outcomes, at least one per source when the
/// budget allows.
///
/// Unless `already_filtered`, outcomes not matching any keyword and extraction
/// placeholders are discarded first. Each source then contributes one random
/// pick; surplus picks are down-sampled, missing slots are filled uniformly
/// from whatever is left. The result order is random.
pub fn select<R: Rng + ?Sized>(
    items: Vec<ArticleOutcome>,
    keywords: &[String],
    target_count: usize,
    already_filtered: bool,
    rng: &mut R,
) -> Vec<ArticleOutcome> {
    let eligible: Vec<ArticleOutcome> = if already_filtered {
        items
    } else {
        items
            .into_iter()
            .filter(|o| !o.is_placeholder() && o.matches_any(keywords))
            .collect()
    };
    if target_count == 0 || eligible.is_empty() {
        return Vec::new();
    }

    // Groups in first-appearance order of sources.
    let mut groups: Vec<(String, Vec<ArticleOutcome>)> = Vec::new();
    for o in eligible {
        match groups.iter_mut().find(|(name, _)| name == o.source_name()) {
            Some((_, g)) => g.push(o),
            None => groups.push((o.source_name().to_string(), vec![o])),
        }
    }

    let mut picked = Vec::with_capacity(target_count);
    let mut rest = Vec::new();
    for (_, mut group) in groups {
        let i = rng.random_range(0..group.len());
        picked.push(group.swap_remove(i));
        rest.extend(group);
    }

    if picked.len() > target_count {
        picked.shuffle(rng);
        picked.truncate(target_count);
    } else {
        let missing = (target_count - picked.len()).min(rest.len());
        let mut fill = index::sample(rng, rest.len(), missing).into_vec();
        // Highest index first so swap_remove never moves a pending pick.
        fill.sort_unstable_by(|a, b| b.cmp(a));
        for i in fill {
            picked.push(rest.swap_remove(i));
        }
        picked.shuffle(rng);
    }
    picked
}

/// `select` with the thread-local RNG.
pub fn select_random(
    items: Vec<ArticleOutcome>,
    keywords: &[String],
    target_count: usize,
    already_filtered: bool,
) -> Vec<ArticleOutcome> {
    select(items, keywords, target_count, already_filtered, &mut rand::rng())
}
