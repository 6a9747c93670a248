//! Token-budgeted sliding window, applied independently to each detected
//! section. Operates on byte-offset ranges into the section's own text, so
//! chunk boundaries always land on a word boundary and concatenating the
//! resulting ranges (after removing each chunk's overlap prefix) exactly
//! reconstructs the section.
use common::storage::types::chunk::Chunk;
use common::utils::config::ChunkBudget;
use common::utils::token_counter::count;

use crate::text::{sentence_boundaries, word_boundaries};

/// A raw `(start, end)` byte-offset window before any section-label or
/// chunk-index is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    start: usize,
    end: usize,
    token_count: usize,
}

/// Slides a token-budgeted window across one section's text and returns the
/// resulting chunks, numbered starting at `first_index`. `subsections` are
/// `(byte_offset, letter)` pairs (see [`crate::sections::detect_subsections`]);
/// a chunk starting after a marker and before the next one gets that letter
/// folded into its label, e.g. `Sec. 2(a)`. Pass an empty slice for document
/// grammars without subsections.
pub fn chunk_section(
    text: &str,
    label: &str,
    budget: &ChunkBudget,
    first_index: usize,
    subsections: &[(usize, String)],
) -> Vec<Chunk> {
    if text.is_empty() {
        return Vec::new();
    }

    let total_tokens = count(text);
    let windows = if total_tokens <= budget.max_tokens {
        vec![Window {
            start: 0,
            end: text.len(),
            token_count: total_tokens,
        }]
    } else {
        slide_windows(text, budget)
    };

    let windows = merge_short_remainder(text, windows, budget);

    windows
        .into_iter()
        .enumerate()
        .map(|(i, w)| {
            Chunk::new(
                text[w.start..w.end].to_string(),
                label_for_offset(label, subsections, w.start),
                w.token_count,
                first_index + i,
            )
        })
        .collect()
}

/// Folds the subsection letter active at `offset` (the latest marker at or
/// before it) into `label`, dropping `label`'s trailing `.` so `Sec. 2.` +
/// `a` reads as `Sec. 2(a)` rather than `Sec. 2.(a)`.
fn label_for_offset(label: &str, subsections: &[(usize, String)], offset: usize) -> String {
    match subsections.iter().rev().find(|(marker, _)| *marker <= offset) {
        Some((_, letter)) => format!("{}({letter})", label.trim_end_matches('.')),
        None => label.to_string(),
    }
}

fn slide_windows(text: &str, budget: &ChunkBudget) -> Vec<Window> {
    let boundaries = word_boundaries(text);
    let sentence_ends = sentence_boundaries(text, &boundaries);
    let min_in_range = ((budget.target_tokens as f32) * 0.9).floor() as usize;
    let overlap = budget.overlap_tokens();

    let mut windows = Vec::new();
    let mut start = 0usize;

    loop {
        let remaining_tokens = count(&text[start..]);
        if remaining_tokens <= budget.max_tokens {
            windows.push(Window {
                start,
                end: text.len(),
                token_count: remaining_tokens,
            });
            break;
        }

        let (end, token_count) = next_cut(text, &boundaries, &sentence_ends, start, min_in_range, budget.target_tokens, budget.max_tokens);
        windows.push(Window { start, end, token_count });

        let overlap_start = find_overlap_start(text, &boundaries, start, end, overlap);
        start = if overlap_start > start { overlap_start } else { end };
    }

    windows
}

/// Picks the cut point for the window starting at `start`: a sentence
/// boundary within `[min_in_range, max]` closest to `target`, or (failing
/// that) the furthest word boundary within `max` tokens of `start`.
fn next_cut(
    text: &str,
    boundaries: &[usize],
    sentence_ends: &std::collections::HashSet<usize>,
    start: usize,
    min_in_range: usize,
    target: usize,
    max: usize,
) -> (usize, usize) {
    let mut best_sentence: Option<(usize, usize)> = None;
    let mut best_any: Option<(usize, usize)> = None;

    for &w in boundaries.iter().filter(|&&w| w > start) {
        let tc = count(&text[start..w]);
        if tc > max {
            break;
        }
        best_any = Some((w, tc));
        if tc >= min_in_range && sentence_ends.contains(&w) {
            let dist = (tc as i64 - target as i64).abs();
            let is_better = best_sentence
                .map(|(_, btc)| dist < (btc as i64 - target as i64).abs())
                .unwrap_or(true);
            if is_better {
                best_sentence = Some((w, tc));
            }
        }
    }

    best_sentence.or(best_any).unwrap_or_else(|| {
        let w = boundaries
            .iter()
            .find(|&&w| w > start)
            .copied()
            .unwrap_or(text.len());
        (w, count(&text[start..w]))
    })
}

/// Searches backward from `end` for the furthest-back word boundary whose
/// trailing span has at least `overlap` tokens.
fn find_overlap_start(text: &str, boundaries: &[usize], start: usize, end: usize, overlap: usize) -> usize {
    if overlap == 0 {
        return end;
    }
    let mut chosen = start;
    for &w in boundaries.iter().rev().filter(|&&w| w >= start && w < end) {
        let oc = count(&text[w..end]);
        chosen = w;
        if oc >= overlap {
            break;
        }
    }
    chosen
}

/// If the final window is shorter than `min_tokens`, folds it into the
/// previous window provided the union does not exceed `max_tokens * 1.25`.
/// The union is a single contiguous byte range (the two windows already
/// overlap there), so no text is duplicated; the overlap the merged window
/// already carries relative to its own predecessor is left untouched rather
/// than recomputed.
fn merge_short_remainder(text: &str, mut windows: Vec<Window>, budget: &ChunkBudget) -> Vec<Window> {
    if windows.len() < 2 {
        return windows;
    }
    let last = windows[windows.len() - 1];
    if last.token_count >= budget.min_tokens {
        return windows;
    }
    let prev = windows[windows.len() - 2];
    let merged_max = ((budget.max_tokens as f32) * 1.25).floor() as usize;

    let merged_token_count = count(&text[prev.start..last.end]);
    if merged_token_count > merged_max {
        return windows;
    }

    windows.pop();
    windows.pop();
    windows.push(Window {
        start: prev.start,
        end: last.end,
        token_count: merged_token_count,
    });
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget() -> ChunkBudget {
        ChunkBudget {
            min_tokens: 500,
            target_tokens: 600,
            max_tokens: 800,
            overlap_ratio: 0.15,
        }
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn single_small_section_is_one_chunk() {
        let text = "A short section of text.";
        let chunks = chunk_section(text, "Opinion", &budget(), 0, &[]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].section_label, "Opinion");
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_section("", "Opinion", &budget(), 0, &[]).is_empty());
    }

    #[test]
    fn long_section_is_split_and_bounded_by_max() {
        let text = format!(
            "{} {} {}",
            words(400).replace("word", "Sentence one has word") + ".",
            (words(400).replace("word", "Sentence two has word") + ".").repeat(1),
            ""
        );
        let chunks = chunk_section(&text, "Majority Opinion", &budget(), 0, &[]);
        assert!(chunks.len() >= 1);
        for chunk in &chunks {
            assert!(chunk.token_count <= (budget().max_tokens as f32 * 1.25) as usize);
        }
    }

    #[test]
    fn chunk_label_folds_in_active_subsection_letter() {
        let text = "Intro text before any marker. (a) First point here. (b) Second point here.";
        let subsections = vec![(30usize, "a".to_string()), (52usize, "b".to_string())];
        assert_eq!(text[30..33].to_string(), "(a)");
        assert_eq!(text[52..55].to_string(), "(b)");

        assert_eq!(label_for_offset("Sec. 2.", &subsections, 0), "Sec. 2.");
        assert_eq!(label_for_offset("Sec. 2.", &subsections, 30), "Sec. 2(a)");
        assert_eq!(label_for_offset("Sec. 2.", &subsections, 60), "Sec. 2(b)");
    }
}
