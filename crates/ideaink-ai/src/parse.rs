//! Parsing of free-form model output.
//!
//! Idea lists go through an ordered chain of strategies; the first one that
//! finds anything wins. Every strategy is a pure function of the text.

use regex::Regex;
use std::sync::LazyLock;

/// Fewest ideas an expansion produces.
pub const MIN_IDEAS: usize = 4;
/// Most ideas an expansion produces.
pub const MAX_IDEAS: usize = 5;

/// Ideas used when the model gave nothing usable.
pub const FALLBACK_IDEAS: [&str; MIN_IDEAS] =
    ["Key aspect", "Related concept", "Open question", "Next step"];

/// Summary used when the model gave nothing usable.
pub const FALLBACK_SUMMARY: &str = "Summary unavailable. Try again later.";

/// A strategy either finds ideas or reports no match with `None`.
pub type IdeaStrategy = fn(&str) -> Option<Vec<String>>;

/// Strategies in the order they are tried.
pub const IDEA_STRATEGIES: [(&str, IdeaStrategy); 2] =
    [("numbered list", numbered_list), ("line split", line_split)];

static NUMBERED_ITEM: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d+\s*[.):]\s*(.+?)\s*$").ok());

static LEADING_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]+\s*|\d+\s*[.):-]\s*|\d+\s+)+").ok());

/// Strip markdown emphasis and quotes around an item.
fn clean_item(item: &str) -> String {
    item.trim()
        .trim_matches(|c: char| matches!(c, '*' | '_' | '"' | '\'' | '`'))
        .trim()
        .to_string()
}

/// `1. idea` / `2) idea` lines.
pub fn numbered_list(content: &str) -> Option<Vec<String>> {
    let ideas: Vec<String> = NUMBERED_ITEM
        .as_ref()?
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| clean_item(m.as_str()))
        .filter(|idea| !idea.is_empty())
        .collect();
    (!ideas.is_empty()).then_some(ideas)
}

/// One idea per non-empty line, bullets and stray numbering removed.
pub fn line_split(content: &str) -> Option<Vec<String>> {
    let ideas: Vec<String> = content
        .lines()
        .map(|line| match LEADING_MARKER.as_ref() {
            Some(marker) => clean_item(&marker.replace(line.trim(), "")),
            None => clean_item(line),
        })
        .filter(|idea| !idea.is_empty())
        .collect();
    (!ideas.is_empty()).then_some(ideas)
}

/// Clamp to [`MAX_IDEAS`] and pad up to [`MIN_IDEAS`].
pub fn normalize_ideas(mut ideas: Vec<String>) -> Vec<String> {
    if ideas.is_empty() {
        return fallback_ideas();
    }
    ideas.truncate(MAX_IDEAS);
    let mut n = ideas.len();
    while ideas.len() < MIN_IDEAS {
        n += 1;
        ideas.push(format!("Idea {}", n));
    }
    ideas
}

pub fn fallback_ideas() -> Vec<String> {
    FALLBACK_IDEAS.iter().map(|s| s.to_string()).collect()
}

/// Turn a model reply into between [`MIN_IDEAS`] and [`MAX_IDEAS`] ideas.
pub fn parse_ideas(content: &str) -> Vec<String> {
    for (name, strategy) in IDEA_STRATEGIES {
        if let Some(ideas) = strategy(content) {
            log::debug!("Parsed {} ideas by {}", ideas.len(), name);
            return normalize_ideas(ideas);
        }
    }
    log::warn!("No ideas found in model output, using placeholders");
    fallback_ideas()
}

/// Turn a model reply into one summary line.
pub fn parse_summary(content: &str) -> String {
    let summary = content
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let summary = clean_item(&summary);
    if summary.is_empty() {
        log::warn!("Empty summary from model, using placeholder");
        FALLBACK_SUMMARY.to_string()
    } else {
        summary
    }
}
