use crate::domain::{Prompt, Snapshot};
use std::collections::BTreeSet;

/// Rank of a search match, ordered best-first. Exact name matches always sort
/// ahead of name substrings, which sort ahead of content/tag substrings.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum MatchRank {
    ExactName,
    NameSubstring,
    ContentOrTag,
}

#[derive(Clone, Copy, Debug)]
pub struct SearchHit<'a> {
    pub prompt: &'a Prompt,
    pub rank: MatchRank,
}

fn rank_prompt(prompt: &Prompt, query_lower: &str) -> Option<MatchRank> {
    let name_lower = prompt.name.to_lowercase();
    if name_lower == query_lower {
        return Some(MatchRank::ExactName);
    }
    if name_lower.contains(query_lower) {
        return Some(MatchRank::NameSubstring);
    }
    if prompt.content.to_lowercase().contains(query_lower) {
        return Some(MatchRank::ContentOrTag);
    }
    if prompt
        .tags
        .iter()
        .any(|tag| tag.to_lowercase().contains(query_lower))
    {
        return Some(MatchRank::ContentOrTag);
    }
    None
}

/// Case-insensitive substring search over name, content, and tags. Results
/// are ordered by rank, ties broken by ascending name so the ordering is
/// deterministic. An empty query matches everything in name order.
pub fn search<'a>(snapshot: &'a Snapshot, query: &str) -> Vec<SearchHit<'a>> {
    if query.is_empty() {
        return snapshot
            .prompts()
            .iter()
            .map(|prompt| SearchHit {
                prompt,
                rank: MatchRank::ContentOrTag,
            })
            .collect();
    }

    let query_lower = query.to_lowercase();
    let mut hits: Vec<SearchHit<'a>> = snapshot
        .prompts()
        .iter()
        .filter_map(|prompt| {
            rank_prompt(prompt, &query_lower).map(|rank| SearchHit { prompt, rank })
        })
        .collect();

    // Snapshot order is already name-ascending, so a stable sort on rank
    // alone keeps ties lexicographic.
    hits.sort_by_key(|hit| hit.rank);
    hits
}

/// Keeps prompts whose tag set is a superset of `tags` (AND semantics). An
/// empty filter keeps everything.
pub fn filter_by_tags<'a>(snapshot: &'a Snapshot, tags: &BTreeSet<String>) -> Vec<&'a Prompt> {
    snapshot
        .prompts()
        .iter()
        .filter(|prompt| tags.iter().all(|tag| prompt.tags.contains(tag)))
        .collect()
}

/// Composition used by the interactive session: search narrows first, the tag
/// filter narrows further, and search ranking order is preserved. Returns
/// indices into `snapshot.prompts()`.
pub fn visible_indices(snapshot: &Snapshot, query: &str, tags: &BTreeSet<String>) -> Vec<usize> {
    let hits = search(snapshot, query);
    hits.into_iter()
        .filter(|hit| tags.iter().all(|tag| hit.prompt.tags.contains(tag)))
        .filter_map(|hit| {
            snapshot
                .prompts()
                .iter()
                .position(|prompt| prompt.name == hit.prompt.name)
        })
        .collect()
}

/// Separator placed between prompts concatenated in Build mode.
pub const BUILD_DELIMITER: &str = "\n\n---\n\n";

/// Concatenates the named prompts' content in the given order. Names missing
/// from the snapshot are skipped.
pub fn compose(snapshot: &Snapshot, names: &[String]) -> String {
    let parts: Vec<&str> = names
        .iter()
        .filter_map(|name| snapshot.get(name))
        .map(|prompt| prompt.content.as_str())
        .collect();
    parts.join(BUILD_DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Prompt;

    fn prompt(name: &str, content: &str, tags: &[&str]) -> Prompt {
        Prompt {
            name: name.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
            template_origin: None,
            modified_at: None,
        }
    }

    fn tag_set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|tag| (*tag).to_string()).collect()
    }

    fn snapshot() -> Snapshot {
        Snapshot::from_prompts(vec![
            prompt("code-review", "Review this diff carefully.", &["code", "review"]),
            prompt("review", "General review checklist.", &["review", "work"]),
            prompt("standup", "What I did yesterday: review notes.", &["work", "urgent"]),
            prompt("debug", "Find the bug.", &["code"]),
        ])
    }

    #[test]
    fn exact_name_ranks_before_name_substring() {
        let snapshot = snapshot();
        let hits = search(&snapshot, "review");
        let names: Vec<&str> = hits.iter().map(|hit| hit.prompt.name.as_str()).collect();
        assert_eq!(names[0], "review");
        assert_eq!(names[1], "code-review");
        assert_eq!(hits[0].rank, MatchRank::ExactName);
        assert_eq!(hits[1].rank, MatchRank::NameSubstring);
        // "standup" matches only through content, so it trails both.
        assert_eq!(names[2], "standup");
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let snapshot = snapshot();
        let hits = search(&snapshot, "URGENT");
        let names: Vec<&str> = hits.iter().map(|hit| hit.prompt.name.as_str()).collect();
        assert_eq!(names, vec!["standup"]);
    }

    #[test]
    fn empty_query_returns_all_in_name_order() {
        let snapshot = snapshot();
        let hits = search(&snapshot, "");
        let names: Vec<&str> = hits.iter().map(|hit| hit.prompt.name.as_str()).collect();
        assert_eq!(names, vec!["code-review", "debug", "review", "standup"]);
    }

    #[test]
    fn no_match_returns_empty() {
        let snapshot = snapshot();
        assert!(search(&snapshot, "nonexistent-term").is_empty());
    }

    #[test]
    fn tag_filter_requires_superset() {
        let snapshot = snapshot();
        let kept = filter_by_tags(&snapshot, &tag_set(&["work", "urgent"]));
        let names: Vec<&str> = kept.iter().map(|p| p.name.as_str()).collect();
        // "review" has only {review, work}, so it is excluded.
        assert_eq!(names, vec!["standup"]);
    }

    #[test]
    fn empty_tag_filter_keeps_everything() {
        let snapshot = snapshot();
        assert_eq!(filter_by_tags(&snapshot, &BTreeSet::new()).len(), 4);
    }

    #[test]
    fn visible_indices_compose_search_and_tags_preserving_rank() {
        let snapshot = snapshot();
        let indices = visible_indices(&snapshot, "review", &tag_set(&["code"]));
        let names: Vec<&str> = indices
            .iter()
            .map(|index| snapshot.prompts()[*index].name.as_str())
            .collect();
        // Only "code-review" carries the "code" tag among the matches, and it
        // keeps its search position.
        assert_eq!(names, vec!["code-review"]);
    }

    #[test]
    fn compose_joins_in_selection_order() {
        let snapshot = snapshot();
        let names = vec!["standup".to_string(), "code-review".to_string()];
        let composed = compose(&snapshot, &names);
        assert_eq!(
            composed,
            format!(
                "What I did yesterday: review notes.{BUILD_DELIMITER}Review this diff carefully."
            )
        );
    }

    #[test]
    fn compose_skips_unknown_names() {
        let snapshot = snapshot();
        let names = vec!["missing".to_string(), "debug".to_string()];
        assert_eq!(compose(&snapshot, &names), "Find the bug.");
    }
}
