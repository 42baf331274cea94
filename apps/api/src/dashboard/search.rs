use crate::models::note::NoteRow;

/// Notes whose title, content or any tag contains `query`, ignoring case.
/// A blank query returns every note in its original order.
pub fn filter_notes<'a>(notes: &'a [NoteRow], query: &str) -> Vec<&'a NoteRow> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return notes.iter().collect();
    }
    notes
        .iter()
        .filter(|note| {
            note.title.to_lowercase().contains(&needle)
                || note.content.to_lowercase().contains(&needle)
                || note.tags.iter().any(|t| t.to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn note(title: &str, content: &str, tags: &[&str]) -> NoteRow {
        NoteRow {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            video_id: Uuid::nil(),
            title: title.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    fn sample() -> Vec<NoteRow> {
        vec![
            note(
                "Improvement Ideas",
                "Consider better lighting and audio quality.",
                &["improvement", "technical"],
            ),
            note(
                "Audience Feedback",
                "Viewers requested more detailed examples.",
                &["feedback", "Tutorial"],
            ),
            note("Thumbnail", "Try a brighter background.", &[]),
        ]
    }

    fn titles<'a>(notes: &[&'a NoteRow]) -> Vec<&'a str> {
        notes.iter().map(|n| n.title.as_str()).collect()
    }

    #[test]
    fn test_empty_query_returns_all_in_order() {
        let notes = sample();
        assert_eq!(
            titles(&filter_notes(&notes, "")),
            vec!["Improvement Ideas", "Audience Feedback", "Thumbnail"]
        );
    }

    #[test]
    fn test_matches_title_case_insensitive() {
        let notes = sample();
        assert_eq!(titles(&filter_notes(&notes, "AUDIENCE")), vec!["Audience Feedback"]);
    }

    #[test]
    fn test_matches_content() {
        let notes = sample();
        assert_eq!(titles(&filter_notes(&notes, "lighting")), vec!["Improvement Ideas"]);
    }

    #[test]
    fn test_matches_any_tag() {
        let notes = sample();
        assert_eq!(titles(&filter_notes(&notes, "tutorial")), vec!["Audience Feedback"]);
    }

    #[test]
    fn test_substring_across_fields() {
        let notes = sample();
        assert_eq!(titles(&filter_notes(&notes, "bright")), vec!["Thumbnail"]);
        assert_eq!(
            titles(&filter_notes(&notes, "back")),
            vec!["Audience Feedback", "Thumbnail"]
        );
    }

    #[test]
    fn test_no_match() {
        let notes = sample();
        assert!(filter_notes(&notes, "monetization").is_empty());
    }
}
