use serde::{Deserialize, Serialize};

use crate::analysis::keywords::{extract_keywords, DOCUMENT_KEYWORD_LIMIT};

/// Section headings an ATS commonly looks for.
const ATS_SECTIONS: &[&str] = &[
    "summary",
    "experience",
    "education",
    "skills",
    "projects",
    "certifications",
    "achievements",
    "publications",
    "languages",
    "volunteering",
    "interests",
    "references",
];

const BULLET_MARKERS: &[char] = &['•', '*', '-', '·'];

/// Quick structural facts about an extracted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentProfile {
    pub word_count: usize,
    pub character_count: usize,
    pub bullet_points: usize,
    pub sections: Vec<String>,
    pub keywords: Vec<String>,
}

pub fn profile_document(text: &str) -> DocumentProfile {
    let lower = text.to_lowercase();
    DocumentProfile {
        word_count: text.split_whitespace().count(),
        character_count: text.chars().count(),
        bullet_points: text.chars().filter(|c| BULLET_MARKERS.contains(c)).count(),
        sections: ATS_SECTIONS
            .iter()
            .filter(|s| lower.contains(*s))
            .map(|s| s.to_string())
            .collect(),
        keywords: extract_keywords(text, DOCUMENT_KEYWORD_LIMIT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_counts() {
        let text = "Summary\nBackend engineer\nExperience\n• Built APIs\n• Ran Postgres\nSkills: Rust";
        let p = profile_document(text);
        assert_eq!(p.word_count, 12);
        assert_eq!(p.bullet_points, 2);
        assert_eq!(p.sections, vec!["summary", "experience", "skills"]);
        assert!(p.keywords.contains(&"postgres".to_string()));
    }

    #[test]
    fn test_profile_empty() {
        let p = profile_document("");
        assert_eq!(p.word_count, 0);
        assert_eq!(p.character_count, 0);
        assert!(p.sections.is_empty());
        assert!(p.keywords.is_empty());
    }

    #[test]
    fn test_profile_caps_keywords() {
        let text = (0..80).map(|i| format!("term{i:03}")).collect::<Vec<_>>().join(" ");
        assert_eq!(profile_document(&text).keywords.len(), DOCUMENT_KEYWORD_LIMIT);
    }
}
