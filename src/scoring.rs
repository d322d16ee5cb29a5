use std::collections::BTreeMap;

use serde::Deserialize;

/// Relevance heuristic over a posting's title and location.
///
/// Matching is plain substring search on lowercased text, so overlapping
/// terms ("data scientist" and "data") both contribute.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Scorer {
    pub title_keywords: BTreeMap<String, i64>,
    pub title_penalties: BTreeMap<String, i64>,
    pub location_keywords: BTreeMap<String, i64>,
    pub location_penalties: BTreeMap<String, i64>,
    pub remote_bonus: i64,
}

impl Scorer {
    pub fn score(&self, title: Option<&str>, location: Option<&str>) -> i64 {
        self.score_title(title) + self.score_location(location)
    }

    pub fn score_title(&self, title: Option<&str>) -> i64 {
        let title = title.unwrap_or_default().to_lowercase();
        sum_matches(&title, &self.title_keywords) + sum_matches(&title, &self.title_penalties)
    }

    pub fn score_location(&self, location: Option<&str>) -> i64 {
        let location = location.unwrap_or_default().to_lowercase();
        let mut score = sum_matches(&location, &self.location_keywords)
            + sum_matches(&location, &self.location_penalties);
        if location.contains("remote") {
            score += self.remote_bonus;
        }
        score
    }
}

fn sum_matches(text: &str, table: &BTreeMap<String, i64>) -> i64 {
    table
        .iter()
        .filter(|(term, _)| text.contains(term.to_lowercase().as_str()))
        .map(|(_, weight)| weight)
        .sum()
}

fn table(entries: &[(&str, i64)]) -> BTreeMap<String, i64> {
    entries
        .iter()
        .map(|(term, weight)| ((*term).to_string(), *weight))
        .collect()
}

impl Default for Scorer {
    fn default() -> Self {
        Self {
            title_keywords: table(&[
                ("machine learning", 5),
                ("ml", 5),
                ("ai", 5),
                ("computational", 5),
                ("bioinformatics", 3),
                ("data scientist", 3),
                ("research scientist", 3),
                ("research engineer", 6),
                ("ops", 4),
                ("software", 2),
                ("data", 2),
                ("member of technical staff", 4),
                ("design", 2),
                ("genai", 4),
                ("gen ai", 4),
                ("gen-ai", 4),
                ("generative ai", 4),
                ("agentic ai", 4),
                ("engineer", 3),
                ("scientist", 5),
                ("computational biologist", 6),
                ("computational biology", 6),
                ("computational scientist", 5),
                ("ml scientist", 5),
                ("ai scientist", 5),
                ("bio ml", 5),
                ("deep learning", 5),
                ("nlp", 4),
                ("bioengineering", 3),
                ("protein", 2),
                ("therapeutics", 2),
                ("drug discovery", 3),
                ("genomics", 3),
                ("single cell", 3),
                ("transcriptomics", 2),
                ("systems biology", 2),
            ]),
            title_penalties: table(&[
                ("intern", -10),
                ("internship", -10),
                ("manager", -10),
                ("director", -10),
                ("vp", -10),
                ("principal", -10),
                ("staff", -10),
                ("qa", -10),
                ("quality assurance", -10),
                ("postdoctoral", -5),
                ("postdoc", -5),
                ("assistant professor", -8),
                ("faculty", -8),
                ("lecturer", -8),
            ]),
            location_keywords: table(&[
                ("boston", 5),
                ("cambridge", 5),
                ("somerville", 5),
                ("framingham", 5),
                ("massachusetts", 5),
                ("ma", 5),
                ("san francisco", 4),
                ("san jose", 4),
                ("san mateo", 4),
                ("mountain view", 4),
                ("sunnyvale", 4),
                ("palo alto", 4),
                ("menlo park", 4),
                ("redwood city", 4),
                ("california", 4),
                ("san diego", 3),
                ("new york", 3),
                ("nyc", 3),
                ("toronto", 2),
                ("vancouver", 2),
                ("montreal", 2),
                ("ottawa", 2),
                ("washington dc", 2),
                ("washington", 2),
                ("new jersey", 2),
                ("seattle", 3),
                ("remote", 1),
            ]),
            location_penalties: table(&[
                ("india", -10),
                ("china", -10),
                ("bangalore", -10),
                ("hyderabad", -10),
                ("delhi", -10),
                ("las vegas", -10),
                ("nevada", -10),
            ]),
            remote_bonus: 0,
        }
    }
}
