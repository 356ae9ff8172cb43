use regex::{Regex, RegexBuilder};

use lexrag_core::config::CitationSettings;
use lexrag_core::types::Candidate;

/// Finds the first article reference (`12. madde`, `madde 12`) across the
/// retrieved passages.
pub struct CitationFinder {
    number_first: Regex,
    word_first: Regex,
    source_label: String,
    article_word: String,
}

impl CitationFinder {
    pub fn new(settings: &CitationSettings) -> Result<Self, regex::Error> {
        let word = regex::escape(&settings.article_word);
        let build = |pattern: String| RegexBuilder::new(&pattern).case_insensitive(true).build();
        Ok(Self {
            number_first: build(format!(r"(\d{{1,3}})\.?\s*{word}"))?,
            word_first: build(format!(r"{word}\s*(\d{{1,3}})"))?,
            source_label: settings.source_label.clone(),
            article_word: settings.article_word.clone(),
        })
    }

    pub fn hint(&self, contexts: &[Candidate]) -> Option<String> {
        let merged = contexts.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" \n ");
        let caps = self.number_first.captures(&merged).or_else(|| self.word_first.captures(&merged))?;
        let number = caps.get(1)?.as_str();
        Some(format!("{} {} {}", self.source_label, self.article_word, number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finder() -> CitationFinder {
        CitationFinder::new(&CitationSettings::default()).unwrap()
    }

    #[test]
    fn number_before_word_is_preferred() {
        let contexts = vec![Candidate::new("Madde 7 bir şey söyler.", 1.0), Candidate::new("124. madde uyarınca", 0.5)];
        assert_eq!(finder().hint(&contexts).as_deref(), Some("Anayasa madde 124"));
    }

    #[test]
    fn word_before_number_is_found() {
        let contexts = vec![Candidate::new("Bu konu MADDE 3 ile düzenlenir.", 1.0)];
        assert_eq!(finder().hint(&contexts).as_deref(), Some("Anayasa madde 3"));
    }

    #[test]
    fn no_reference_no_hint() {
        assert_eq!(finder().hint(&[Candidate::new("Vergi beyannamesi Nisan'da verilir.", 1.0)]), None);
        assert_eq!(finder().hint(&[]), None);
    }
}
