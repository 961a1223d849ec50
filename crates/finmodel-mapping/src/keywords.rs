//! Keyword extraction for fuzzy field matching.
//!
//! Identifiers (`NetIncomeLoss`) are split on camel-case boundaries, display
//! names (`Research & Development`) on non-letters. Tokens are lowercased,
//! singularised, filtered through [`STOPWORDS`] and a minimum length, and
//! deduplicated keeping the first occurrence.

/// Words too common in income-statement labels to identify a line item.
pub const STOPWORDS: &[&str] = &[
    "and",
    "of",
    "the",
    "expense",
    "income",
    "loss",
    "benefit",
    "outstanding",
];

/// Tokens shorter than this are dropped.
pub const MIN_TOKEN_LEN: usize = 3;

/// Derives keyword tokens from identifier and display-name sources.
#[must_use]
pub fn derive_tokens(sources: &[&str]) -> Vec<String> {
    let mut tokens = Vec::new();
    for source in sources {
        for word in split_words(source) {
            let token = singular(&word.to_ascii_lowercase());
            if token.len() < MIN_TOKEN_LEN || STOPWORDS.contains(&token.as_str()) {
                continue;
            }
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
    }
    tokens
}

/// Normalises an explicit keyword set: lowercased, trimmed, deduplicated.
///
/// Explicit keywords bypass stopword filtering.
#[must_use]
pub fn explicit_tokens(keywords: &[String]) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        let token = keyword.trim().to_ascii_lowercase();
        if !token.is_empty() && !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// Counts how many tokens occur as substrings of `field` (ASCII case-insensitive).
#[must_use]
pub fn count_matches(tokens: &[String], field: &str) -> usize {
    let field = field.to_ascii_lowercase();
    tokens.iter().filter(|t| field.contains(t.as_str())).count()
}

/// Splits text into alphabetic words.
///
/// Non-letters separate words; inside a run of letters a new word starts at
/// a lower-to-upper transition (`netIncome`) and before the last capital of
/// an acronym followed by lowercase (`EPSGrowth` -> `EPS`, `Growth`).
#[must_use]
pub fn split_words(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphabetic() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_ascii_uppercase() && !current.is_empty() {
            let prev_lower = chars[i - 1].is_ascii_lowercase();
            let acronym_end = chars[i - 1].is_ascii_uppercase()
                && chars.get(i + 1).is_some_and(char::is_ascii_lowercase);
            if prev_lower || acronym_end {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Reduces a lowercase plural word to its singular form.
#[must_use]
pub fn singular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("xes") {
        return format!("{stem}x");
    }
    if word.len() > 4
        && let Some(stem) = word.strip_suffix("ies")
    {
        return format!("{stem}y");
    }
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}
