//! Default naming conventions.
//!
//! Database names get the configured environment suffix appended;
//! collection names are the English plural of the logical name, lower-cased.

use docrepo_core::config::DatabaseConfig;
use docrepo_core::traits::naming::NamingResolver;

/// Words whose plural is the word itself.
const UNCOUNTABLE: &[&str] = &[
    "data",
    "deer",
    "equipment",
    "feedback",
    "fish",
    "information",
    "metadata",
    "money",
    "news",
    "police",
    "rice",
    "series",
    "sheep",
    "species",
];

/// Singular/plural pairs that follow no suffix rule.
const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("index", "indices"),
    ("man", "men"),
    ("matrix", "matrices"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("person", "people"),
    ("quiz", "quizzes"),
    ("tooth", "teeth"),
    ("vertex", "vertices"),
    ("woman", "women"),
];

/// Words ending in `f` that pluralize to `ves`.
const F_TO_VES: &[&str] = &[
    "calf", "elf", "half", "leaf", "loaf", "self", "sheaf", "shelf", "thief", "wolf",
];

/// Words ending in consonant + `o` that take `es`.
const O_TO_OES: &[&str] = &["echo", "hero", "potato", "tomato", "torpedo", "veto"];

/// Appends the environment suffix and pluralizes collection names.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNamingResolver;

impl DefaultNamingResolver {
    /// Create the default resolver.
    pub fn new() -> Self {
        Self
    }
}

impl NamingResolver for DefaultNamingResolver {
    fn database_name(&self, config: &DatabaseConfig, logical_name: &str) -> String {
        format!("{logical_name}{}", config.environment_suffix)
    }

    fn collection_name(&self, logical_name: &str) -> String {
        pluralize(logical_name).to_lowercase()
    }
}

/// English plural of `name`, pluralizing only its last word.
///
/// Word boundaries are case transitions (`OrderItem`) and the separators
/// `_`, `-` and space. The prefix is kept as is.
pub fn pluralize(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let split = last_word_start(name);
    let (prefix, word) = name.split_at(split);
    format!("{prefix}{}", pluralize_word(word))
}

fn last_word_start(name: &str) -> usize {
    let mut start = 0;
    let mut prev: Option<char> = None;
    for (idx, ch) in name.char_indices() {
        match prev {
            Some(p) if matches!(p, '_' | '-' | ' ') => start = idx,
            Some(p) if ch.is_uppercase() && !p.is_uppercase() => start = idx,
            _ => {}
        }
        prev = Some(ch);
    }
    start
}

fn pluralize_word(word: &str) -> String {
    let lower = word.to_lowercase();

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
        return with_leading_case(word, plural);
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(_, plural)| *plural == lower) {
        return with_leading_case(word, plural);
    }

    let stem_len = word.len();
    if lower.ends_with("sis") {
        return format!("{}es", &word[..stem_len - 2]);
    }
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{word}es");
    }
    if lower.ends_with('y') && !ends_with_vowel_then(&lower, 'y') {
        return format!("{}ies", &word[..stem_len - 1]);
    }
    if lower.ends_with("fe") {
        return format!("{}ves", &word[..stem_len - 2]);
    }
    if F_TO_VES.contains(&lower.as_str()) {
        return format!("{}ves", &word[..stem_len - 1]);
    }
    if O_TO_OES.contains(&lower.as_str()) {
        return format!("{word}es");
    }
    format!("{word}s")
}

fn ends_with_vowel_then(lower: &str, last: char) -> bool {
    let mut chars = lower.chars().rev();
    match (chars.next(), chars.next()) {
        (Some(l), Some(before)) if l == last => matches!(before, 'a' | 'e' | 'i' | 'o' | 'u'),
        _ => false,
    }
}

fn with_leading_case(original: &str, replacement: &str) -> String {
    let mut chars = replacement.chars();
    match (original.chars().next(), chars.next()) {
        (Some(o), Some(first)) if o.is_uppercase() => {
            first.to_uppercase().chain(chars).collect()
        }
        _ => replacement.to_string(),
    }
}
