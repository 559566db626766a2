//! Singular forms of collection names.
//!
//! Rules are checked in order and the first match wins, so specific endings
//! come before the general `-ies` and `-s` rules.

use std::sync::LazyLock;

use regex::Regex;

const UNCOUNTABLE: [&str; 14] = [
    "data",
    "equipment",
    "feedback",
    "fish",
    "information",
    "media",
    "metadata",
    "news",
    "series",
    "sheep",
    "software",
    "species",
    "deer",
    "staff",
];

/// Irregular plural → singular.
const IRREGULAR: [(&str, &str); 12] = [
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("teeth", "tooth"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("oxen", "ox"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("indices", "index"),
    ("matrices", "matrix"),
];

static SINGULAR_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)(quiz)zes$", "${1}"),
        (r"(?i)(movie|twelve|abuse|e[mn]u)s$", "${1}"),
        (r"(?i)(analy|diagno|parenthe|progno|synop|the|empha|cri|ne)(?:sis|ses)$", "${1}sis"),
        (r"(?i)\b((?:tit)?m|l)ice$", "${1}ouse"),
        (r"(?i)(wi|kni|(?:after|half|high|low|mid|non|night|\b)li)ves$", "${1}fe"),
        (r"(?i)(ar|(?:wo|[ae])l|[eo][ao])ves$", "${1}f"),
        (
            r"(?i)(x|ch|ss|sh|zz|tto|go|cho|alias|[^aou]us|t[lm]as|gas|(?:her|at|gr)o|[aeiou]ris)(?:es)?$",
            "${1}",
        ),
        (r"(?i)\b(mon|smil)ies$", "${1}ey"),
        (r"(?i)(dg|ss|ois|lk|ok|wn|mb|th|ch|ec|oal|is|ck|ix|sser|ts|wb)ies$", "${1}ie"),
        (r"(?i)ies$", "y"),
        (r"(?i)s$", ""),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        let rule = Regex::new(pattern).expect("Invalid regex pattern for singular rule");
        (rule, replacement)
    })
    .collect()
});

/// Singular form of a plural English noun, keeping the leading capital.
///
/// Uncountable words and words without a plural ending come back unchanged.
pub fn singular(word: &str) -> String {
    let lower = word.to_lowercase();
    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, single)) = IRREGULAR.iter().find(|(plural, _)| *plural == lower) {
        return restore_case(word, single);
    }
    if IRREGULAR.iter().any(|(_, single)| *single == lower) {
        return word.to_string();
    }
    SINGULAR_RULES
        .iter()
        .find(|(rule, _)| rule.is_match(word))
        .map(|(rule, replacement)| rule.replace(word, *replacement).into_owned())
        .unwrap_or_else(|| word.to_string())
}

fn restore_case(original: &str, word: &str) -> String {
    let mut chars = word.chars();
    match (original.chars().next(), chars.next()) {
        (Some(first), Some(head)) if first.is_uppercase() => {
            head.to_uppercase().chain(chars).collect()
        }
        _ => word.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_plurals() {
        assert_eq!(singular("posts"), "post");
        assert_eq!(singular("pages"), "page");
        assert_eq!(singular("categories"), "category");
        assert_eq!(singular("stories"), "story");
        assert_eq!(singular("houses"), "house");
    }

    #[test]
    fn es_endings() {
        assert_eq!(singular("boxes"), "box");
        assert_eq!(singular("Branches"), "Branch");
        assert_eq!(singular("addresses"), "address");
        assert_eq!(singular("buses"), "bus");
        assert_eq!(singular("heroes"), "hero");
        assert_eq!(singular("potatoes"), "potato");
        assert_eq!(singular("quizzes"), "quiz");
    }

    #[test]
    fn ies_exceptions() {
        assert_eq!(singular("movies"), "movie");
        assert_eq!(singular("cookies"), "cookie");
        assert_eq!(singular("monies"), "money");
    }

    #[test]
    fn irregular_and_uncountable() {
        assert_eq!(singular("people"), "person");
        assert_eq!(singular("People"), "Person");
        assert_eq!(singular("children"), "child");
        assert_eq!(singular("person"), "person");
        assert_eq!(singular("news"), "news");
        assert_eq!(singular("series"), "series");
    }

    #[test]
    fn singular_words_unchanged() {
        assert_eq!(singular("page"), "page");
        assert_eq!(singular("status"), "status");
        assert_eq!(singular("analysis"), "analysis");
        assert_eq!(singular("hero"), "hero");
    }
}
