//! Named regex fragments usable as `{name:rule}` placeholders

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Fragment used for plain `{name}` placeholders and unknown rules
pub const DEFAULT_RULE: &str = "[^/]+";

static RULES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("default", DEFAULT_RULE),
        ("slug", r"[a-z0-9\-_]+"),
        ("int", r"\d+"),
        ("id", r"\d+"),
    ])
});

/// Regex fragment for a rule name; unknown names fall back to the default
pub fn rule_pattern(rule: &str) -> &'static str {
    RULES.get(rule).copied().unwrap_or(DEFAULT_RULE)
}

/// Whether the rule name is one of the built-in rules
pub fn is_known_rule(rule: &str) -> bool {
    RULES.contains_key(rule)
}
