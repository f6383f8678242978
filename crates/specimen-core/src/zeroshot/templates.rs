//! Prompt templates for class text embeddings.
//!
//! Each label is phrased several ways and the resulting embeddings are
//! averaged, which is more robust than a single "a photo of a {label}".
//! Order and wording are fixed: the class bank cache depends on them.

/// Placeholder replaced by the label.
const PLACEHOLDER: &str = "{c}";

/// The prompt templates, in averaging order.
pub const PROMPT_TEMPLATES: [&str; 6] = [
    "a photo of a {c}.",
    "a close-up photo of a {c}.",
    "a photo of the {c}.",
    "the {c} in the wild.",
    "a specimen of {c}.",
    "it is a {c}.",
];

/// Number of prompts generated per label.
pub const TEMPLATE_COUNT: usize = PROMPT_TEMPLATES.len();

/// Expand a label into its prompts, in template order.
pub fn expand(label: &str) -> Vec<String> {
    PROMPT_TEMPLATES
        .iter()
        .map(|t| t.replace(PLACEHOLDER, label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_count_and_order() {
        let prompts = expand("monarch butterfly");
        assert_eq!(prompts.len(), TEMPLATE_COUNT);
        assert_eq!(prompts[0], "a photo of a monarch butterfly.");
        assert_eq!(prompts[3], "the monarch butterfly in the wild.");
        assert_eq!(prompts[5], "it is a monarch butterfly.");
    }

    #[test]
    fn test_expand_is_deterministic() {
        assert_eq!(expand("bee"), expand("bee"));
    }

    #[test]
    fn test_every_template_uses_label() {
        assert!(PROMPT_TEMPLATES.iter().all(|t| t.contains(PLACEHOLDER)));
        assert!(expand("fern").iter().all(|p| p.contains("fern")));
    }
}
