use heck::ToUpperCamelCase;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::defaults::BrandConfig;
use crate::error::{Error, Result};

/// One search/replace pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementRule {
    pub search: String,
    pub replace: String,
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
}

fn default_case_sensitive() -> bool {
    true
}

impl ReplacementRule {
    /// Case-sensitive exact substring rule.
    pub fn exact(search: &str, replace: &str) -> Self {
        Self {
            search: search.to_string(),
            replace: replace.to_string(),
            case_sensitive: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.is_empty() {
            return Err(Error::validation_invalid_argument(
                "search",
                "Replacement rule search must not be empty",
                Some(self.replace.clone()),
                None,
            ));
        }
        Ok(())
    }

    /// Replace every non-overlapping occurrence. Returns the new text and
    /// how many occurrences were replaced.
    pub fn apply(&self, text: &str) -> Result<(String, usize)> {
        if self.case_sensitive {
            let count = text.matches(self.search.as_str()).count();
            if count == 0 {
                return Ok((text.to_string(), 0));
            }
            return Ok((text.replace(self.search.as_str(), &self.replace), count));
        }

        let re = RegexBuilder::new(&regex::escape(&self.search))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::internal_unexpected(e.to_string()))?;

        let count = re.find_iter(text).count();
        if count == 0 {
            return Ok((text.to_string(), 0));
        }
        let replaced = re.replace_all(text, regex::NoExpand(&self.replace));
        Ok((replaced.into_owned(), count))
    }
}

/// Whether a rule came from a context phrase table or the brand variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Custom,
    Standard,
}

/// A rule that matched at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRule {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub search: String,
    pub replace: String,
    pub count: usize,
}

/// A standard rule for one case form of the brand.
#[derive(Debug, Clone, Serialize)]
pub struct CaseVariant {
    pub label: String,
    pub rule: ReplacementRule,
}

/// TitleCase form of a brand. Forms that already start uppercase are kept
/// as written so `CodeSage` stays `CodeSage`.
pub fn title_case(s: &str) -> String {
    if s.chars().next().is_some_and(char::is_uppercase) {
        s.to_string()
    } else {
        s.to_upper_camel_case()
    }
}

/// The standard rules for a brand, in application order.
///
/// The package identifier goes first: it contains the lowercase form, so
/// applying it later would leave it nothing to match.
pub fn case_variants(brand: &BrandConfig) -> Vec<CaseVariant> {
    let mut variants = Vec::new();

    if let (Some(from), Some(to)) = (brand.package_from(), brand.package_to()) {
        variants.push(CaseVariant {
            label: "package".to_string(),
            rule: ReplacementRule::exact(&from, &to),
        });
    }
    variants.push(CaseVariant {
        label: "TitleCase".to_string(),
        rule: ReplacementRule::exact(&title_case(&brand.from), &title_case(&brand.to)),
    });
    variants.push(CaseVariant {
        label: "lowercase".to_string(),
        rule: ReplacementRule::exact(&brand.from.to_lowercase(), &brand.to.to_lowercase()),
    });
    variants.push(CaseVariant {
        label: "UPPERCASE".to_string(),
        rule: ReplacementRule::exact(&brand.from.to_uppercase(), &brand.to.to_uppercase()),
    });

    // Brands like "acme" collapse TitleCase/lowercase when already cased
    let mut seen = std::collections::HashSet::new();
    variants.retain(|v| !v.rule.search.is_empty() && seen.insert(v.rule.search.clone()));
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brand(from: &str, to: &str) -> BrandConfig {
        BrandConfig {
            from: from.to_string(),
            to: to.to_string(),
            package_suffix: "next".to_string(),
        }
    }

    #[test]
    fn title_case_capitalizes_lowercase_input() {
        assert_eq!(title_case("resonance"), "Resonance");
        assert_eq!(title_case("CodeSage"), "CodeSage");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn variants_cover_four_forms_in_order() {
        let variants = case_variants(&brand("Resonance", "Evoleotion"));
        let pairs: Vec<(&str, &str)> = variants
            .iter()
            .map(|v| (v.rule.search.as_str(), v.rule.replace.as_str()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("resonance-next", "evoleotion-next"),
                ("Resonance", "Evoleotion"),
                ("resonance", "evoleotion"),
                ("RESONANCE", "EVOLEOTION"),
            ]
        );
    }

    #[test]
    fn variants_without_suffix_skip_package() {
        let mut b = brand("Resonance", "Evoleotion");
        b.package_suffix = String::new();
        let labels: Vec<_> = case_variants(&b).into_iter().map(|v| v.label).collect();
        assert_eq!(labels, vec!["TitleCase", "lowercase", "UPPERCASE"]);
    }

    #[test]
    fn exact_rule_counts_and_replaces_globally() {
        let rule = ReplacementRule::exact("Resonance", "Evoleotion");
        let (text, count) = rule.apply("Resonance, Resonance and resonance").unwrap();
        assert_eq!(text, "Evoleotion, Evoleotion and resonance");
        assert_eq!(count, 2);
    }

    #[test]
    fn case_insensitive_rule_treats_replacement_literally() {
        let rule = ReplacementRule {
            search: "acme".to_string(),
            replace: "$1 Zenith".to_string(),
            case_sensitive: false,
        };
        let (text, count) = rule.apply("ACME and Acme").unwrap();
        assert_eq!(text, "$1 Zenith and $1 Zenith");
        assert_eq!(count, 2);
    }

    #[test]
    fn empty_search_fails_validation() {
        assert!(ReplacementRule::exact("", "x").validate().is_err());
        assert!(ReplacementRule::exact("a", "").validate().is_ok());
    }

    #[test]
    fn rule_deserializes_with_default_case_sensitivity() {
        let rule: ReplacementRule =
            serde_json::from_str(r#"{"search": "Acme Inc", "replace": "Zenith Inc"}"#).unwrap();
        assert!(rule.case_sensitive);
    }
}
