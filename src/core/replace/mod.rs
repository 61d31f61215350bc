//! Replacement engine — context-aware brand substitution with validation.
//!
//! Rules run in a fixed order: the context's custom phrase rules first, so
//! multi-word phrases are rewritten whole, then the standard case variants
//! of the brand. If a validator is supplied and the rewritten text no longer
//! parses, the whole rewrite is discarded.

mod rules;
mod validate;

pub use rules::{case_variants, title_case, AppliedRule, CaseVariant, ReplacementRule, RuleKind};
pub use validate::{JsonValidator, Validator, ValidatorRegistry};

use serde::Serialize;
use std::path::Path;

use crate::defaults::{CustomRules, RebrandConfig};
use crate::error::Result;
use crate::scanner::{extension_of, ContextLabel};

/// Per-call options for [`Replacer::apply`].
#[derive(Clone, Copy, Default)]
pub struct ReplaceOptions<'a> {
    /// Structured-format check run on the rewritten content.
    pub validator: Option<&'a dyn Validator>,
}

impl<'a> ReplaceOptions<'a> {
    pub fn unchecked() -> Self {
        Self { validator: None }
    }

    pub fn validated(validator: &'a dyn Validator) -> Self {
        Self {
            validator: Some(validator),
        }
    }
}

/// Result of rewriting one piece of content.
///
/// When `success` is false, `updated_content` equals `original_content`.
#[derive(Debug, Clone, Serialize)]
pub struct ReplacementOutcome {
    #[serde(skip)]
    pub original_content: String,
    #[serde(skip)]
    pub updated_content: String,
    pub applied_rules: Vec<AppliedRule>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplacementOutcome {
    pub fn total_replacements(&self) -> usize {
        self.applied_rules.iter().map(|r| r.count).sum()
    }

    pub fn changed(&self) -> bool {
        self.updated_content != self.original_content
    }

    fn failed(original: &str, applied_rules: Vec<AppliedRule>, error: String) -> Self {
        Self {
            original_content: original.to_string(),
            updated_content: original.to_string(),
            applied_rules,
            success: false,
            error: Some(error),
        }
    }
}

/// Applies one brand configuration. Holds no mutable state, so one instance
/// can serve any number of files.
pub struct Replacer {
    custom: CustomRules,
    standard: Vec<CaseVariant>,
    validators: ValidatorRegistry,
}

impl Replacer {
    pub fn new(config: &RebrandConfig) -> Result<Self> {
        config.validate()?;

        let custom = config.custom_rules();
        let standard = case_variants(&config.brand);

        for context in ContextLabel::ALL {
            for rule in custom.for_context(context) {
                rule.validate()?;
            }
        }
        for variant in &standard {
            variant.rule.validate()?;
        }

        Ok(Self {
            custom,
            standard,
            validators: ValidatorRegistry::default(),
        })
    }

    pub fn with_validators(mut self, validators: ValidatorRegistry) -> Self {
        self.validators = validators;
        self
    }

    pub fn standard_rules(&self) -> &[CaseVariant] {
        &self.standard
    }

    pub fn custom_rules(&self) -> &CustomRules {
        &self.custom
    }

    /// Validator registered for the file's extension, if any.
    pub fn validator_for(&self, path: &Path) -> Option<&dyn Validator> {
        self.validators.get(&extension_of(path))
    }

    pub fn apply(
        &self,
        content: &str,
        context: ContextLabel,
        options: ReplaceOptions<'_>,
    ) -> ReplacementOutcome {
        let mut updated = content.to_string();
        let mut applied_rules = Vec::new();

        let custom = self
            .custom
            .for_context(context)
            .iter()
            .map(|rule| (RuleKind::Custom, rule));
        let standard = self.standard.iter().map(|v| (RuleKind::Standard, &v.rule));

        for (kind, rule) in custom.chain(standard) {
            match rule.apply(&updated) {
                Ok((_, 0)) => {}
                Ok((next, count)) => {
                    updated = next;
                    applied_rules.push(AppliedRule {
                        kind,
                        search: rule.search.clone(),
                        replace: rule.replace.clone(),
                        count,
                    });
                }
                Err(e) => return ReplacementOutcome::failed(content, applied_rules, e.to_string()),
            }
        }

        if let Some(validator) = options.validator {
            if let Err(e) = validator.validate(&updated) {
                return ReplacementOutcome::failed(
                    content,
                    applied_rules,
                    format!(
                        "{} syntax validation failed after replacement: {}",
                        validator.format(),
                        e
                    ),
                );
            }
        }

        ReplacementOutcome {
            original_content: content.to_string(),
            updated_content: updated,
            applied_rules,
            success: true,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replacer() -> Replacer {
        Replacer::new(&RebrandConfig::default()).unwrap()
    }

    #[test]
    fn general_context_uses_standard_rules() {
        let outcome = replacer().apply(
            "Welcome to Resonance theme by resonance team",
            ContextLabel::General,
            ReplaceOptions::unchecked(),
        );

        assert!(outcome.success);
        assert_eq!(
            outcome.updated_content,
            "Welcome to Evoleotion theme by evoleotion team"
        );
        assert_eq!(outcome.applied_rules.len(), 2);
        assert!(outcome.applied_rules.iter().all(|r| r.kind == RuleKind::Standard));
        assert_eq!(outcome.applied_rules[0].search, "Resonance");
        assert_eq!(outcome.applied_rules[1].search, "resonance");
    }

    #[test]
    fn every_case_variant_is_replaced() {
        let outcome = replacer().apply(
            "RESONANCE, Resonance, and resonance",
            ContextLabel::General,
            ReplaceOptions::unchecked(),
        );

        assert_eq!(outcome.updated_content, "EVOLEOTION, Evoleotion, and evoleotion");
        assert_eq!(outcome.applied_rules.len(), 3);
        assert!(outcome.applied_rules.iter().all(|r| r.count == 1));
    }

    #[test]
    fn package_identifier_and_all_cases_in_one_input() {
        let outcome = replacer().apply(
            "Resonance resonance RESONANCE resonance-next",
            ContextLabel::General,
            ReplaceOptions::unchecked(),
        );

        assert_eq!(
            outcome.updated_content,
            "Evoleotion evoleotion EVOLEOTION evoleotion-next"
        );
        let counts: Vec<(&str, usize)> = outcome
            .applied_rules
            .iter()
            .map(|r| (r.search.as_str(), r.count))
            .collect();
        // The package rule runs first, so the bare lowercase form is only
        // counted once even though it appears twice in the input.
        assert_eq!(
            counts,
            vec![
                ("resonance-next", 1),
                ("Resonance", 1),
                ("resonance", 1),
                ("RESONANCE", 1),
            ]
        );
    }

    #[test]
    fn custom_phrases_apply_before_standard_rules() {
        let outcome = replacer().apply(
            "Resonance - Modern",
            ContextLabel::Metadata,
            ReplaceOptions::unchecked(),
        );

        assert_eq!(outcome.updated_content, "Evoleotion - Modern");
        assert_eq!(outcome.applied_rules.len(), 1);
        assert_eq!(outcome.applied_rules[0].kind, RuleKind::Custom);
    }

    #[test]
    fn zero_count_rules_are_omitted() {
        let outcome = replacer().apply(
            "This is a clean file with no branding references",
            ContextLabel::Content,
            ReplaceOptions::unchecked(),
        );

        assert!(outcome.success);
        assert!(outcome.applied_rules.is_empty());
        assert!(!outcome.changed());
    }

    #[test]
    fn empty_content_is_a_no_op() {
        let outcome = replacer().apply("", ContextLabel::General, ReplaceOptions::unchecked());
        assert!(outcome.success);
        assert_eq!(outcome.updated_content, "");
    }

    #[test]
    fn config_json_stays_valid_and_renames_package() {
        let outcome = replacer().apply(
            r#"{"name": "resonance-next", "description": "Resonance theme"}"#,
            ContextLabel::Config,
            ReplaceOptions::validated(&JsonValidator),
        );

        assert!(outcome.success);
        let parsed: serde_json::Value = serde_json::from_str(&outcome.updated_content).unwrap();
        assert_eq!(parsed["name"], "evoleotion-next");
        assert_eq!(parsed["description"], "Evoleotion theme");
    }

    #[test]
    fn invalid_json_reverts_everything() {
        let original = r#"{"name": "resonance-next", "description": "Resonance theme""#;
        let outcome = replacer().apply(
            original,
            ContextLabel::Config,
            ReplaceOptions::validated(&JsonValidator),
        );

        assert!(!outcome.success);
        assert_eq!(outcome.updated_content, original);
        assert!(outcome
            .error
            .as_deref()
            .unwrap()
            .starts_with("JSON syntax validation failed after replacement"));
    }

    #[test]
    fn rebranded_content_is_left_alone() {
        let r = replacer();
        let first = r.apply(
            "Resonance Portfolio by resonance-next and RESONANCE",
            ContextLabel::Metadata,
            ReplaceOptions::unchecked(),
        );
        let second = r.apply(
            &first.updated_content,
            ContextLabel::Metadata,
            ReplaceOptions::unchecked(),
        );

        assert!(second.applied_rules.is_empty());
        assert_eq!(second.updated_content, first.updated_content);
    }

    #[test]
    fn large_content_counts_every_occurrence() {
        let content = format!("{}end", "Resonance ".repeat(10000));
        let outcome = replacer().apply(&content, ContextLabel::General, ReplaceOptions::unchecked());

        assert_eq!(outcome.applied_rules[0].count, 10000);
        assert_eq!(outcome.total_replacements(), 10000);
    }

    #[test]
    fn separate_configs_do_not_interfere() {
        let acme = Replacer::new(&RebrandConfig::with_brand("Acme", "Zenith")).unwrap();
        let default = replacer();

        let a = acme.apply("Acme and Resonance", ContextLabel::General, ReplaceOptions::unchecked());
        let b = default.apply("Acme and Resonance", ContextLabel::General, ReplaceOptions::unchecked());

        assert_eq!(a.updated_content, "Zenith and Resonance");
        assert_eq!(b.updated_content, "Acme and Evoleotion");
    }

    #[test]
    fn validator_is_picked_by_extension() {
        let r = replacer();
        assert!(r.validator_for(Path::new("package.json")).is_some());
        assert!(r.validator_for(Path::new("index.js")).is_none());
    }
}
