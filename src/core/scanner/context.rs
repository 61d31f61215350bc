//! Line-local context classification.
//!
//! Every occurrence of the brand token is labelled by looking only at the
//! line it sits on. The classifier is an ordered list of predicates; the
//! first one that matches decides the label.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where in a file an occurrence was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextLabel {
    Metadata,
    Content,
    Config,
    General,
}

impl ContextLabel {
    pub const ALL: [ContextLabel; 4] = [
        ContextLabel::Metadata,
        ContextLabel::Content,
        ContextLabel::Config,
        ContextLabel::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextLabel::Metadata => "metadata",
            ContextLabel::Content => "content",
            ContextLabel::Config => "config",
            ContextLabel::General => "general",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "metadata" => Ok(ContextLabel::Metadata),
            "content" => Ok(ContextLabel::Content),
            "config" => Ok(ContextLabel::Config),
            "general" => Ok(ContextLabel::General),
            _ => Err(Error::validation_invalid_argument(
                "context",
                format!(
                    "Unknown context '{}'. Use: metadata, content, config, general",
                    s
                ),
                None,
                None,
            )),
        }
    }
}

impl std::fmt::Display for ContextLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Predicate {
    /// Regex evaluated against the raw line.
    Pattern(Regex),
    /// Any of these substrings present in the lowercased line.
    LowercaseContains(&'static [&'static str]),
}

impl Predicate {
    fn matches(&self, line: &str, lowercase: &str) -> bool {
        match self {
            Predicate::Pattern(re) => re.is_match(line),
            Predicate::LowercaseContains(needles) => needles.iter().any(|n| lowercase.contains(n)),
        }
    }
}

struct ClassifierRule {
    label: ContextLabel,
    predicate: Predicate,
}

/// Ordered, first-match-wins context classifier for one brand token.
pub struct ContextClassifier {
    rules: Vec<ClassifierRule>,
}

const METADATA_KEYS: &str = "title|description|name|author";
const CONTENT_KEYS: &str = "text|content|message|testimonial";
const CONFIG_KEYS: &str = "name|projectName|appName";

/// `key` (optionally quoted) followed by `:` or `=` and a quoted string
/// containing `token`. Keys must start on a word boundary, so `appName` is not
/// read as `name`.
fn field_pattern(keys: &str, token: &str) -> Result<Regex> {
    let pattern = format!(
        r#"(?i)\b(?:{})['"]?\s*[:=]\s*['"][^'"]*{}[^'"]*['"]"#,
        keys,
        regex::escape(token)
    );
    Regex::new(&pattern).map_err(|e| Error::internal_unexpected(e.to_string()))
}

impl ContextClassifier {
    pub fn for_token(token: &str) -> Result<Self> {
        let rules = vec![
            ClassifierRule {
                label: ContextLabel::Metadata,
                predicate: Predicate::Pattern(field_pattern(METADATA_KEYS, token)?),
            },
            ClassifierRule {
                label: ContextLabel::Content,
                predicate: Predicate::Pattern(field_pattern(CONTENT_KEYS, token)?),
            },
            ClassifierRule {
                label: ContextLabel::Config,
                predicate: Predicate::Pattern(field_pattern(CONFIG_KEYS, &token.to_lowercase())?),
            },
            ClassifierRule {
                label: ContextLabel::Metadata,
                predicate: Predicate::LowercaseContains(&["title", "description", "name"]),
            },
            ClassifierRule {
                label: ContextLabel::Config,
                predicate: Predicate::LowercaseContains(&["\"name\"", "'name'"]),
            },
        ];

        Ok(Self { rules })
    }

    /// Label a single line. Never looks at neighbouring lines.
    pub fn classify(&self, line: &str) -> ContextLabel {
        let lowercase = line.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(line, &lowercase))
            .map(|rule| rule.label)
            .unwrap_or(ContextLabel::General)
    }
}
