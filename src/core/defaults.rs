use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::replace::{title_case, ReplacementRule};
use crate::scanner::ContextLabel;

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE: &str = "rebrand.json";

/// Root configuration structure for rebrand.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebrandConfig {
    #[serde(default = "default_brand")]
    pub brand: BrandConfig,

    /// Per-context phrase tables. Derived from `brand` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_rules: Option<CustomRules>,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub backup: BackupConfig,
}

impl Default for RebrandConfig {
    fn default() -> Self {
        Self {
            brand: default_brand(),
            custom_rules: None,
            scan: ScanConfig::default(),
            backup: BackupConfig::default(),
        }
    }
}

/// The token being replaced and what it becomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    /// Brand as written in prose (TitleCase), e.g. `Resonance`.
    pub from: String,
    pub to: String,

    /// Suffix of the hyphenated package identifier (`resonance-next`).
    /// Empty disables the package rule.
    #[serde(default = "default_package_suffix")]
    pub package_suffix: String,
}

impl BrandConfig {
    pub fn package_from(&self) -> Option<String> {
        package_identifier(&self.from, &self.package_suffix)
    }

    pub fn package_to(&self) -> Option<String> {
        package_identifier(&self.to, &self.package_suffix)
    }
}

fn package_identifier(brand: &str, suffix: &str) -> Option<String> {
    if suffix.is_empty() {
        None
    } else {
        Some(format!("{}-{}", brand.to_lowercase(), suffix))
    }
}

/// Exact-phrase rules applied before the standard case variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRules {
    #[serde(default)]
    pub metadata: Vec<ReplacementRule>,
    #[serde(default)]
    pub content: Vec<ReplacementRule>,
    #[serde(default)]
    pub config: Vec<ReplacementRule>,
}

impl CustomRules {
    pub fn for_context(&self, context: ContextLabel) -> &[ReplacementRule] {
        match context {
            ContextLabel::Metadata => &self.metadata,
            ContextLabel::Content => &self.content,
            ContextLabel::Config => &self.config,
            ContextLabel::General => &[],
        }
    }

    /// Phrase tables for a brand: full titles for metadata, common prose
    /// fragments for content, and the package name for config.
    pub fn derived(brand: &BrandConfig) -> Self {
        let from = title_case(&brand.from);
        let to = title_case(&brand.to);
        let phrase = |template: &str| {
            ReplacementRule::exact(
                &template.replace("{}", &from),
                &template.replace("{}", &to),
            )
        };

        let mut config = Vec::new();
        if let (Some(pkg_from), Some(pkg_to)) = (brand.package_from(), brand.package_to()) {
            config.push(ReplacementRule::exact(&pkg_from, &pkg_to));
            config.push(ReplacementRule::exact(
                &format!("\"name\": \"{}\"", pkg_from),
                &format!("\"name\": \"{}\"", pkg_to),
            ));
        }

        Self {
            metadata: vec![phrase("{} - Modern"), phrase("{} Theme"), phrase("{} Portfolio")],
            content: vec![
                phrase("working with {}"),
                phrase("{} team"),
                phrase("{} company"),
            ],
            config,
        }
    }
}

/// What the scanner looks at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_scan_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_dirs: default_scan_exclude_dirs(),
        }
    }
}

/// Where whole-tree snapshots go and how many are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_backup_base_dir")]
    pub base_dir: PathBuf,

    #[serde(default = "default_snapshot_prefix")]
    pub prefix: String,

    #[serde(default = "default_snapshot_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    #[serde(default = "default_keep")]
    pub keep: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            base_dir: default_backup_base_dir(),
            prefix: default_snapshot_prefix(),
            exclude_dirs: default_snapshot_exclude_dirs(),
            keep: default_keep(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_brand() -> BrandConfig {
    BrandConfig {
        from: "Resonance".to_string(),
        to: "Evoleotion".to_string(),
        package_suffix: default_package_suffix(),
    }
}

fn default_package_suffix() -> String {
    "next".to_string()
}

fn default_extensions() -> Vec<String> {
    ["js", "jsx", "json", "css", "md"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_scan_exclude_dirs() -> Vec<String> {
    ["node_modules", ".git", ".next"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_backup_base_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_snapshot_prefix() -> String {
    "rebranding-backup".to_string()
}

fn default_snapshot_exclude_dirs() -> Vec<String> {
    ["node_modules", ".git", ".next", "backups"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_keep() -> usize {
    5
}

// =============================================================================
// Config helpers
// =============================================================================

impl RebrandConfig {
    /// Built-in defaults with a different brand pair.
    pub fn with_brand(from: &str, to: &str) -> Self {
        let mut config = Self::default();
        config.brand.from = from.to_string();
        config.brand.to = to.to_string();
        config
    }

    /// Explicit phrase tables, or the ones derived from the brand.
    pub fn custom_rules(&self) -> CustomRules {
        self.custom_rules
            .clone()
            .unwrap_or_else(|| CustomRules::derived(&self.brand))
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.brand.from.is_empty() {
            return Err(crate::Error::config_invalid_value(
                "brand.from",
                None,
                "must not be empty",
            ));
        }
        if self.brand.to.is_empty() {
            return Err(crate::Error::config_invalid_value(
                "brand.to",
                None,
                "must not be empty",
            ));
        }

        if let Some(rules) = &self.custom_rules {
            for context in ContextLabel::ALL {
                for rule in rules.for_context(context) {
                    if rule.search.is_empty() {
                        return Err(crate::Error::config_invalid_value(
                            format!("custom_rules.{}", context),
                            Some(rule.replace.clone()),
                            "search must not be empty",
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load config from an explicit path, or `./rebrand.json` when present, or
/// the built-in defaults. An explicit path must exist and parse.
pub fn load_config(path: Option<&Path>) -> crate::Result<RebrandConfig> {
    let config = match path {
        Some(path) => load_config_from_file(path)?,
        None => {
            let fallback = Path::new(CONFIG_FILE);
            if fallback.exists() {
                load_config_from_file(fallback)?
            } else {
                RebrandConfig::default()
            }
        }
    };

    config.validate()?;
    Ok(config)
}

fn load_config_from_file(path: &Path) -> crate::Result<RebrandConfig> {
    if !path.exists() {
        return Err(crate::Error::config_missing_file(path.display().to_string()));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        crate::Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    serde_json::from_str(&content)
        .map_err(|e| crate::Error::config_invalid_json(path.display().to_string(), e))
}

/// Save config as pretty JSON (creates parent directories).
pub fn save_config(config: &RebrandConfig, path: &Path) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                crate::Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
            })?;
        }
    }

    let content = serde_json::to_string_pretty(config).map_err(|e| {
        crate::Error::internal_json(e.to_string(), Some("serialize rebrand.json".to_string()))
    })?;

    fs::write(path, content).map_err(|e| {
        crate::Error::internal_io(e.to_string(), Some(format!("write {}", path.display())))
    })
}

/// Get built-in defaults (ignoring any file config)
pub fn builtin_defaults() -> RebrandConfig {
    RebrandConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_builtin_brand() {
        let config = builtin_defaults();
        assert_eq!(config.brand.from, "Resonance");
        assert_eq!(config.brand.to, "Evoleotion");
        assert_eq!(config.brand.package_from().as_deref(), Some("resonance-next"));
        assert_eq!(config.brand.package_to().as_deref(), Some("evoleotion-next"));
        assert_eq!(config.scan.extensions, vec!["js", "jsx", "json", "css", "md"]);
        assert!(config.backup.exclude_dirs.contains(&"backups".to_string()));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rebrand.json");
        fs::write(&path, r#"{"brand": {"from": "Acme", "to": "Zenith"}}"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.brand.from, "Acme");
        assert_eq!(config.brand.package_suffix, "next");
        assert_eq!(config.backup.keep, 5);
        assert!(config.custom_rules.is_none());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/rebrand.json"))).unwrap_err();
        assert_eq!(err.code.as_str(), "config.missing_file");
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rebrand.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_json");
    }

    #[test]
    fn empty_custom_search_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rebrand.json");
        fs::write(
            &path,
            r#"{"custom_rules": {"content": [{"search": "", "replace": "x"}]}}"#,
        )
        .unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }

    #[test]
    fn derived_rules_follow_the_brand() {
        let config = RebrandConfig::with_brand("Acme", "Zenith");
        let rules = config.custom_rules();

        assert!(rules
            .metadata
            .contains(&ReplacementRule::exact("Acme Theme", "Zenith Theme")));
        assert!(rules
            .content
            .contains(&ReplacementRule::exact("Acme team", "Zenith team")));
        assert_eq!(rules.config[0], ReplacementRule::exact("acme-next", "zenith-next"));
        assert!(rules.for_context(ContextLabel::General).is_empty());
    }

    #[test]
    fn empty_suffix_drops_package_rules() {
        let mut config = builtin_defaults();
        config.brand.package_suffix = String::new();
        assert!(config.custom_rules().config.is_empty());
    }

    #[test]
    fn save_then_load_keeps_brand() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rebrand.json");

        save_config(&RebrandConfig::with_brand("Acme", "Zenith"), &path).unwrap();
        let loaded = load_config(Some(&path)).unwrap();

        assert_eq!(loaded.brand.to, "Zenith");
    }
}
