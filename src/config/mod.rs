// src/config/mod.rs - External configuration: rule toggles and vocabulary

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

use crate::classifier::rules;
use crate::classifier::vocabulary::VocabularyTable;
use crate::types::RuleToggles;

const RULES_FILE: &str = "rules.yaml";
const VOCABULARY_FILE: &str = "vocabulary.yaml";

/// Validation issues worth surfacing to the operator. None of these abort
/// loading: a misconfigured rule degrades to "never matches".
#[derive(Debug, Error)]
pub enum ConfigIssue {
    #[error("unknown rule key '{0}'")]
    UnknownRuleKey(String),
    #[error("vocabulary entry #{0} must map exactly one word to one replacement")]
    MalformedVocabularyEntry(usize),
}

/// On-disk shape of rules.yaml. Rules absent from the map stay enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub rules: HashMap<String, bool>,

    /// Sender names the bot-message rule redirects unconditionally.
    #[serde(default = "default_bot_names")]
    pub bot_names: Vec<String>,
}

fn default_bot_names() -> Vec<String> {
    vec!["streamelements".to_string()]
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            rules: HashMap::new(),
            bot_names: default_bot_names(),
        }
    }
}

impl RulesConfig {
    pub fn toggles(&self) -> RuleToggles {
        RuleToggles::from_map(self.rules.clone())
    }
}

/// On-disk shape of vocabulary.yaml: a sequence of single-key mappings, so
/// the file reads as a plain word list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularyConfig {
    #[serde(default)]
    pub vocabulary: Vec<HashMap<String, String>>,
}

/// Loads the classifier's external configuration from a directory, writing
/// defaults for files that do not exist yet.
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    /// Load rules.yaml, creating a default file when missing.
    pub async fn load_rules(&self) -> Result<RulesConfig> {
        let path = self.config_dir.join(RULES_FILE);
        if !path.exists() {
            let default = RulesConfig::default();
            self.write_default(&path, &default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: RulesConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?;

        for issue in validate_rules(&config) {
            warn!("{}: {}", path.display(), issue);
        }
        info!(
            "Loaded rule configuration: {} explicit toggles, {} bot names",
            config.rules.len(),
            config.bot_names.len()
        );
        Ok(config)
    }

    /// Load vocabulary.yaml into a lookup table. A missing file leaves the
    /// highlight rule inert rather than failing startup.
    pub async fn load_vocabulary(&self) -> Result<VocabularyTable> {
        let path = self.config_dir.join(VOCABULARY_FILE);
        if !path.exists() {
            warn!(
                "{} not found - vocabulary highlighting disabled",
                path.display()
            );
            return Ok(VocabularyTable::empty());
        }

        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: VocabularyConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?;

        let (pairs, issues) = vocabulary_pairs(&config);
        for issue in issues {
            warn!("{}: {}", path.display(), issue);
        }

        let table = VocabularyTable::from_pairs(pairs);
        info!("Loaded {} vocabulary entries", table.len());
        Ok(table)
    }

    async fn write_default<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.config_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.config_dir.display()))?;
        let content = serde_yaml::to_string(value)?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote default configuration to {}", path.display());
        Ok(())
    }
}

/// Report rule keys that match no registered rule.
fn validate_rules(config: &RulesConfig) -> Vec<ConfigIssue> {
    config
        .rules
        .keys()
        .filter(|key| {
            rules::registry()
                .iter()
                .all(|rule| rule.key.as_str() != key.as_str())
        })
        .map(|key| ConfigIssue::UnknownRuleKey(key.clone()))
        .collect()
}

/// Flatten the single-key mappings into ordered pairs, so later duplicates
/// override earlier ones when the table is built.
fn vocabulary_pairs(config: &VocabularyConfig) -> (Vec<(String, String)>, Vec<ConfigIssue>) {
    let mut pairs = Vec::new();
    let mut issues = Vec::new();
    for (index, entry) in config.vocabulary.iter().enumerate() {
        if entry.len() != 1 {
            issues.push(ConfigIssue::MalformedVocabularyEntry(index));
            continue;
        }
        if let Some((word, suggestion)) = entry.iter().next() {
            pairs.push((word.clone(), suggestion.clone()));
        }
    }
    (pairs, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RuleKey;

    async fn manager_with(file: &str, content: &str) -> (tempfile::TempDir, ConfigManager) {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(file), content)
            .await
            .unwrap();
        let manager = ConfigManager::new(dir.path());
        (dir, manager)
    }

    #[tokio::test]
    async fn loads_rule_toggles() {
        let (_dir, manager) = manager_with(
            RULES_FILE,
            "rules:\n  copypasta: false\n  link: true\nbot_names:\n  - streamelements\n  - nightbot\n",
        )
        .await;

        let config = manager.load_rules().await.unwrap();
        let toggles = config.toggles();
        assert!(!toggles.is_enabled(RuleKey::Copypasta));
        assert!(toggles.is_enabled(RuleKey::Link));
        // unlisted rules stay enabled
        assert!(toggles.is_enabled(RuleKey::Gibberish));
        assert_eq!(config.bot_names.len(), 2);
    }

    #[tokio::test]
    async fn missing_rules_file_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::new(dir.path());

        let config = manager.load_rules().await.unwrap();
        assert_eq!(config.bot_names, vec!["streamelements".to_string()]);
        assert!(dir.path().join(RULES_FILE).exists());
    }

    #[tokio::test]
    async fn unknown_rule_keys_are_reported_not_fatal() {
        let (_dir, manager) = manager_with(RULES_FILE, "rules:\n  not_a_rule: true\n").await;
        let config = manager.load_rules().await.unwrap();
        let issues = validate_rules(&config);
        assert_eq!(issues.len(), 1);
    }

    #[tokio::test]
    async fn loads_vocabulary_pairs_in_order() {
        let (_dir, manager) = manager_with(
            VOCABULARY_FILE,
            "vocabulary:\n  - сало: мило\n  - Привет: привіт\n  - сало: шмало\n",
        )
        .await;

        let table = manager.load_vocabulary().await.unwrap();
        assert_eq!(table.len(), 2);
        // keys fold to lowercase; the later duplicate wins
        assert_eq!(table.suggestion_for("привет"), Some("привіт"));
        assert_eq!(table.suggestion_for("сало"), Some("шмало"));
    }

    #[tokio::test]
    async fn missing_vocabulary_is_inert() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::new(dir.path());
        let table = manager.load_vocabulary().await.unwrap();
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn malformed_vocabulary_entries_are_skipped() {
        let (_dir, manager) = manager_with(
            VOCABULARY_FILE,
            "vocabulary:\n  - сало: мило\n  - двоє: слів\n    разом: тут\n",
        )
        .await;

        let table = manager.load_vocabulary().await.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.suggestion_for("сало"), Some("мило"));
    }
}
