//! Rule Store.
//!
//! Every read goes to disk so the dispatch engine always sees the latest
//! admin writes, including hand edits made while the process is running.
//! Read-modify-write cycles are serialized by an in-process mutex; each
//! successful write bumps a revision counter observable through
//! [`RuleStore::subscribe`].
//!
//! Records are decoded one at a time. A record that does not decode is
//! skipped on read and written back untouched, in place, on the next write.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use voxrule_core::{Response, Rule, RuleDraft, Settings, Timestamp};

use crate::error::StoreError;
use crate::file::{read_json, write_json_atomic};

/// One element of the rules file.
#[derive(Serialize)]
#[serde(untagged)]
enum Record {
    Rule(Rule),
    Undecodable(serde_json::Value),
}

/// JSON-file backed rule and settings store.
pub struct RuleStore {
    rules_path: PathBuf,
    settings_path: PathBuf,
    write_lock: Mutex<()>,
    revision: watch::Sender<u64>,
}

impl RuleStore {
    /// Open the store, creating an empty rules file and a default settings
    /// file when they are missing.
    pub fn open(rules_path: &Path, settings_path: &Path) -> Result<Self, StoreError> {
        let (revision, _) = watch::channel(0);
        let store = Self {
            rules_path: rules_path.to_path_buf(),
            settings_path: settings_path.to_path_buf(),
            write_lock: Mutex::new(()),
            revision,
        };

        if !store.rules_path.exists() {
            write_json_atomic(&store.rules_path, &Vec::<Rule>::new())?;
        }
        if !store.settings_path.exists() {
            write_json_atomic(&store.settings_path, &Settings::default())?;
        }

        info!(
            rules = %store.rules_path.display(),
            settings = %store.settings_path.display(),
            "Rule store opened"
        );
        Ok(store)
    }

    pub fn rules_path(&self) -> &Path {
        &self.rules_path
    }

    /// All decodable rules in store order.
    pub fn list(&self) -> Result<Vec<Rule>, StoreError> {
        Ok(self
            .load()?
            .into_iter()
            .filter_map(|record| match record {
                Record::Rule(rule) => Some(rule),
                Record::Undecodable(_) => None,
            })
            .collect())
    }

    /// Enabled rules in store order. This is the snapshot the engine matches
    /// against.
    pub fn enabled_rules(&self) -> Result<Vec<Rule>, StoreError> {
        let mut rules = self.list()?;
        rules.retain(|r| r.enabled);
        Ok(rules)
    }

    pub fn get(&self, id: Uuid) -> Result<Rule, StoreError> {
        self.list()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Append a new rule. Rejects a `(type, keyword)` pair already used by
    /// any rule, enabled or not.
    pub fn create(&self, draft: RuleDraft) -> Result<Rule, StoreError> {
        validate_draft(&draft)?;
        self.modify(|rules| {
            check_unique(rules, &draft, None)?;
            let rule = draft.into_rule();
            rules.push(rule.clone());
            info!(rule_id = %rule.id, trigger = %rule.trigger.trigger_type, keyword = %rule.trigger.keyword, "Rule created");
            Ok(rule)
        })
    }

    /// Replace a rule's content, keeping its id and creation time.
    pub fn update(&self, id: Uuid, draft: RuleDraft) -> Result<Rule, StoreError> {
        validate_draft(&draft)?;
        self.modify(|rules| {
            let index = rules
                .iter()
                .position(|r| r.id == id)
                .ok_or(StoreError::NotFound(id))?;
            check_unique(rules, &draft, Some(id))?;

            let existing = &rules[index];
            let updated = Rule {
                id: existing.id,
                created_at: existing.created_at,
                updated_at: Some(Timestamp::now()),
                trigger: draft.trigger,
                response: draft.response,
                enabled: draft.enabled,
                description: draft.description,
            };
            rules[index] = updated.clone();
            info!(rule_id = %id, "Rule updated");
            Ok(updated)
        })
    }

    pub fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.modify(|rules| {
            let before = rules.len();
            rules.retain(|r| r.id != id);
            if rules.len() == before {
                return Err(StoreError::NotFound(id));
            }
            info!(rule_id = %id, "Rule deleted");
            Ok(())
        })
    }

    /// Flip a rule's `enabled` flag in place.
    pub fn set_enabled(&self, id: Uuid, enabled: bool) -> Result<Rule, StoreError> {
        self.modify(|rules| {
            let rule = rules
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or(StoreError::NotFound(id))?;
            rule.enabled = enabled;
            rule.updated_at = Some(Timestamp::now());
            info!(rule_id = %id, enabled, "Rule toggled");
            Ok(rule.clone())
        })
    }

    /// Current settings. A missing or unreadable settings file yields the
    /// defaults.
    pub fn settings(&self) -> Settings {
        match read_json(&self.settings_path) {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read settings, using defaults");
                Settings::default()
            }
        }
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        write_json_atomic(&self.settings_path, settings)?;
        self.bump();
        info!("Settings saved");
        Ok(())
    }

    /// Signal subscribers that the on-disk state may have changed outside
    /// this process. Returns the new revision.
    pub fn reload(&self) -> u64 {
        self.bump();
        let revision = self.revision();
        info!(revision, "Rule store reload requested");
        revision
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Receive the revision number after every write or reload.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    fn load(&self) -> Result<Vec<Record>, StoreError> {
        let raw: Vec<serde_json::Value> = read_json(&self.rules_path)?.unwrap_or_default();
        Ok(raw
            .into_iter()
            .enumerate()
            .map(|(index, value)| match Rule::deserialize(&value) {
                Ok(rule) => Record::Rule(rule),
                Err(e) => {
                    warn!(
                        path = %self.rules_path.display(),
                        index,
                        error = %e,
                        "Skipping undecodable rule record"
                    );
                    Record::Undecodable(value)
                }
            })
            .collect())
    }

    /// Run a read-modify-write cycle under the write lock. The file is only
    /// rewritten when `f` succeeds.
    ///
    /// `f` sees the decodable rules only. It may edit them in place, remove
    /// them, or append new ones; undecodable records keep their position.
    fn modify<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Vec<Rule>) -> Result<T, StoreError>,
    {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let records = self.load()?;
        let mut rules: Vec<Rule> = records
            .iter()
            .filter_map(|record| match record {
                Record::Rule(rule) => Some(rule.clone()),
                Record::Undecodable(_) => None,
            })
            .collect();
        let out = f(&mut rules)?;
        write_json_atomic(&self.rules_path, &merge_records(records, rules))?;
        self.bump();
        Ok(out)
    }
}

impl std::fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleStore")
            .field("rules_path", &self.rules_path)
            .field("revision", &self.revision())
            .finish()
    }
}

/// Lay the edited rules back over the original records. Surviving rules keep
/// their slot, removed ones drop out, and new ones go at the end.
fn merge_records(original: Vec<Record>, rules: Vec<Rule>) -> Vec<Record> {
    let mut merged = Vec::with_capacity(original.len().max(rules.len()));
    let mut rules = rules.into_iter().peekable();
    for record in original {
        match record {
            Record::Undecodable(value) => merged.push(Record::Undecodable(value)),
            Record::Rule(old) => {
                if let Some(rule) = rules.next_if(|r| r.id == old.id) {
                    merged.push(Record::Rule(rule));
                }
            }
        }
    }
    merged.extend(rules.map(Record::Rule));
    merged
}

fn validate_draft(draft: &RuleDraft) -> Result<(), StoreError> {
    if draft.trigger.keyword.is_empty() {
        return Err(StoreError::Invalid("trigger keyword is required".to_string()));
    }
    if matches!(draft.response, Response::Unsupported(_)) {
        return Err(StoreError::Invalid(format!(
            "unsupported response type: {}",
            draft.response.type_name()
        )));
    }
    Ok(())
}

fn check_unique(rules: &[Rule], draft: &RuleDraft, exclude: Option<Uuid>) -> Result<(), StoreError> {
    let clash = rules
        .iter()
        .filter(|r| Some(r.id) != exclude)
        .any(|r| r.trigger == draft.trigger);
    if clash {
        return Err(StoreError::DuplicateTrigger {
            trigger_type: draft.trigger.trigger_type,
            keyword: draft.trigger.keyword.clone(),
        });
    }
    Ok(())
}
