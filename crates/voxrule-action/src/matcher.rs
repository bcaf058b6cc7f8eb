//! Rule Matcher.

use voxrule_core::{Rule, Trigger, TriggerType};

/// Whether `utterance` satisfies `trigger`. Case-sensitive, no trimming.
pub fn trigger_matches(trigger: &Trigger, utterance: &str) -> bool {
    let keyword = trigger.keyword.as_str();
    match trigger.trigger_type {
        TriggerType::Exact => utterance == keyword,
        TriggerType::StartsWith => utterance.starts_with(keyword),
        TriggerType::Contains => utterance.contains(keyword),
        TriggerType::EndsWith => utterance.ends_with(keyword),
    }
}

/// First enabled rule, in store order, whose trigger holds for `utterance`.
pub fn find_match<'a>(utterance: &str, rules: &'a [Rule]) -> Option<&'a Rule> {
    rules
        .iter()
        .filter(|r| r.enabled)
        .find(|r| trigger_matches(&r.trigger, utterance))
}
