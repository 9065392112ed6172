//! Turns parsed records into the items to monitor.
//!
//! Resolution per namespace and resource kind:
//! 1. rules naming the namespace decide on their own,
//! 2. otherwise rules without a namespace apply,
//! 3. without any rule at all every non-empty kind is discovered.

use std::collections::{BTreeSet, HashSet};

use crate::types::{DiscoveryRule, ItemId, NamespaceRecord, ResourceKind};

/// Configured discovery rules, in configuration order
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<DiscoveryRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<DiscoveryRule>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `kind` is monitored in `namespace`
    pub fn admits(&self, namespace: &str, kind: ResourceKind) -> bool {
        if self.rules.is_empty() {
            return true;
        }
        let explicit: Vec<&DiscoveryRule> = self
            .rules
            .iter()
            .filter(|r| r.scope() == Some(namespace))
            .collect();
        if !explicit.is_empty() {
            return explicit.iter().any(|r| r.enables(kind));
        }
        self.rules
            .iter()
            .filter(|r| r.scope().is_none())
            .any(|r| r.enables(kind))
    }

    /// Resource kinds monitored in `namespace`
    pub fn kinds_for(&self, namespace: &str) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| self.admits(namespace, *kind))
            .collect()
    }
}

/// Items to monitor, derived record by record from the admitted kinds
pub fn discover(rules: &RuleSet, records: &[NamespaceRecord]) -> Vec<ItemId> {
    let mut items = Vec::new();
    for record in records {
        for kind in rules.kinds_for(&record.name) {
            if kind.is_namespace_wide() {
                if record.has_resources(kind) {
                    items.push(ItemId::namespace_wide(&record.name, kind));
                }
            } else {
                for name in record.resource_names(kind) {
                    items.push(ItemId::named(&record.name, kind, name));
                }
            }
        }
    }
    items
}

/// Same item set as [`discover`], resolved from every (rule, namespace) pair
/// independently and then applied to the full inventory.
pub fn discover_by_rule_pairs(rules: &[DiscoveryRule], records: &[NamespaceRecord]) -> BTreeSet<ItemId> {
    let inventory = records.iter().flat_map(|r| r.inventory());
    if rules.is_empty() {
        return inventory.collect();
    }

    let pinned: HashSet<&str> = rules.iter().filter_map(|r| r.scope()).collect();
    let mut admitted: HashSet<(&str, ResourceKind)> = HashSet::new();
    for rule in rules {
        for record in records {
            let applies = match rule.scope() {
                Some(namespace) => namespace == record.name,
                None => !pinned.contains(record.name.as_str()),
            };
            if !applies {
                continue;
            }
            for kind in ResourceKind::ALL {
                if rule.enables(kind) {
                    admitted.insert((record.name.as_str(), kind));
                }
            }
        }
    }

    inventory
        .filter(|item| admitted.contains(&(item.namespace.as_str(), item.kind)))
        .collect()
}
