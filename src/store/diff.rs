//! Snapshot comparison engine.
//!
//! Compares the current item list against the previous snapshot:
//! - Matches items by `section|name`
//! - Reports current items that are not ON
//! - Reports items present in the snapshot but missing from the feed
//!
//! Duplicate keys in the feed are last-wins: the lookup keeps the last item
//! for a key at the position where the key first appeared. Shadowed keys are
//! returned so the caller can warn about them.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{Item, ItemKey, Status};
use crate::store::snapshot::Snapshot;

/// Price shown for a disappeared item whose snapshot record has none.
pub const MISSING_PRICE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisappearedItem {
    #[serde(flatten)]
    pub item: Item,
    pub last_seen: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub off_items: Vec<Item>,
    pub disappeared_items: Vec<DisappearedItem>,
    /// Keys that appeared more than once in the feed.
    pub shadowed: Vec<ItemKey>,
}

/// Current items keyed by composite key, in first-seen order.
struct Lookup<'a> {
    order: Vec<ItemKey>,
    by_key: HashMap<ItemKey, &'a Item>,
    shadowed: Vec<ItemKey>,
}

impl<'a> Lookup<'a> {
    fn build(items: &'a [Item]) -> Self {
        let mut order = Vec::with_capacity(items.len());
        let mut by_key: HashMap<ItemKey, &Item> = HashMap::with_capacity(items.len());
        let mut shadowed = Vec::new();

        for item in items {
            let key = item.key();
            match by_key.insert(key.clone(), item) {
                None => order.push(key),
                Some(_) => {
                    if !shadowed.contains(&key) {
                        shadowed.push(key);
                    }
                }
            }
        }

        Lookup { order, by_key, shadowed }
    }

    fn iter(&self) -> impl Iterator<Item = &'a Item> + '_ {
        self.order.iter().filter_map(|key| self.by_key.get(key).copied())
    }

    fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(&ItemKey::from_raw(key))
    }
}

/// Compares `current` against `prior`.
///
/// `now` is used as `last_seen` for snapshot records that carry no capture
/// time of their own.
pub fn diff(current: &[Item], prior: &Snapshot, now: &str) -> DiffResult {
    let lookup = Lookup::build(current);

    let off_items = lookup
        .iter()
        .filter(|item| !item.status.is_on())
        .cloned()
        .collect();

    let disappeared_items = prior
        .iter()
        .filter(|(key, _)| !lookup.contains(key))
        .map(|(key, record)| {
            let key = ItemKey::from_raw(key);
            let (section, name) = key.split();

            DisappearedItem {
                item: Item {
                    section: section.to_string(),
                    name: name.to_string(),
                    price: record.price.clone().unwrap_or_else(|| MISSING_PRICE.to_string()),
                    description: Some(record.description.clone().unwrap_or_default()),
                    status: Status::OffDisappeared,
                },
                last_seen: record.last_checked.clone().unwrap_or_else(|| now.to_string()),
            }
        })
        .collect();

    DiffResult {
        off_items,
        disappeared_items,
        shadowed: lookup.shadowed,
    }
}
