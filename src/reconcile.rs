//! Three-way key comparison between a target file and its template.
//!
//! Pure function over two optional record sets; no I/O. An absent template
//! requires nothing, so the target is fully in sync by definition.

use serde::Serialize;

use crate::parse::RecordSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    /// Template keys absent from the target, in template order.
    pub missing: Vec<String>,
    /// Target keys absent from the template, in target order.
    pub extra: Vec<String>,
    /// Template keys present in the target, in template order.
    pub synced: Vec<String>,
    pub total_template: usize,
    pub total_target: usize,
    pub percentage: u8,
}

impl ReconciliationResult {
    pub fn is_in_sync(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn reconcile(
    target: Option<&RecordSet>,
    template: Option<&RecordSet>,
) -> ReconciliationResult {
    let total_target = target.map_or(0, RecordSet::len);

    let Some(template) = template else {
        return ReconciliationResult {
            missing: vec![],
            extra: target.map_or_else(Vec::new, owned_keys),
            synced: vec![],
            total_template: 0,
            total_target,
            percentage: 100,
        };
    };

    let Some(target) = target else {
        return ReconciliationResult {
            missing: owned_keys(template),
            extra: vec![],
            synced: vec![],
            total_template: template.len(),
            total_target: 0,
            percentage: 0,
        };
    };

    let (synced, missing): (Vec<String>, Vec<String>) = template
        .keys()
        .map(str::to_string)
        .partition(|k| target.contains_key(k));

    let extra = target
        .keys()
        .filter(|k| !template.contains_key(k))
        .map(str::to_string)
        .collect();

    let percentage = sync_percentage(synced.len(), template.len());

    ReconciliationResult {
        missing,
        extra,
        synced,
        total_template: template.len(),
        total_target,
        percentage,
    }
}

fn owned_keys(set: &RecordSet) -> Vec<String> {
    set.keys().map(str::to_string).collect()
}

fn sync_percentage(synced: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    // Round half up in integer arithmetic.
    ((synced * 200 + total) / (total * 2)) as u8
}
