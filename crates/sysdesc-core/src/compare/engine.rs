//! Scope comparison.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use crate::compare::model::Comparison;
use crate::description::SystemDescription;
use crate::errors::Result;
use crate::model::Identity;
use crate::node::{Node, Sequence};
use crate::scope::{all_scopes, Scope, ScopeBody};
use crate::{log_op_end, log_op_error, log_op_start};

/// Pull identity-matched pairs out of two sequences.
///
/// Elements of `a` and `b` that share an identity are removed from both;
/// those whose full contents differ are returned as changed pairs (in `a`'s
/// order), identical ones are dropped. What remains of `a` and `b` are the
/// elements without a counterpart, in their original order and class.
///
/// Takes ownership so the caller decides whether to hand over copies.
pub fn extract_changed(a: Sequence, b: Sequence) -> (Sequence, Sequence, Vec<(Node, Node)>) {
    let mut b_slots: Vec<Option<Node>> = b.items().iter().cloned().map(Some).collect();
    let mut b_index: HashMap<Identity, VecDeque<usize>> = HashMap::new();
    for (pos, item) in b.items().iter().enumerate() {
        b_index.entry(item.identity()).or_default().push_back(pos);
    }

    let mut remaining_a = Vec::new();
    let mut changed = Vec::new();
    for item in a.items() {
        let partner = b_index
            .get_mut(&item.identity())
            .and_then(VecDeque::pop_front)
            .and_then(|pos| b_slots[pos].take());
        match partner {
            Some(other) if other != *item => changed.push((item.clone(), other)),
            Some(_) => {}
            None => remaining_a.push(item.clone()),
        }
    }

    let remaining_b = b_slots.into_iter().flatten().collect();
    (a.with_items(remaining_a), b.with_items(remaining_b), changed)
}

/// Partition scope `scope` of two descriptions.
///
/// # Errors
///
/// A format error if either description is not at the current version,
/// `UnknownScope` for unregistered names.
pub fn compare_scope(
    desc1: &SystemDescription,
    desc2: &SystemDescription,
    scope: &str,
) -> Result<Comparison> {
    let mut result = Comparison::empty(scope, desc1.name(), desc2.name());
    match (desc1.scope(scope)?, desc2.scope(scope)?) {
        (None, None) => {}
        (Some(s1), None) => result.only_in1 = Some(s1.clone()),
        (None, Some(s2)) => result.only_in2 = Some(s2.clone()),
        (Some(s1), Some(s2)) => partition(s1, s2, &mut result),
    }
    Ok(result)
}

fn partition(s1: &Scope, s2: &Scope, result: &mut Comparison) {
    match (s1.body(), s2.body()) {
        (ScopeBody::Elements(seq1), ScopeBody::Elements(seq2)) => {
            let (only1, only2, changed) = extract_changed(seq1.clone(), seq2.clone());
            result.common = Some(s1.with_elements(seq1.intersection(seq2)));
            result.only_in1 = Some(s1.with_elements(only1));
            result.only_in2 = Some(s2.with_elements(only2));
            result.changed = Some(changed);
        }
        // Record scopes have no parts to pair up
        _ if s1 == s2 => result.common = Some(s1.clone()),
        _ => {
            result.only_in1 = Some(s1.clone());
            result.only_in2 = Some(s2.clone());
        }
    }
}

/// Compare several scopes at once.
///
/// With an empty `scopes` list every registered scope present in either
/// description is compared, in registry order.
///
/// # Errors
///
/// As [`compare_scope`].
pub fn compare_descriptions(
    desc1: &SystemDescription,
    desc2: &SystemDescription,
    scopes: &[&str],
) -> Result<Vec<Comparison>> {
    let start = Instant::now();
    log_op_start!(
        "compare_descriptions",
        name1 = desc1.name(),
        name2 = desc2.name()
    );

    let result = compare_all(desc1, desc2, scopes);
    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(comparisons) => {
            let identical = comparisons.iter().filter(|c| c.is_identical()).count();
            log_op_end!(
                "compare_descriptions",
                duration_ms = duration_ms,
                scopes = comparisons.len(),
                identical = identical
            );
        }
        Err(err) => log_op_error!("compare_descriptions", err.clone(), duration_ms = duration_ms),
    }
    result
}

fn compare_all(
    desc1: &SystemDescription,
    desc2: &SystemDescription,
    scopes: &[&str],
) -> Result<Vec<Comparison>> {
    desc1.ensure_compatible()?;
    desc2.ensure_compatible()?;

    let selected: Vec<&str> = if scopes.is_empty() {
        all_scopes()
            .iter()
            .map(|def| def.name)
            .filter(|name| {
                desc1.scope_names().contains(name) || desc2.scope_names().contains(name)
            })
            .collect()
    } else {
        scopes.to_vec()
    };
    selected
        .into_iter()
        .map(|scope| compare_scope(desc1, desc2, scope))
        .collect()
}
