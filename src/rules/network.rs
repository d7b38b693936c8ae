//! indexed rule store: `entity -> rules` and `(entity, entity) -> rules`
//!
//! Design Note "Replacing global-singleton rule registry": the source uses a
//! process-wide singleton; here the network is an explicit value built by
//! the caller and passed by reference into the scheduler and checker. Backed
//! by `petgraph` (already in this corpus for graph-shaped indexed lookups),
//! using a plain `Graph` rather than `GraphMap` since entity identities carry
//! owned `String`s and so are not `Copy`.

use std::collections::HashMap;

use petgraph::Undirected;
use petgraph::graph::{Graph, NodeIndex};

use crate::model::entity::{EntityRef, RuleId};
use crate::rules::{Effect, Rule, Weight};

#[derive(Debug, Clone, Default)]
pub struct RuleNetwork {
    graph: Graph<EntityRef, RuleId, Undirected>,
    nodes: HashMap<EntityRef, NodeIndex>,
    rules: HashMap<RuleId, Rule>,
}

impl RuleNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    fn node_for(&mut self, entity: EntityRef) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&entity) {
            return idx;
        }
        let idx = self.graph.add_node(entity.clone());
        self.nodes.insert(entity, idx);
        idx
    }

    /// register a fully-hydrated rule; callers (config assembly) are
    /// responsible for validating that its entities exist elsewhere
    pub fn register(&mut self, rule: Rule) {
        let (a, b) = rule.participants();
        let na = self.node_for(a);
        let nb = self.node_for(b);
        self.graph.add_edge(na, nb, rule.id);
        self.rules.insert(rule.id, rule);
    }

    /// rules touching `entity`; empty (never failing) if unknown
    pub fn rules_of(&self, entity: &EntityRef) -> Vec<&Rule> {
        let Some(&idx) = self.nodes.get(entity) else {
            return Vec::new();
        };
        self.graph
            .edges(idx)
            .filter_map(|e| self.rules.get(e.weight()))
            .collect()
    }

    /// rules directly connecting `a` and `b`; empty if either is unknown or unconnected
    pub fn rules_between(&self, a: &EntityRef, b: &EntityRef) -> Vec<&Rule> {
        let (Some(&na), Some(&nb)) = (self.nodes.get(a), self.nodes.get(b)) else {
            return Vec::new();
        };
        self.graph
            .edges_connecting(na, nb)
            .filter_map(|e| self.rules.get(e.weight()))
            .collect()
    }

    pub fn filter<'a>(rules: &[&'a Rule], weight: Weight, effect: Effect) -> Vec<&'a Rule> {
        rules
            .iter()
            .copied()
            .filter(|r| r.weight == weight && r.effect == effect)
            .collect()
    }

    pub fn exists_must_forbidden(&self, a: &EntityRef, b: &EntityRef) -> bool {
        self.exists(a, b, Weight::Must, Effect::Forbidden)
    }

    pub fn exists(&self, a: &EntityRef, b: &EntityRef, weight: Weight, effect: Effect) -> bool {
        self.rules_between(a, b)
            .into_iter()
            .any(|r| r.weight == weight && r.effect == effect)
    }

    /// tie-break used by the planning queue (spec.md §4.1/§4.4): rules
    /// touching this duty, weighted by how binding they are
    pub fn fine_priority(&self, duty: &EntityRef) -> i64 {
        self.rules_of(duty)
            .into_iter()
            .map(|r| match r.weight {
                Weight::Must => 3,
                Weight::Should => 2,
                Weight::May => 1,
            })
            .sum()
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::{DutyFormId, PersonId};

    fn rule(id: u64, weight: Weight, effect: Effect, subject: crate::rules::Subject) -> Rule {
        Rule {
            id: RuleId(id),
            weight,
            effect,
            subject,
        }
    }

    #[test]
    fn rules_between_finds_registered_rule() {
        let mut net = RuleNetwork::new();
        let a = EntityRef::Person(PersonId::new("alice"));
        let b = EntityRef::Person(PersonId::new("bob"));
        net.register(rule(
            1,
            Weight::Must,
            Effect::Forbidden,
            crate::rules::Subject::PersonPerson(PersonId::new("alice"), PersonId::new("bob")),
        ));

        assert!(net.exists_must_forbidden(&a, &b));
        assert!(net.exists_must_forbidden(&b, &a));
    }

    #[test]
    fn unknown_entities_return_empty_not_error() {
        let net = RuleNetwork::new();
        let ghost = EntityRef::Person(PersonId::new("ghost"));
        assert!(net.rules_of(&ghost).is_empty());
        assert!(!net.exists_must_forbidden(&ghost, &ghost));
    }

    #[test]
    fn fine_priority_weights_must_higher_than_may() {
        let mut net = RuleNetwork::new();
        let duty = EntityRef::Duty(DutyFormId::new("friday"));
        net.register(rule(
            1,
            Weight::Must,
            Effect::Combination,
            crate::rules::Subject::DutyDuty(DutyFormId::new("friday"), DutyFormId::new("sunday")),
        ));
        net.register(rule(
            2,
            Weight::May,
            Effect::Forbidden,
            crate::rules::Subject::DutyDuty(DutyFormId::new("friday"), DutyFormId::new("monday")),
        ));

        assert_eq!(net.fine_priority(&duty), 4);
    }
}
