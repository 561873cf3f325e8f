//! Per-combatant status and stat-modifier bookkeeping.
//!
//! A status id appears at most once. Reapplying refreshes the remaining
//! duration to the larger of the two and merges the payload field by field.
//! Timed modifiers stack freely and decay once per completed turn.

use crate::catalogue::Catalogue;
use crate::model::{ComponentKind, Stat, StatusComponent, StatusId};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusMeta {
    pub shield: Option<u32>,
}

impl StatusMeta {
    pub fn shield(amount: u32) -> Self {
        Self {
            shield: Some(amount),
        }
    }

    fn merge(&mut self, newer: StatusMeta) {
        if newer.shield.is_some() {
            self.shield = newer.shield;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusInstance {
    pub turns_left: u32,
    pub meta: StatusMeta,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatModifier {
    pub stat: Stat,
    pub delta: f64,
    pub turns_left: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusChange {
    Applied,
    Refreshed,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ShieldAbsorb {
    pub absorbed: u32,
    pub broken: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ledger {
    statuses: BTreeMap<StatusId, StatusInstance>,
    modifiers: Vec<StatModifier>,
}

impl Ledger {
    pub fn apply_status(&mut self, id: StatusId, turns: u32, meta: StatusMeta) -> StatusChange {
        match self.statuses.get_mut(&id) {
            Some(existing) => {
                existing.turns_left = existing.turns_left.max(turns);
                existing.meta.merge(meta);
                StatusChange::Refreshed
            }
            None => {
                self.statuses.insert(
                    id,
                    StatusInstance {
                        turns_left: turns,
                        meta,
                    },
                );
                StatusChange::Applied
            }
        }
    }

    pub fn remove_status(&mut self, id: StatusId) -> bool {
        self.statuses.remove(&id).is_some()
    }

    /// Adds `turns` to an existing status. Absent statuses are left absent.
    pub fn extend_status(&mut self, id: StatusId, turns: u32) -> bool {
        match self.statuses.get_mut(&id) {
            Some(existing) => {
                existing.turns_left = existing.turns_left.saturating_add(turns);
                true
            }
            None => false,
        }
    }

    pub fn has_status(&self, id: StatusId) -> bool {
        self.statuses.contains_key(&id)
    }

    pub fn status(&self, id: StatusId) -> Option<&StatusInstance> {
        self.statuses.get(&id)
    }

    pub fn statuses(&self) -> impl Iterator<Item = (StatusId, &StatusInstance)> {
        self.statuses.iter().map(|(id, instance)| (*id, instance))
    }

    pub fn push_modifier(&mut self, stat: Stat, delta: f64, turns: u32) {
        self.modifiers.push(StatModifier {
            stat,
            delta,
            turns_left: turns,
        });
    }

    pub fn modifiers(&self) -> &[StatModifier] {
        &self.modifiers
    }

    /// Removes up to `count` statuses not accepted by `is_buff`, lowest id first.
    pub fn cleanse(&mut self, count: u32, is_buff: impl Fn(StatusId) -> bool) -> Vec<StatusId> {
        let doomed: Vec<StatusId> = self
            .statuses
            .keys()
            .copied()
            .filter(|id| !is_buff(*id))
            .take(count as usize)
            .collect();
        for id in &doomed {
            self.statuses.remove(id);
        }
        doomed
    }

    /// Lets the shield status soak up to `amount`; a drained shield is removed.
    pub fn absorb(&mut self, shield_id: StatusId, amount: u32) -> ShieldAbsorb {
        let Some(instance) = self.statuses.get_mut(&shield_id) else {
            return ShieldAbsorb::default();
        };
        let remaining = instance.meta.shield.unwrap_or(0);
        let absorbed = remaining.min(amount);
        let left = remaining - absorbed;
        if left == 0 {
            self.statuses.remove(&shield_id);
            return ShieldAbsorb {
                absorbed,
                broken: true,
            };
        }
        instance.meta.shield = Some(left);
        ShieldAbsorb {
            absorbed,
            broken: false,
        }
    }

    /// One completed turn: every duration drops by one, expired entries go.
    /// Returns the statuses that expired.
    pub fn tick(&mut self) -> Vec<StatusId> {
        let mut expired = Vec::new();
        for (id, instance) in self.statuses.iter_mut() {
            instance.turns_left = instance.turns_left.saturating_sub(1);
            if instance.turns_left == 0 {
                expired.push(*id);
            }
        }
        for id in &expired {
            self.statuses.remove(id);
        }
        for modifier in self.modifiers.iter_mut() {
            modifier.turns_left = modifier.turns_left.saturating_sub(1);
        }
        self.modifiers.retain(|modifier| modifier.turns_left > 0);
        expired
    }

    /// Components of every active status, in status-id order.
    pub fn components<'c>(
        &'c self,
        catalogue: &'c Catalogue,
    ) -> impl Iterator<Item = &'c StatusComponent> + 'c {
        self.statuses
            .keys()
            .flat_map(move |id| catalogue.status_components(*id).iter())
    }

    pub fn stat_multiplier(&self, stat: Stat, catalogue: &Catalogue, range: (f64, f64)) -> f64 {
        let timed: f64 = self
            .modifiers
            .iter()
            .filter(|modifier| modifier.stat == stat)
            .map(|modifier| 1.0 + modifier.delta)
            .product();
        let from_status: f64 = self
            .components(catalogue)
            .filter(|c| c.kind == ComponentKind::StatMod && c.stat == Some(stat))
            .map(|c| 1.0 + c.value)
            .product();
        clamp_range(timed * from_status, range)
    }

    pub fn accuracy_multiplier(&self, catalogue: &Catalogue, range: (f64, f64)) -> f64 {
        let timed: f64 = self
            .modifiers
            .iter()
            .filter(|modifier| modifier.stat == Stat::Acc)
            .map(|modifier| 1.0 + modifier.delta)
            .product();
        let from_status: f64 = self
            .components(catalogue)
            .filter(|c| c.kind == ComponentKind::AccMod)
            .map(|c| 1.0 + c.value)
            .product();
        clamp_range(timed * from_status, range)
    }

    /// Largest skip-turn chance among active statuses.
    pub fn skip_chance(&self, catalogue: &Catalogue) -> f64 {
        self.components(catalogue)
            .filter(|c| c.kind == ComponentKind::SkipTurnChance)
            .map(|c| c.value)
            .fold(0.0_f64, f64::max)
            .clamp(0.0, 1.0)
    }
}

/// Clamps without panicking; an inverted range collapses to `min`.
pub(crate) fn clamp_range(value: f64, (min, max): (f64, f64)) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.min(max).max(min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::CatalogueTables;
    use proptest::prelude::*;

    fn catalogue() -> Catalogue {
        let tables: CatalogueTables = serde_json::from_str(
            r#"{
                "status_effects": [
                    {"id": 1, "code": "weaken"},
                    {"id": 2, "code": "blind"},
                    {"id": 3, "code": "paralysis"},
                    {"id": 4, "code": "sleep"}
                ],
                "status_effect_components": [
                    {"status_id": 1, "kind": "STAT_MOD", "stat": "atk", "value": -0.5},
                    {"status_id": 2, "kind": "ACC_MOD", "value": -0.3},
                    {"status_id": 3, "kind": "SKIP_TURN_CHANCE", "value": 0.25},
                    {"status_id": 4, "kind": "SKIP_TURN_CHANCE", "value": 0.8}
                ]
            }"#,
        )
        .expect("tables parse");
        Catalogue::from_tables(tables)
    }

    #[test]
    fn reapplying_keeps_longer_duration_and_merges_meta() {
        let mut ledger = Ledger::default();
        assert_eq!(
            ledger.apply_status(5, 3, StatusMeta::shield(20)),
            StatusChange::Applied
        );
        assert_eq!(
            ledger.apply_status(5, 1, StatusMeta::default()),
            StatusChange::Refreshed
        );
        let instance = ledger.status(5).expect("present");
        assert_eq!(instance.turns_left, 3);
        assert_eq!(instance.meta.shield, Some(20));
        ledger.apply_status(5, 6, StatusMeta::shield(8));
        let instance = ledger.status(5).expect("present");
        assert_eq!(instance.turns_left, 6);
        assert_eq!(instance.meta.shield, Some(8));
    }

    #[test]
    fn shield_breaks_when_drained() {
        let mut ledger = Ledger::default();
        ledger.apply_status(9, 3, StatusMeta::shield(10));
        let partial = ledger.absorb(9, 4);
        assert_eq!(partial, ShieldAbsorb { absorbed: 4, broken: false });
        assert_eq!(ledger.status(9).and_then(|s| s.meta.shield), Some(6));
        let rest = ledger.absorb(9, 25);
        assert_eq!(rest, ShieldAbsorb { absorbed: 6, broken: true });
        assert!(!ledger.has_status(9));
        assert_eq!(ledger.absorb(9, 5), ShieldAbsorb::default());
    }

    #[test]
    fn tick_evicts_expired_entries() {
        let mut ledger = Ledger::default();
        ledger.apply_status(1, 1, StatusMeta::default());
        ledger.apply_status(2, 2, StatusMeta::default());
        ledger.push_modifier(Stat::Atk, 0.5, 1);
        ledger.push_modifier(Stat::Def, 0.5, 3);
        assert_eq!(ledger.tick(), vec![1]);
        assert!(ledger.has_status(2));
        assert_eq!(ledger.modifiers().len(), 1);
        assert_eq!(ledger.modifiers()[0].turns_left, 2);
    }

    #[test]
    fn cleanse_skips_buffs_and_respects_count() {
        let mut ledger = Ledger::default();
        for id in [1, 2, 3, 4] {
            ledger.apply_status(id, 2, StatusMeta::default());
        }
        let removed = ledger.cleanse(2, |id| id == 1);
        assert_eq!(removed, vec![2, 3]);
        assert!(ledger.has_status(1));
        assert!(ledger.has_status(4));
    }

    #[test]
    fn stat_multiplier_combines_modifiers_and_components() {
        let catalogue = catalogue();
        let mut ledger = Ledger::default();
        ledger.push_modifier(Stat::Atk, 0.5, 2);
        assert!((ledger.stat_multiplier(Stat::Atk, &catalogue, (0.2, 3.0)) - 1.5).abs() < 1e-9);
        ledger.apply_status(1, 2, StatusMeta::default());
        assert!((ledger.stat_multiplier(Stat::Atk, &catalogue, (0.2, 3.0)) - 0.75).abs() < 1e-9);
        assert_eq!(ledger.stat_multiplier(Stat::Def, &catalogue, (0.2, 3.0)), 1.0);
    }

    #[test]
    fn inverted_range_does_not_panic() {
        assert_eq!(clamp_range(1.5, (3.0, 0.2)), 3.0);
        assert_eq!(clamp_range(f64::NAN, (0.2, 3.0)), 0.2);
    }

    #[test]
    fn skip_chance_takes_the_maximum() {
        let catalogue = catalogue();
        let mut ledger = Ledger::default();
        assert_eq!(ledger.skip_chance(&catalogue), 0.0);
        ledger.apply_status(3, 2, StatusMeta::default());
        ledger.apply_status(4, 2, StatusMeta::default());
        assert_eq!(ledger.skip_chance(&catalogue), 0.8);
    }

    proptest! {
        #[test]
        fn multipliers_stay_clamped(deltas in proptest::collection::vec(-0.99f64..5.0, 0..24)) {
            let catalogue = catalogue();
            let mut ledger = Ledger::default();
            for delta in &deltas {
                ledger.push_modifier(Stat::Atk, *delta, 3);
                ledger.push_modifier(Stat::Acc, *delta, 3);
            }
            ledger.apply_status(1, 2, StatusMeta::default());
            ledger.apply_status(2, 2, StatusMeta::default());
            let stat = ledger.stat_multiplier(Stat::Atk, &catalogue, (0.2, 3.0));
            let acc = ledger.accuracy_multiplier(&catalogue, (0.2, 2.0));
            prop_assert!((0.2..=3.0).contains(&stat));
            prop_assert!((0.2..=2.0).contains(&acc));
        }

        #[test]
        fn reapplication_never_shortens(first in 0u32..10, second in 0u32..10) {
            let mut ledger = Ledger::default();
            ledger.apply_status(7, first, StatusMeta::default());
            ledger.apply_status(7, second, StatusMeta::default());
            let turns = ledger.status(7).map(|s| s.turns_left).unwrap_or(0);
            prop_assert_eq!(turns, first.max(second));
        }
    }
}
