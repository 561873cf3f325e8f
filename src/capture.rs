use crate::battler::Battler;
use crate::catalogue::Catalogue;
use crate::ledger::clamp_range;
use crate::options::BattleOptions;
use crate::rng::BattleRng;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureRoll {
    pub chance: f64,
    pub captured: bool,
}

/// Sum of configured bonuses for statuses the target carries, matched by name.
pub fn status_bonus(target: &Battler, catalogue: &Catalogue, options: &BattleOptions) -> f64 {
    options
        .capture_status_bonus
        .iter()
        .filter(|(name, _)| {
            catalogue
                .status_id_by_name(name)
                .is_some_and(|id| target.has_status(id))
        })
        .map(|(_, bonus)| *bonus)
        .sum()
}

pub fn capture_chance(
    target: &Battler,
    catalogue: &Catalogue,
    options: &BattleOptions,
    ball_modifier: f64,
) -> f64 {
    let rarity = target
        .rarity_id
        .and_then(|id| catalogue.rarity(id))
        .map(|rarity| rarity.capture_multiplier)
        .unwrap_or(1.0);
    let hp_term = 1.0 - target.hp_ratio() * options.capture_hp_weight;
    let raw = options.capture_base * rarity * ball_modifier * hp_term
        + status_bonus(target, catalogue, options);
    clamp_range(raw, options.capture_chance_range)
}

/// One draw against the capture chance.
pub fn attempt_capture(
    target: &Battler,
    catalogue: &Catalogue,
    options: &BattleOptions,
    ball_modifier: f64,
    rng: &mut impl BattleRng,
) -> CaptureRoll {
    let chance = capture_chance(target, catalogue, options, ball_modifier);
    let roll = rng.roll();
    let captured = roll < chance;
    tracing::debug!(target = %target.name, chance, roll, captured, "capture rolled");
    CaptureRoll { chance, captured }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battler::test_support::{battler, catalogue_with_statuses};
    use crate::battler::Side;
    use crate::ledger::StatusMeta;
    use crate::rng::ScriptedRng;
    use proptest::prelude::*;

    #[test]
    fn half_hp_plain_ball() {
        let catalogue = catalogue_with_statuses(&[]);
        let target = battler(Side::Enemy, 100, 50, 50).with_hp(50);
        let options = BattleOptions::default();
        let p = capture_chance(&target, &catalogue, &options, 1.0);
        assert!((p - 0.2925).abs() < 1e-9);
        let mut rng = ScriptedRng::new([0.2]);
        let roll = attempt_capture(&target, &catalogue, &options, 1.0, &mut rng);
        assert!(roll.captured);
        assert_eq!(rng.drawn(), 1);
    }

    #[test]
    fn statuses_add_bonus_by_name() {
        let catalogue = catalogue_with_statuses(&[(1, "Paralysis"), (2, "burn"), (3, "sleep")]);
        let mut target = battler(Side::Enemy, 100, 50, 50).with_hp(50);
        target.apply_status(1, 2, StatusMeta::default());
        target.apply_status(2, 2, StatusMeta::default());
        target.apply_status(3, 2, StatusMeta::default());
        let options = BattleOptions::default();
        assert!((status_bonus(&target, &catalogue, &options) - 0.15).abs() < 1e-9);
        let p = capture_chance(&target, &catalogue, &options, 1.0);
        assert!((p - 0.4425).abs() < 1e-9);
    }

    #[test]
    fn full_hp_and_great_ball_are_clamped() {
        let catalogue = catalogue_with_statuses(&[]);
        let target = battler(Side::Enemy, 100, 50, 50);
        let options = BattleOptions::default();
        assert!((capture_chance(&target, &catalogue, &options, 0.1) - 0.03).abs() < 1e-9);
        let weak = battler(Side::Enemy, 100, 50, 50).with_hp(1);
        assert!((capture_chance(&weak, &catalogue, &options, 5.0) - 0.90).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn chance_stays_in_range(hp in 0u32..=200, ball in 0.0f64..10.0) {
            let catalogue = catalogue_with_statuses(&[(1, "paralysis")]);
            let mut target = battler(Side::Enemy, 200, 50, 50).with_hp(hp);
            target.apply_status(1, 2, StatusMeta::default());
            let p = capture_chance(&target, &catalogue, &BattleOptions::default(), ball);
            prop_assert!((0.03..=0.90).contains(&p));
        }
    }
}
