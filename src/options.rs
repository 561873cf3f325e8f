use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Capture bonuses for statuses that make a target easier to catch.
pub static CAPTURE_STATUS_BONUS: phf::Map<&'static str, f64> = phf::phf_map! {
    "paralysis" => 0.10,
    "burn" => 0.05,
    "poison" => 0.05,
};

fn default_run_chance() -> f64 {
    0.4
}

fn default_crit_chance() -> f64 {
    0.06
}

fn default_crit_multiplier() -> f64 {
    1.5
}

fn default_rand_min() -> f64 {
    0.9
}

fn default_rand_max() -> f64 {
    1.0
}

fn default_stat_range() -> (f64, f64) {
    (0.2, 3.0)
}

fn default_accuracy_range() -> (f64, f64) {
    (0.2, 2.0)
}

fn default_hit_range() -> (f64, f64) {
    (0.05, 0.99)
}

fn default_skill_power() -> f64 {
    30.0
}

fn default_status_duration() -> u32 {
    2
}

fn default_capture_base() -> f64 {
    0.45
}

fn default_capture_hp_weight() -> f64 {
    0.7
}

fn default_capture_range() -> (f64, f64) {
    (0.03, 0.90)
}

fn default_capture_status_bonus() -> BTreeMap<String, f64> {
    CAPTURE_STATUS_BONUS
        .entries()
        .map(|(name, bonus)| (name.to_string(), *bonus))
        .collect()
}

fn default_shield_status() -> String {
    "shield".to_string()
}

fn default_buff_statuses() -> Vec<String> {
    vec!["shield".to_string(), "regen".to_string()]
}

/// Tunable constants of one battle. Every field falls back to its default when
/// missing from a loaded options file.
#[derive(Clone, Debug, Deserialize)]
pub struct BattleOptions {
    #[serde(default = "default_run_chance")]
    pub run_base_chance: f64,
    #[serde(default = "default_crit_chance")]
    pub crit_chance: f64,
    #[serde(default = "default_crit_multiplier")]
    pub crit_multiplier: f64,
    #[serde(default = "default_rand_min")]
    pub rand_min: f64,
    #[serde(default = "default_rand_max")]
    pub rand_max: f64,
    #[serde(default = "default_stat_range")]
    pub stat_multiplier_range: (f64, f64),
    #[serde(default = "default_accuracy_range")]
    pub accuracy_multiplier_range: (f64, f64),
    #[serde(default = "default_hit_range")]
    pub hit_chance_range: (f64, f64),
    #[serde(default = "default_skill_power")]
    pub default_skill_power: f64,
    #[serde(default = "default_status_duration")]
    pub default_status_duration: u32,
    #[serde(default = "default_capture_base")]
    pub capture_base: f64,
    #[serde(default = "default_capture_hp_weight")]
    pub capture_hp_weight: f64,
    #[serde(default = "default_capture_range")]
    pub capture_chance_range: (f64, f64),
    #[serde(default = "default_capture_status_bonus")]
    pub capture_status_bonus: BTreeMap<String, f64>,
    #[serde(default = "default_shield_status")]
    pub shield_status: String,
    /// Statuses a cleanse never removes.
    #[serde(default = "default_buff_statuses")]
    pub buff_statuses: Vec<String>,
}

impl Default for BattleOptions {
    fn default() -> Self {
        Self {
            run_base_chance: default_run_chance(),
            crit_chance: default_crit_chance(),
            crit_multiplier: default_crit_multiplier(),
            rand_min: default_rand_min(),
            rand_max: default_rand_max(),
            stat_multiplier_range: default_stat_range(),
            accuracy_multiplier_range: default_accuracy_range(),
            hit_chance_range: default_hit_range(),
            default_skill_power: default_skill_power(),
            default_status_duration: default_status_duration(),
            capture_base: default_capture_base(),
            capture_hp_weight: default_capture_hp_weight(),
            capture_chance_range: default_capture_range(),
            capture_status_bonus: default_capture_status_bonus(),
            shield_status: default_shield_status(),
            buff_statuses: default_buff_statuses(),
        }
    }
}

impl BattleOptions {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read battle options at {}", path.display()))?;
        let options: BattleOptions = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
        options
            .validate()
            .with_context(|| format!("Invalid battle options in {}", path.display()))?;
        Ok(options)
    }

    /// Rejects inverted `(min, max)` pairs.
    pub fn validate(&self) -> anyhow::Result<()> {
        let ranges = [
            ("rand", (self.rand_min, self.rand_max)),
            ("stat_multiplier_range", self.stat_multiplier_range),
            ("accuracy_multiplier_range", self.accuracy_multiplier_range),
            ("hit_chance_range", self.hit_chance_range),
            ("capture_chance_range", self.capture_chance_range),
        ];
        for (name, (min, max)) in ranges {
            if min.is_nan() || max.is_nan() || min > max {
                anyhow::bail!("{name}: min ({min}) must not exceed max ({max})");
            }
        }
        Ok(())
    }

    /// Fixed random factor and no crits; for reproducing exact damage numbers.
    pub fn deterministic() -> Self {
        Self {
            crit_chance: 0.0,
            rand_min: 1.0,
            rand_max: 1.0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_options_file_uses_defaults() {
        let options: BattleOptions = serde_json::from_str("{}").expect("parses");
        assert_eq!(options.run_base_chance, 0.4);
        assert_eq!(options.crit_chance, 0.06);
        assert_eq!(options.stat_multiplier_range, (0.2, 3.0));
        assert_eq!(options.default_status_duration, 2);
        assert_eq!(options.capture_status_bonus.get("paralysis"), Some(&0.10));
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(BattleOptions::default().validate().is_ok());
        assert!(BattleOptions::deterministic().validate().is_ok());
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        for field in [
            "stat_multiplier_range",
            "accuracy_multiplier_range",
            "hit_chance_range",
            "capture_chance_range",
        ] {
            let raw = format!(r#"{{"{field}": [3.0, 0.2]}}"#);
            let options: BattleOptions = serde_json::from_str(&raw).expect("parses");
            let err = options.validate().expect_err("inverted range");
            assert!(err.to_string().contains(field));
        }
        let options: BattleOptions =
            serde_json::from_str(r#"{"rand_min": 1.0, "rand_max": 0.9}"#).expect("parses");
        assert!(options.validate().is_err());
    }

    #[test]
    fn load_rejects_inverted_range_file() {
        let path = std::env::temp_dir().join(format!(
            "monster-battle-options-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"stat_multiplier_range": [3.0, 0.2]}"#).expect("write options");
        let result = BattleOptions::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(result.is_err());
    }

    #[test]
    fn partial_options_override_only_given_fields() {
        let options: BattleOptions =
            serde_json::from_str(r#"{"run_base_chance": 0.75, "buff_statuses": []}"#)
                .expect("parses");
        assert_eq!(options.run_base_chance, 0.75);
        assert!(options.buff_statuses.is_empty());
        assert_eq!(options.crit_multiplier, 1.5);
    }
}
