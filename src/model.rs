use crate::condition::Condition;
use serde::{Deserialize, Serialize};

pub type ElementId = u32;
pub type FormId = u32;
pub type RarityId = u32;
pub type NatureId = u32;
pub type SkillId = u32;
pub type StatusId = u32;

fn one() -> f64 {
    1.0
}

fn default_accuracy() -> f64 {
    100.0
}

fn enemy_scope() -> Scope {
    Scope::Enemy
}

fn default_level() -> u32 {
    1
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Hp,
    #[serde(alias = "attack", alias = "ATK")]
    Atk,
    #[serde(alias = "defense", alias = "DEF")]
    Def,
    #[serde(alias = "speed", alias = "SPD")]
    Spd,
    #[serde(alias = "accuracy", alias = "ACC")]
    Acc,
    #[serde(other)]
    Unknown,
}

/// Point in the battle lifecycle at which an effect or component fires.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trigger {
    #[default]
    OnCast,
    OnHit,
    TurnStart,
    TurnEnd,
    BattleStart,
    OnDamageCalc,
    OnAccuracyCalc,
    OnStatCalc,
    #[serde(other)]
    Other,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectKind {
    Damage,
    ApplyStatus,
    StatMod,
    ShieldMaxhpRatio,
    HealMaxhpRatio,
    CleanseDebuff,
    NextHitApplyStatus,
    LifestealRatio,
    DamageMult,
    DamageTakenMult,
    #[serde(other)]
    Unsupported,
}

/// Who an effect lands on. Any tag starting with `ENEMY` targets the opponent.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(from = "String")]
pub enum Scope {
    Enemy,
    #[default]
    Caster,
}

impl Scope {
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().to_ascii_uppercase().starts_with("ENEMY") {
            Scope::Enemy
        } else {
            Scope::Caster
        }
    }
}

impl From<String> for Scope {
    fn from(tag: String) -> Self {
        Scope::from_tag(&tag)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillKind {
    #[default]
    Active,
    Passive,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Element {
    pub id: ElementId,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ElementMatchup {
    pub attacker_element_id: ElementId,
    pub defender_element_id: ElementId,
    #[serde(default = "one")]
    pub multiplier: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Rarity {
    pub id: RarityId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "one")]
    pub stat_multiplier: f64,
    #[serde(default = "one")]
    pub capture_multiplier: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Nature {
    pub id: NatureId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub up_stat: Option<Stat>,
    #[serde(default)]
    pub down_stat: Option<Stat>,
}

impl Nature {
    pub fn stat_modifier(&self, stat: Stat) -> f64 {
        if self.up_stat == self.down_stat {
            return 1.0;
        }
        if self.up_stat == Some(stat) {
            1.1
        } else if self.down_stat == Some(stat) {
            0.9
        } else {
            1.0
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Form {
    pub id: FormId,
    pub name: String,
    #[serde(default)]
    pub element_id: Option<ElementId>,
    #[serde(default)]
    pub rarity_id: Option<RarityId>,
    pub base_hp: u32,
    pub base_atk: u32,
    pub base_def: u32,
    pub base_spd: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FormSkill {
    pub form_id: FormId,
    pub skill_id: SkillId,
    #[serde(default)]
    pub learn_level: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    #[serde(default)]
    pub element_id: Option<ElementId>,
    #[serde(default)]
    pub kind: SkillKind,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
    /// Skills without a target tag aim at the opponent.
    #[serde(default = "enemy_scope")]
    pub target: Scope,
}

impl Skill {
    pub fn is_ally_target(&self) -> bool {
        self.target != Scope::Enemy
    }
}

/// One declarative step of a skill, executed in ascending `seq`.
#[derive(Clone, Debug, Deserialize)]
pub struct SkillEffect {
    #[serde(default)]
    pub id: u32,
    pub skill_id: SkillId,
    #[serde(default)]
    pub seq: i32,
    #[serde(default)]
    pub trigger: Trigger,
    pub effect_type: EffectKind,
    #[serde(default)]
    pub target: Scope,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub chance: Option<f64>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub status_id: Option<StatusId>,
    #[serde(default)]
    pub stat: Option<Stat>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default, alias = "condition_json")]
    pub condition: Option<Condition>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StatusEffect {
    pub id: StatusId,
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub default_duration: Option<u32>,
}

impl StatusEffect {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.code
        } else {
            &self.name
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentKind {
    StatMod,
    AccMod,
    DamageTakenMult,
    SkipTurnChance,
    DotMaxhpRatio,
    RegenMaxhpRatio,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StatusComponent {
    #[serde(default)]
    pub id: u32,
    pub status_id: StatusId,
    /// The kind alone decides where the component hooks in.
    #[serde(alias = "component_type")]
    pub kind: ComponentKind,
    #[serde(default)]
    pub stat: Option<Stat>,
    #[serde(default)]
    pub value: f64,
    #[serde(default, alias = "condition_json")]
    pub condition: Option<Condition>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SynergyModifier {
    #[serde(default)]
    pub remove_status: Option<String>,
    #[serde(default)]
    pub apply_status: Option<String>,
    #[serde(default)]
    pub apply_duration: Option<u32>,
    #[serde(default)]
    pub extend_status: Option<String>,
    #[serde(default)]
    pub extend_turns: Option<u32>,
    #[serde(default)]
    pub cleanse_debuffs: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SynergyRule {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub trigger: Trigger,
    #[serde(default = "one")]
    pub chance: f64,
    #[serde(default, alias = "condition_json")]
    pub condition: Option<Condition>,
    #[serde(default, alias = "modifier_json")]
    pub modifier: SynergyModifier,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Heal,
    HealRatio,
    Cleanse,
    Ball,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Item {
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub value: f64,
    #[serde(default = "one")]
    pub capture_modifier: f64,
}

impl Item {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.code
        } else {
            &self.name
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct StatSpread {
    #[serde(default)]
    pub hp: u32,
    #[serde(default)]
    pub atk: u32,
    #[serde(default)]
    pub def: u32,
    #[serde(default)]
    pub spd: u32,
}

/// Persisted monster as the save layer stores it.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MonsterRecord {
    pub form_id: FormId,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub nature_id: Option<NatureId>,
    #[serde(default)]
    pub iv: StatSpread,
    #[serde(default)]
    pub ev: StatSpread,
    #[serde(default)]
    pub current_hp: Option<u32>,
    #[serde(default)]
    pub battle_count: u32,
    #[serde(default)]
    pub skills: Vec<SkillId>,
    #[serde(default)]
    pub nickname: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BattleMode {
    #[default]
    Wild,
    Trainer,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct Reward {
    #[serde(default)]
    pub exp: u32,
    #[serde(default)]
    pub gold: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Encounter {
    #[serde(default)]
    pub mode: BattleMode,
    #[serde(default)]
    pub allow_capture: bool,
    #[serde(default)]
    pub reward: Option<Reward>,
    pub player: Vec<MonsterRecord>,
    pub enemy: Vec<MonsterRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_tags_starting_with_enemy_target_the_opponent() {
        assert_eq!(Scope::from_tag("ENEMY"), Scope::Enemy);
        assert_eq!(Scope::from_tag("ENEMY_SINGLE"), Scope::Enemy);
        assert_eq!(Scope::from_tag("SELF"), Scope::Caster);
        assert_eq!(Scope::from_tag("ALLY"), Scope::Caster);
    }

    #[test]
    fn untagged_skills_target_the_opponent() {
        let skill: Skill =
            serde_json::from_str(r#"{"id": 1, "name": "Tackle"}"#).expect("skill parses");
        assert_eq!(skill.target, Scope::Enemy);
        assert!(!skill.is_ally_target());
        let buff: Skill = serde_json::from_str(r#"{"id": 2, "name": "Focus", "target": "SELF"}"#)
            .expect("skill parses");
        assert!(buff.is_ally_target());
    }

    #[test]
    fn unknown_effect_kinds_fall_into_unsupported() {
        let effect: SkillEffect = serde_json::from_str(
            r#"{"skill_id": 1, "effect_type": "SUMMON_METEOR", "target": "ENEMY"}"#,
        )
        .expect("effect parses");
        assert_eq!(effect.effect_type, EffectKind::Unsupported);
        assert_eq!(effect.trigger, Trigger::OnCast);
        assert_eq!(effect.target, Scope::Enemy);
    }

    #[test]
    fn neutral_nature_leaves_stats_alone() {
        let nature = Nature {
            id: 1,
            name: "Calm".to_string(),
            up_stat: Some(Stat::Atk),
            down_stat: Some(Stat::Atk),
        };
        assert_eq!(nature.stat_modifier(Stat::Atk), 1.0);
        let brave = Nature {
            id: 2,
            name: "Brave".to_string(),
            up_stat: Some(Stat::Atk),
            down_stat: Some(Stat::Spd),
        };
        assert!((brave.stat_modifier(Stat::Atk) - 1.1).abs() < f64::EPSILON);
        assert!((brave.stat_modifier(Stat::Spd) - 0.9).abs() < f64::EPSILON);
        assert_eq!(brave.stat_modifier(Stat::Def), 1.0);
    }
}
