use crate::catalogue::Catalogue;
use crate::ledger::{Ledger, ShieldAbsorb, StatModifier, StatusChange, StatusMeta};
use crate::model::{
    ElementId, FormId, MonsterRecord, NatureId, RarityId, SkillId, SkillKind, Stat, StatusId,
};
use anyhow::anyhow;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Side {
    Player,
    Enemy,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BattlerStats {
    pub max_hp: u32,
    pub atk: u32,
    pub def: u32,
    pub spd: u32,
    pub accuracy: f64,
}

impl BattlerStats {
    pub fn new(max_hp: u32, atk: u32, def: u32, spd: u32) -> Self {
        Self {
            max_hp,
            atk,
            def,
            spd,
            accuracy: 1.0,
        }
    }

    pub fn base(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Hp => self.max_hp as f64,
            Stat::Atk => self.atk as f64,
            Stat::Def => self.def as f64,
            Stat::Spd => self.spd as f64,
            Stat::Acc => self.accuracy,
            Stat::Unknown => 0.0,
        }
    }
}

/// Armed by a skill; lands on the next foe this battler damages.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PendingStatus {
    pub status_id: StatusId,
    pub chance: f64,
    pub duration: Option<u32>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DamageReport {
    pub amount: u32,
    pub absorbed: u32,
    pub hp_lost: u32,
    pub shield_broken: bool,
}

/// One side's creature for the length of a battle.
#[derive(Clone, Debug)]
pub struct Battler {
    pub side: Side,
    pub name: String,
    pub form_id: FormId,
    pub rarity_id: Option<RarityId>,
    pub nature_id: Option<NatureId>,
    pub element_id: Option<ElementId>,
    pub level: u32,
    pub stats: BattlerStats,
    hp: u32,
    ledger: Ledger,
    pub active_skills: Vec<SkillId>,
    pub passive_skills: Vec<SkillId>,
    pub pending_status: Option<PendingStatus>,
    pub battle_count: u32,
}

impl Battler {
    pub fn new(side: Side, name: impl Into<String>, stats: BattlerStats) -> Self {
        Self {
            side,
            name: name.into(),
            form_id: 0,
            rarity_id: None,
            nature_id: None,
            element_id: None,
            level: 1,
            hp: stats.max_hp,
            stats,
            ledger: Ledger::default(),
            active_skills: Vec::new(),
            passive_skills: Vec::new(),
            pending_status: None,
            battle_count: 0,
        }
    }

    pub fn with_element(mut self, element_id: ElementId) -> Self {
        self.element_id = Some(element_id);
        self
    }

    pub fn with_skills(mut self, active: Vec<SkillId>, passive: Vec<SkillId>) -> Self {
        self.active_skills = active;
        self.passive_skills = passive;
        self
    }

    pub fn with_hp(mut self, hp: u32) -> Self {
        self.hp = hp.min(self.stats.max_hp);
        self
    }

    /// Materializes a persisted monster against the catalogue.
    pub fn from_record(
        side: Side,
        record: &MonsterRecord,
        catalogue: &Catalogue,
    ) -> anyhow::Result<Self> {
        let form = catalogue
            .form(record.form_id)
            .ok_or_else(|| anyhow!("Form {} not found in catalogue", record.form_id))?;
        let nature = record.nature_id.and_then(|id| catalogue.nature(id));
        let nature_mod = |stat: Stat| nature.map(|n| n.stat_modifier(stat)).unwrap_or(1.0);
        let rarity_mult = form
            .rarity_id
            .and_then(|id| catalogue.rarity(id))
            .map(|rarity| rarity.stat_multiplier)
            .unwrap_or(1.0);
        let level = record.level.max(1);
        let scale = |value: u32| ((value as f64) * rarity_mult).floor().max(1.0) as u32;
        let stats = BattlerStats::new(
            scale(calc_hp(form.base_hp, record.iv.hp, record.ev.hp, level)),
            scale(calc_stat(
                form.base_atk,
                record.iv.atk,
                record.ev.atk,
                level,
                nature_mod(Stat::Atk),
            )),
            scale(calc_stat(
                form.base_def,
                record.iv.def,
                record.ev.def,
                level,
                nature_mod(Stat::Def),
            )),
            scale(calc_stat(
                form.base_spd,
                record.iv.spd,
                record.ev.spd,
                level,
                nature_mod(Stat::Spd),
            )),
        );

        let skill_ids: Vec<SkillId> = if record.skills.is_empty() {
            catalogue
                .learnset(form.id)
                .iter()
                .filter(|entry| entry.learn_level <= level)
                .map(|entry| entry.skill_id)
                .collect()
        } else {
            record.skills.clone()
        };
        let mut active = Vec::new();
        let mut passive = Vec::new();
        for id in skill_ids {
            match catalogue.skill(id).map(|skill| skill.kind) {
                Some(SkillKind::Active) => active.push(id),
                Some(SkillKind::Passive) => passive.push(id),
                Some(SkillKind::Other) => {
                    tracing::warn!(skill = id, form = form.id, "skill has unsupported kind, skipped")
                }
                None => tracing::warn!(skill = id, form = form.id, "unknown skill id, skipped"),
            }
        }

        let name = record
            .nickname
            .clone()
            .unwrap_or_else(|| form.name.clone());
        let mut battler = Battler::new(side, name, stats).with_skills(active, passive);
        battler.form_id = form.id;
        battler.rarity_id = form.rarity_id;
        battler.nature_id = record.nature_id;
        battler.element_id = form.element_id;
        battler.level = level;
        battler.battle_count = record.battle_count;
        battler.hp = record
            .current_hp
            .map(|hp| hp.min(stats.max_hp))
            .unwrap_or(stats.max_hp);
        Ok(battler)
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn hp_ratio(&self) -> f64 {
        if self.stats.max_hp == 0 {
            return 0.0;
        }
        self.hp as f64 / self.stats.max_hp as f64
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Deals `amount` through the shield first; HP never drops below zero.
    pub fn apply_damage(&mut self, amount: u32, shield: Option<StatusId>) -> DamageReport {
        let ShieldAbsorb { absorbed, broken } = match shield {
            Some(id) => self.ledger.absorb(id, amount),
            None => ShieldAbsorb::default(),
        };
        let through = amount - absorbed;
        let hp_lost = through.min(self.hp);
        self.hp -= hp_lost;
        DamageReport {
            amount,
            absorbed,
            hp_lost,
            shield_broken: broken,
        }
    }

    /// Restores up to `amount` HP; returns what was actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.stats.max_hp - self.hp);
        self.hp += healed;
        healed
    }

    pub fn apply_status(&mut self, id: StatusId, turns: u32, meta: StatusMeta) -> StatusChange {
        self.ledger.apply_status(id, turns, meta)
    }

    pub fn remove_status(&mut self, id: StatusId) -> bool {
        self.ledger.remove_status(id)
    }

    pub fn extend_status(&mut self, id: StatusId, turns: u32) -> bool {
        self.ledger.extend_status(id, turns)
    }

    pub fn has_status(&self, id: StatusId) -> bool {
        self.ledger.has_status(id)
    }

    pub fn push_modifier(&mut self, stat: Stat, delta: f64, turns: u32) {
        self.ledger.push_modifier(stat, delta, turns);
    }

    pub fn cleanse(&mut self, count: u32, is_buff: impl Fn(StatusId) -> bool) -> Vec<StatusId> {
        self.ledger.cleanse(count, is_buff)
    }

    pub fn tick(&mut self) -> Vec<StatusId> {
        self.ledger.tick()
    }

    /// Base stat scaled by the clamped multiplier, floored.
    pub fn effective_stat(&self, stat: Stat, catalogue: &Catalogue, range: (f64, f64)) -> f64 {
        (self.stats.base(stat) * self.ledger.stat_multiplier(stat, catalogue, range)).floor()
    }

    pub fn view(&self, catalogue: &Catalogue) -> BattlerView {
        BattlerView {
            side: self.side,
            name: self.name.clone(),
            form_id: self.form_id,
            level: self.level,
            hp: self.hp,
            max_hp: self.stats.max_hp,
            element: self
                .element_id
                .and_then(|id| catalogue.element(id))
                .map(|element| element.name.clone()),
            statuses: self
                .ledger
                .statuses()
                .map(|(id, instance)| StatusView {
                    id,
                    name: catalogue.status_name(id),
                    turns_left: instance.turns_left,
                    shield: instance.meta.shield,
                })
                .collect(),
            modifiers: self.ledger.modifiers().to_vec(),
        }
    }
}

/// Read-only HUD snapshot of a combatant.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BattlerView {
    pub side: Side,
    pub name: String,
    pub form_id: FormId,
    pub level: u32,
    pub hp: u32,
    pub max_hp: u32,
    pub element: Option<String>,
    pub statuses: Vec<StatusView>,
    pub modifiers: Vec<StatModifier>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub id: StatusId,
    pub name: String,
    pub turns_left: u32,
    pub shield: Option<u32>,
}

/// Widened so absurd persisted values saturate instead of overflowing.
fn scaled_base(base: u32, iv: u32, ev: u32, level: u32) -> u64 {
    let base_value = u64::from(base) * 2 + u64::from(iv) + u64::from(ev) / 4;
    base_value * u64::from(level) / 100
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

pub fn calc_hp(base: u32, iv: u32, ev: u32, level: u32) -> u32 {
    saturate(scaled_base(base, iv, ev, level) + u64::from(level) + 10)
}

pub fn calc_stat(base: u32, iv: u32, ev: u32, level: u32, nature_mod: f64) -> u32 {
    let value = ((scaled_base(base, iv, ev, level) + 5) as f64 * nature_mod).floor();
    // float-to-int casts saturate
    value as u32
}
