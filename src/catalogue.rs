//! Read-only master data the engine resolves ids against.

use crate::model::{
    Element, ElementId, ElementMatchup, Form, FormId, FormSkill, Item, Nature, NatureId, Rarity,
    RarityId, Skill, SkillEffect, SkillId, StatusComponent, StatusEffect, StatusId, SynergyRule,
};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Raw master tables, one vector per exported table.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogueTables {
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub element_matchups: Vec<ElementMatchup>,
    #[serde(default)]
    pub rarities: Vec<Rarity>,
    #[serde(default)]
    pub natures: Vec<Nature>,
    #[serde(default)]
    pub monster_forms: Vec<Form>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub skill_effects: Vec<SkillEffect>,
    #[serde(default)]
    pub form_skills: Vec<FormSkill>,
    #[serde(default)]
    pub status_effects: Vec<StatusEffect>,
    #[serde(default)]
    pub status_effect_components: Vec<StatusComponent>,
    #[serde(default)]
    pub synergy_rules: Vec<SynergyRule>,
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Clone, Debug, Default)]
pub struct Catalogue {
    elements: HashMap<ElementId, Element>,
    matchups: HashMap<(ElementId, ElementId), f64>,
    rarities: HashMap<RarityId, Rarity>,
    natures: HashMap<NatureId, Nature>,
    forms: HashMap<FormId, Form>,
    skills: HashMap<SkillId, Skill>,
    skill_effects: HashMap<SkillId, Vec<SkillEffect>>,
    learnsets: HashMap<FormId, Vec<FormSkill>>,
    statuses: HashMap<StatusId, StatusEffect>,
    status_names: HashMap<String, StatusId>,
    status_components: HashMap<StatusId, Vec<StatusComponent>>,
    synergy_rules: Vec<SynergyRule>,
    items: HashMap<String, Item>,
}

impl Catalogue {
    pub fn from_tables(tables: CatalogueTables) -> Self {
        let mut catalogue = Catalogue::default();
        for element in tables.elements {
            catalogue.elements.insert(element.id, element);
        }
        for matchup in tables.element_matchups {
            catalogue.matchups.insert(
                (matchup.attacker_element_id, matchup.defender_element_id),
                matchup.multiplier,
            );
        }
        for rarity in tables.rarities {
            catalogue.rarities.insert(rarity.id, rarity);
        }
        for nature in tables.natures {
            catalogue.natures.insert(nature.id, nature);
        }
        for form in tables.monster_forms {
            catalogue.forms.insert(form.id, form);
        }
        for skill in tables.skills {
            catalogue.skills.insert(skill.id, skill);
        }
        for effect in tables.skill_effects {
            catalogue
                .skill_effects
                .entry(effect.skill_id)
                .or_default()
                .push(effect);
        }
        for effects in catalogue.skill_effects.values_mut() {
            // stable sort keeps table order for equal seq
            effects.sort_by_key(|effect| effect.seq);
        }
        for entry in tables.form_skills {
            catalogue.learnsets.entry(entry.form_id).or_default().push(entry);
        }
        for status in tables.status_effects {
            catalogue
                .status_names
                .insert(normalize_name(&status.code), status.id);
            if !status.name.is_empty() {
                catalogue
                    .status_names
                    .entry(normalize_name(&status.name))
                    .or_insert(status.id);
            }
            catalogue.statuses.insert(status.id, status);
        }
        for component in tables.status_effect_components {
            catalogue
                .status_components
                .entry(component.status_id)
                .or_default()
                .push(component);
        }
        catalogue.synergy_rules = tables.synergy_rules;
        for item in tables.items {
            catalogue.items.insert(normalize_name(&item.code), item);
        }
        catalogue
    }

    /// Loads one `<table>.json` per master table from `dir`.
    pub fn load_dir(dir: &Path) -> anyhow::Result<Self> {
        let tables = CatalogueTables {
            elements: read_table(dir, "elements")?,
            element_matchups: read_table(dir, "element_matchups")?,
            rarities: read_table(dir, "rarities")?,
            natures: read_table(dir, "natures")?,
            monster_forms: read_table(dir, "monster_forms")?,
            skills: read_table(dir, "skills")?,
            skill_effects: read_table(dir, "skill_effects")?,
            form_skills: read_table(dir, "form_skills")?,
            status_effects: read_table(dir, "status_effects")?,
            status_effect_components: read_table(dir, "status_effect_components")?,
            synergy_rules: read_table(dir, "synergy_rules")?,
            items: read_table(dir, "items")?,
        };
        Ok(Self::from_tables(tables))
    }

    /// Loads every table from a single JSON object keyed by table name.
    pub fn load_bundle(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalogue bundle at {}", path.display()))?;
        let tables: CatalogueTables = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
        Ok(Self::from_tables(tables))
    }

    pub fn form(&self, id: FormId) -> Option<&Form> {
        self.forms.get(&id)
    }

    pub fn rarity(&self, id: RarityId) -> Option<&Rarity> {
        self.rarities.get(&id)
    }

    pub fn nature(&self, id: NatureId) -> Option<&Nature> {
        self.natures.get(&id)
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn skill(&self, id: SkillId) -> Option<&Skill> {
        self.skills.get(&id)
    }

    /// Effects of a skill in ascending sequence order.
    pub fn skill_effects(&self, skill_id: SkillId) -> &[SkillEffect] {
        self.skill_effects
            .get(&skill_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn learnset(&self, form_id: FormId) -> &[FormSkill] {
        self.learnsets
            .get(&form_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn status(&self, id: StatusId) -> Option<&StatusEffect> {
        self.statuses.get(&id)
    }

    pub fn status_components(&self, status_id: StatusId) -> &[StatusComponent] {
        self.status_components
            .get(&status_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn status_id_by_name(&self, name: &str) -> Option<StatusId> {
        self.status_names.get(&normalize_name(name)).copied()
    }

    pub fn status_name(&self, id: StatusId) -> String {
        self.status(id)
            .map(|status| status.display_name().to_string())
            .unwrap_or_else(|| format!("status#{id}"))
    }

    /// Elemental multiplier; 1.0 when either side has no element or no entry exists.
    pub fn matchup(&self, attacker: Option<ElementId>, defender: Option<ElementId>) -> f64 {
        match (attacker, defender) {
            (Some(a), Some(d)) => self.matchups.get(&(a, d)).copied().unwrap_or(1.0),
            _ => 1.0,
        }
    }

    pub fn synergy_rules(&self) -> &[SynergyRule] {
        &self.synergy_rules
    }

    pub fn item(&self, code: &str) -> Option<&Item> {
        self.items.get(&normalize_name(code))
    }
}

fn read_table<T: DeserializeOwned>(dir: &Path, table: &str) -> anyhow::Result<Vec<T>> {
    let path = dir.join(format!("{table}.json"));
    if !path.exists() {
        tracing::warn!(table, dir = %dir.display(), "catalogue table missing, using empty table");
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read catalogue table at {}", path.display()))?;
    let rows: Vec<T> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
    tracing::debug!(table, rows = rows.len(), "loaded catalogue table");
    Ok(rows)
}

fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
