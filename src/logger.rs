use serde_json::json;

/// Human-readable battle log consumed by the UI layer.
#[derive(Clone, Debug, Default)]
pub struct BattleLogger {
    log: Vec<String>,
}

impl BattleLogger {
    pub fn new() -> Self {
        Self { log: Vec::new() }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::trace!(target: "battle_log", "{line}");
        self.log.push(line);
    }

    pub fn log_battle_start(&mut self, player: &str, enemy: &str) {
        self.push(format!("A battle begins: {player} vs {enemy}!"));
    }

    pub fn log_turn(&mut self, turn: u32) {
        self.push(format!("-- Turn {turn} --"));
    }

    pub fn log_skill(&mut self, user: &str, skill: &str) {
        self.push(format!("{user} used {skill}!"));
    }

    pub fn log_miss(&mut self, user: &str) {
        self.push(format!("{user}'s attack missed!"));
    }

    pub fn log_skip(&mut self, user: &str) {
        self.push(format!("{user} can't move!"));
    }

    pub fn log_damage(&mut self, target: &str, amount: u32, hp: u32, max_hp: u32) {
        self.push(format!("{target} took {amount} damage ({hp}/{max_hp})."));
    }

    pub fn log_effectiveness(&mut self, multiplier: f64) {
        if multiplier > 1.0 {
            self.push("It's super effective!");
        } else if multiplier < 1.0 {
            self.push("It's not very effective...");
        }
    }

    pub fn log_critical(&mut self) {
        self.push("A critical hit!");
    }

    pub fn log_shield_absorb(&mut self, target: &str, absorbed: u32) {
        self.push(format!("{target}'s shield absorbed {absorbed} damage."));
    }

    pub fn log_shield_broken(&mut self, target: &str) {
        self.push(format!("{target}'s shield broke!"));
    }

    pub fn log_heal(&mut self, target: &str, amount: u32, hp: u32, max_hp: u32) {
        self.push(format!("{target} recovered {amount} HP ({hp}/{max_hp})."));
    }

    pub fn log_status(&mut self, target: &str, status: &str, turns: u32) {
        self.push(format!("{target} is affected by {status} ({turns} turns)."));
    }

    pub fn log_status_removed(&mut self, target: &str, status: &str) {
        self.push(format!("{target} is no longer affected by {status}."));
    }

    pub fn log_stat_change(&mut self, target: &str, stat: &str, delta: f64, turns: u32) {
        let direction = if delta >= 0.0 { "rose" } else { "fell" };
        self.push(format!(
            "{target}'s {stat} {direction} by {:.0}% for {turns} turns.",
            delta.abs() * 100.0
        ));
    }

    pub fn log_faint(&mut self, target: &str) {
        self.push(format!("{target} fainted!"));
    }

    pub fn log_unknown(&mut self, what: &str) {
        self.push(format!("But nothing happened... ({what})"));
    }

    pub fn log_lines(&self) -> &[String] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "lines": self.log.len(),
            "log": self.log,
        })
    }
}
