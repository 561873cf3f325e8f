use crate::battler::Battler;
use crate::model::SkillId;
use crate::rng::BattleRng;

/// Picks the skill an automatically controlled battler uses this turn.
pub trait BattleAI {
    fn choose_skill<R: BattleRng>(
        &mut self,
        actor: &Battler,
        opponent: &Battler,
        rng: &mut R,
    ) -> Option<SkillId>;
}

/// Uniform choice among the actor's active skills, drawn from the battle RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomAI;

impl BattleAI for RandomAI {
    fn choose_skill<R: BattleRng>(
        &mut self,
        actor: &Battler,
        _opponent: &Battler,
        rng: &mut R,
    ) -> Option<SkillId> {
        if actor.active_skills.is_empty() {
            return None;
        }
        let idx = rng.pick(actor.active_skills.len());
        actor.active_skills.get(idx).copied()
    }
}
