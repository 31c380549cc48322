use arena_game::{ArenaState, UpgradeTarget};
use rand::Rng;
use serde::Serialize;

/// One scripted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Train,
    Buy(UpgradeTarget),
    Battle,
}

/// Train by default, battle on a fixed cadence, and shop when coins allow.
///
/// Occasionally the policy tries an item it cannot afford so refusals get
/// exercised as well.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedPolicy {
    pub battle_every: usize,
    pub shop_chance: f64,
    pub overreach_chance: f64,
}

impl Default for ScriptedPolicy {
    fn default() -> Self {
        Self {
            battle_every: 4,
            shop_chance: 0.5,
            overreach_chance: 0.1,
        }
    }
}

impl ScriptedPolicy {
    pub fn next_action<R: Rng + ?Sized>(
        &self,
        step: usize,
        state: &ArenaState,
        rng: &mut R,
    ) -> Action {
        if self.battle_every > 0 && step % self.battle_every == self.battle_every - 1 {
            return Action::Battle;
        }
        let coins = state.player.coins;
        let affordable: Vec<UpgradeTarget> = UpgradeTarget::ALL
            .into_iter()
            .filter(|target| target.list_price() <= coins)
            .collect();
        if rng.gen_bool(self.overreach_chance)
            && let Some(target) = UpgradeTarget::ALL
                .into_iter()
                .find(|target| target.list_price() > coins)
        {
            return Action::Buy(target);
        }
        if !affordable.is_empty() && rng.gen_bool(self.shop_chance) {
            let idx = rng.gen_range(0..affordable.len());
            return Action::Buy(affordable[idx]);
        }
        Action::Train
    }
}
