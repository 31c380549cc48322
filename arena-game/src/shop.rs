//! Coin-funded upgrades.
use serde::{Deserialize, Serialize};

use crate::constants::{
    COMPANION_UPGRADE_AMOUNT, COMPANION_UPGRADE_COST, ELIXIR_COST, STRENGTH_UPGRADE_AMOUNT,
    STRENGTH_UPGRADE_COST,
};
use crate::player::{Companion, Player};
use crate::progression::level_up_player;

/// What a purchase improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeTarget {
    /// Protein shake: +10 strength.
    Strength,
    /// Companion food: +5 companion power.
    Companion,
    /// Legendary elixir: an immediate level-up.
    Elixir,
}

impl UpgradeTarget {
    pub const ALL: [Self; 3] = [Self::Strength, Self::Companion, Self::Elixir];

    /// Standard shop price.
    #[must_use]
    pub const fn list_price(self) -> u32 {
        match self {
            Self::Strength => STRENGTH_UPGRADE_COST,
            Self::Companion => COMPANION_UPGRADE_COST,
            Self::Elixir => ELIXIR_COST,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Strength => "Protein Shake",
            Self::Companion => "Companion Food",
            Self::Elixir => "Legendary Elixir",
        }
    }

    /// Parse a target name as used by the browser boundary and tester CLI.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strength" => Some(Self::Strength),
            "companion" | "pet" => Some(Self::Companion),
            "elixir" => Some(Self::Elixir),
            _ => None,
        }
    }
}

/// Receipt for an accepted purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub target: UpgradeTarget,
    pub cost: u32,
    pub coins_left: u32,
}

/// Whether `coins` covers `cost`.
#[must_use]
pub const fn can_afford(coins: u32, cost: u32) -> bool {
    coins >= cost
}

/// Deduct `cost` and apply the upgrade, or return `None` leaving both
/// records untouched when the player cannot pay.
pub fn apply_upgrade(
    player: &mut Player,
    companion: &mut Companion,
    cost: u32,
    target: UpgradeTarget,
) -> Option<Purchase> {
    if !can_afford(player.coins, cost) {
        return None;
    }
    player.coins -= cost;
    match target {
        UpgradeTarget::Strength => {
            player.strength = player.strength.saturating_add(STRENGTH_UPGRADE_AMOUNT);
        }
        UpgradeTarget::Companion => {
            companion.power = companion.power.saturating_add(COMPANION_UPGRADE_AMOUNT);
        }
        UpgradeTarget::Elixir => level_up_player(player),
    }
    Some(Purchase {
        target,
        cost,
        coins_left: player.coins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_purchase_leaves_state_unchanged() {
        let mut player = Player {
            coins: 20,
            ..Player::default()
        };
        let mut companion = Companion::default();
        let before = (player.clone(), companion.clone());
        assert!(apply_upgrade(&mut player, &mut companion, 30, UpgradeTarget::Strength).is_none());
        assert_eq!((player, companion), before);
    }

    #[test]
    fn strength_and_companion_upgrades_apply() {
        let mut player = Player {
            coins: 60,
            ..Player::default()
        };
        let mut companion = Companion::default();
        let receipt =
            apply_upgrade(&mut player, &mut companion, 30, UpgradeTarget::Strength).unwrap();
        assert_eq!(receipt.coins_left, 30);
        assert_eq!(player.strength, 20);

        apply_upgrade(&mut player, &mut companion, 25, UpgradeTarget::Companion).unwrap();
        assert_eq!(player.coins, 5);
        assert_eq!(companion.power, 10);
    }

    #[test]
    fn elixir_levels_up_without_touching_experience() {
        let mut player = Player {
            coins: 100,
            experience: 40,
            ..Player::default()
        };
        let mut companion = Companion::default();
        apply_upgrade(&mut player, &mut companion, 100, UpgradeTarget::Elixir).unwrap();
        assert_eq!(player.level, 2);
        assert_eq!(player.strength, 15);
        assert_eq!(player.experience, 40);
        assert_eq!(player.max_experience, 150);
        assert_eq!(player.coins, 0);
    }

    #[test]
    fn parses_target_names() {
        assert_eq!(UpgradeTarget::parse("pet"), Some(UpgradeTarget::Companion));
        assert_eq!(UpgradeTarget::parse(" Elixir "), Some(UpgradeTarget::Elixir));
        assert_eq!(UpgradeTarget::parse("sword"), None);
        assert_eq!(UpgradeTarget::Strength.list_price(), 30);
    }
}
