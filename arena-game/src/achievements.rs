//! Achievement catalog and unlock evaluation.
use serde::{Deserialize, Serialize};

use crate::constants::{
    COMPANION_MASTERY_LEVEL, FIRST_VICTORY_WINS, STRENGTH_MILESTONE_LEVEL, UNDEFEATED_WINS,
};
use crate::player::{Companion, Player};

/// Stable identifiers for every achievement in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    FirstSteps,
    StrengthMilestone,
    CompanionMastery,
    FirstVictory,
    Undefeated,
}

impl AchievementKind {
    pub const ALL: [Self; 5] = [
        Self::FirstSteps,
        Self::StrengthMilestone,
        Self::CompanionMastery,
        Self::FirstVictory,
        Self::Undefeated,
    ];

    #[must_use]
    pub const fn id(self) -> u32 {
        match self {
            Self::FirstSteps => 1,
            Self::StrengthMilestone => 2,
            Self::CompanionMastery => 3,
            Self::FirstVictory => 4,
            Self::Undefeated => 5,
        }
    }

    #[must_use]
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstSteps => "First Steps",
            Self::StrengthMilestone => "Strength Milestone",
            Self::CompanionMastery => "Companion Mastery",
            Self::FirstVictory => "First Victory",
            Self::Undefeated => "Undefeated",
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::FirstSteps => "Award",
            Self::StrengthMilestone => "Trophy",
            Self::CompanionMastery => "Star",
            Self::FirstVictory => "Swords",
            Self::Undefeated => "Shield",
        }
    }

    /// Unlock predicate over current progression state.
    #[must_use]
    pub const fn is_earned(self, player: &Player, companion: &Companion) -> bool {
        match self {
            Self::FirstSteps => true,
            Self::StrengthMilestone => player.level >= STRENGTH_MILESTONE_LEVEL,
            Self::CompanionMastery => companion.level >= COMPANION_MASTERY_LEVEL,
            Self::FirstVictory => player.wins >= FIRST_VICTORY_WINS,
            Self::Undefeated => player.wins >= UNDEFEATED_WINS && player.losses == 0,
        }
    }
}

/// Persisted achievement row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: u32,
    pub name: String,
    pub unlocked: bool,
    pub icon: String,
}

impl Achievement {
    #[must_use]
    pub fn from_kind(kind: AchievementKind, unlocked: bool) -> Self {
        Self {
            id: kind.id(),
            name: kind.name().to_string(),
            unlocked,
            icon: kind.icon().to_string(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Option<AchievementKind> {
        AchievementKind::from_id(self.id)
    }
}

/// Catalog in its initial state; only "First Steps" starts unlocked.
#[must_use]
pub fn default_achievements() -> Vec<Achievement> {
    AchievementKind::ALL
        .into_iter()
        .map(|kind| Achievement::from_kind(kind, kind == AchievementKind::FirstSteps))
        .collect()
}

/// Align a loaded list with the catalog.
///
/// Unknown ids are dropped, missing ids are added locked, and unlocked flags
/// survive. Names and icons are refreshed from the catalog.
#[must_use]
pub fn reconcile(loaded: &[Achievement]) -> Vec<Achievement> {
    AchievementKind::ALL
        .into_iter()
        .map(|kind| {
            let unlocked = loaded
                .iter()
                .any(|row| row.id == kind.id() && row.unlocked);
            Achievement::from_kind(kind, unlocked)
        })
        .collect()
}

/// Unlock every achievement whose predicate now holds.
///
/// Never locks anything. Returns the kinds unlocked by this call, so a second
/// call over the same state returns an empty list.
pub fn evaluate(
    achievements: &mut [Achievement],
    player: &Player,
    companion: &Companion,
) -> Vec<AchievementKind> {
    let mut newly_unlocked = Vec::new();
    for achievement in achievements.iter_mut().filter(|row| !row.unlocked) {
        if let Some(kind) = achievement.kind()
            && kind.is_earned(player, companion)
        {
            achievement.unlocked = true;
            newly_unlocked.push(kind);
        }
    }
    newly_unlocked
}

#[must_use]
pub fn unlocked_count(achievements: &[Achievement]) -> usize {
    achievements.iter().filter(|row| row.unlocked).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_unlocked(list: &[Achievement], kind: AchievementKind) -> bool {
        list.iter().any(|row| row.id == kind.id() && row.unlocked)
    }

    #[test]
    fn fresh_catalog_has_first_steps_only() {
        let list = default_achievements();
        assert_eq!(list.len(), 5);
        assert_eq!(unlocked_count(&list), 1);
        assert!(is_unlocked(&list, AchievementKind::FirstSteps));
    }

    #[test]
    fn thresholds_unlock_expected_entries() {
        let mut list = default_achievements();
        let player = Player {
            level: 10,
            wins: 1,
            ..Player::default()
        };
        let companion = Companion {
            level: 5,
            ..Companion::default()
        };
        let unlocked = evaluate(&mut list, &player, &companion);
        assert_eq!(
            unlocked,
            vec![
                AchievementKind::StrengthMilestone,
                AchievementKind::CompanionMastery,
                AchievementKind::FirstVictory,
            ]
        );
        assert!(!is_unlocked(&list, AchievementKind::Undefeated));
        assert!(evaluate(&mut list, &player, &companion).is_empty());
    }

    #[test]
    fn undefeated_requires_clean_record() {
        let mut list = default_achievements();
        let bruised = Player {
            wins: 12,
            losses: 1,
            ..Player::default()
        };
        evaluate(&mut list, &bruised, &Companion::default());
        assert!(!is_unlocked(&list, AchievementKind::Undefeated));

        let clean = Player {
            wins: 10,
            ..Player::default()
        };
        evaluate(&mut list, &clean, &Companion::default());
        assert!(is_unlocked(&list, AchievementKind::Undefeated));
    }

    #[test]
    fn unlocks_never_revert() {
        let mut list = default_achievements();
        let clean = Player {
            wins: 10,
            ..Player::default()
        };
        evaluate(&mut list, &clean, &Companion::default());
        let later = Player {
            wins: 10,
            losses: 4,
            ..Player::default()
        };
        evaluate(&mut list, &later, &Companion::default());
        assert!(is_unlocked(&list, AchievementKind::Undefeated));
    }

    #[test]
    fn reconcile_drops_unknown_and_restores_missing() {
        let loaded = vec![
            Achievement {
                id: 99,
                name: "Ghost".to_string(),
                unlocked: true,
                icon: "Ghost".to_string(),
            },
            Achievement::from_kind(AchievementKind::FirstVictory, true),
        ];
        let list = reconcile(&loaded);
        assert_eq!(list.len(), 5);
        assert!(list.iter().all(|row| row.id != 99));
        assert!(is_unlocked(&list, AchievementKind::FirstVictory));
        assert!(!is_unlocked(&list, AchievementKind::FirstSteps));
    }
}
