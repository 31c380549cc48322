//! Leaderboard ranking.
//!
//! Ranks are derived data: they are reassigned from list position after every
//! sort and never consulted to decide ordering.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::player::Player;

/// One competitor on the leaderboard. `nickname` is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub nickname: String,
    pub level: u32,
    pub strength: u32,
    pub wins: u32,
    pub losses: u32,
    #[serde(default)]
    pub rank: u32,
}

impl LeaderboardEntry {
    #[must_use]
    pub fn new(nickname: &str, level: u32, strength: u32, wins: u32, losses: u32) -> Self {
        Self {
            nickname: nickname.to_string(),
            level,
            strength,
            wins,
            losses,
            rank: 0,
        }
    }

    /// Standing of the player as a leaderboard row.
    #[must_use]
    pub fn from_player(player: &Player) -> Self {
        Self::new(
            &player.nickname,
            player.level,
            player.strength,
            player.wins,
            player.losses,
        )
    }
}

/// Ordering used for ranking: wins desc, strength desc, losses asc.
#[must_use]
pub fn compare_standing(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.wins
        .cmp(&a.wins)
        .then_with(|| b.strength.cmp(&a.strength))
        .then_with(|| a.losses.cmp(&b.losses))
}

/// Synthetic opponents present on a fresh leaderboard.
#[must_use]
pub fn seed_entries() -> Vec<LeaderboardEntry> {
    let mut entries = vec![
        LeaderboardEntry::new("IronFist", 14, 96, 42, 6),
        LeaderboardEntry::new("StormBreaker", 12, 84, 35, 9),
        LeaderboardEntry::new("ShadowClaw", 10, 71, 27, 11),
        LeaderboardEntry::new("BoulderBash", 9, 65, 21, 14),
        LeaderboardEntry::new("VenomStrike", 7, 48, 15, 10),
        LeaderboardEntry::new("FrostByte", 5, 36, 9, 8),
        LeaderboardEntry::new("QuickSilver", 3, 24, 4, 6),
        LeaderboardEntry::new("RookieRex", 2, 15, 1, 3),
    ];
    assign_ranks(&mut entries);
    entries
}

/// Whether `nickname` belongs to one of the built-in opponents.
#[must_use]
pub fn is_seed_nickname(nickname: &str) -> bool {
    seed_entries()
        .iter()
        .any(|entry| entry.nickname.eq_ignore_ascii_case(nickname.trim()))
}

/// Sort by standing and rewrite ranks as contiguous 1-based positions.
pub fn assign_ranks(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(compare_standing);
    for (position, entry) in entries.iter_mut().enumerate() {
        entry.rank = u32::try_from(position + 1).unwrap_or(u32::MAX);
    }
}

/// Upsert `current` by nickname and return the re-ranked list.
#[must_use]
pub fn recompute(
    entries: &[LeaderboardEntry],
    current: &LeaderboardEntry,
) -> Vec<LeaderboardEntry> {
    let mut next = entries.to_vec();
    if let Some(existing) = next
        .iter_mut()
        .find(|entry| entry.nickname == current.nickname)
    {
        *existing = current.clone();
    } else {
        next.push(current.clone());
    }
    assign_ranks(&mut next);
    next
}

/// Move the player's row from `old_nickname` to the player's current name.
#[must_use]
pub fn rename(
    entries: &[LeaderboardEntry],
    old_nickname: &str,
    player: &Player,
) -> Vec<LeaderboardEntry> {
    let kept: Vec<LeaderboardEntry> = entries
        .iter()
        .filter(|entry| entry.nickname != old_nickname)
        .cloned()
        .collect();
    recompute(&kept, &LeaderboardEntry::from_player(player))
}

/// Entries eligible as battle opponents (everyone except the player).
#[must_use]
pub fn opponents<'a>(
    entries: &'a [LeaderboardEntry],
    player_nickname: &str,
) -> Vec<&'a LeaderboardEntry> {
    entries
        .iter()
        .filter(|entry| entry.nickname != player_nickname)
        .collect()
}

/// Player's current rank, if present.
#[must_use]
pub fn rank_of(entries: &[LeaderboardEntry], nickname: &str) -> Option<u32> {
    entries
        .iter()
        .find(|entry| entry.nickname == nickname)
        .map(|entry| entry.rank)
}

/// True when ranks are exactly 1..=N and follow the standing order.
#[must_use]
pub fn is_consistent(entries: &[LeaderboardEntry]) -> bool {
    let contiguous = entries
        .iter()
        .enumerate()
        .all(|(idx, entry)| usize::try_from(entry.rank).is_ok_and(|rank| rank == idx + 1));
    let ordered = entries
        .windows(2)
        .all(|pair| compare_standing(&pair[0], &pair[1]) != Ordering::Greater);
    contiguous && ordered
}
