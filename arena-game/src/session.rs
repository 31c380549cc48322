//! Session container binding state, randomness and observers together.
//!
//! Every accepted mutation goes through a single commit path: derived data
//! (leaderboard ranks, achievements) is refreshed, then each subscribed
//! [`StateObserver`] receives a snapshot together with the changed domains.
use crate::battle::{
    self, BattleOutcome, BattlePhase, BattleReward, BattleState, TurnDraws, advance_turn,
};
use crate::config::ArenaConfig;
use crate::constants::NICKNAME_MAX_CHARS;
use crate::error::ArenaError;
use crate::leaderboard;
use crate::progression::{TrainingOutcome, TrainingRoll, apply_training};
use crate::rng::RngBundle;
use crate::shop::{Purchase, UpgradeTarget, apply_upgrade};
use crate::state::{Activity, ArenaSnapshot, ArenaState, ChangeSet};

/// Receives every committed change.
pub trait StateObserver {
    fn on_commit(&mut self, snapshot: &ArenaSnapshot, changes: ChangeSet);
}

/// Result of dismissing the battle view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleClose {
    /// No battle was open.
    NothingOpen,
    /// A resolved battle was cleared.
    Dismissed(BattleOutcome),
    /// A running battle was stopped without reward or penalty.
    Cancelled,
    /// The battle keeps running in the background.
    StillRunning,
}

/// Outcome of a single battle tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleTick {
    Continue,
    Resolved(BattleReward),
}

pub struct ArenaSession {
    state: ArenaState,
    activity: Activity,
    battle: Option<BattleState>,
    rng: RngBundle,
    config: ArenaConfig,
    observers: Vec<Box<dyn StateObserver>>,
}

impl std::fmt::Debug for ArenaSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaSession")
            .field("state", &self.state)
            .field("activity", &self.activity)
            .field("battle", &self.battle)
            .field("seed", &self.rng.seed())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl ArenaSession {
    /// Construct a session over `state` with randomness derived from `seed`.
    #[must_use]
    pub fn new(state: ArenaState, config: ArenaConfig, seed: u64) -> Self {
        Self {
            state,
            activity: Activity::Idle,
            battle: None,
            rng: RngBundle::from_user_seed(seed),
            config,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn StateObserver>) {
        self.observers.push(observer);
    }

    #[must_use]
    pub const fn state(&self) -> &ArenaState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    #[must_use]
    pub const fn activity(&self) -> Activity {
        self.activity
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    #[must_use]
    pub const fn battle(&self) -> Option<&BattleState> {
        self.battle.as_ref()
    }

    #[must_use]
    pub fn battle_phase(&self) -> BattlePhase {
        self.battle.as_ref().map_or(BattlePhase::Idle, |b| b.phase)
    }

    /// Owned copy of the current state for views.
    #[must_use]
    pub fn snapshot(&self) -> ArenaSnapshot {
        ArenaSnapshot::capture(&self.state, self.activity, self.battle.as_ref())
    }

    const fn ensure_idle(&self) -> Result<(), ArenaError> {
        match self.activity {
            Activity::Idle => Ok(()),
            Activity::Training => Err(ArenaError::TrainingInProgress),
            Activity::Battle => Err(ArenaError::BattleInProgress),
        }
    }

    // Training -------------------------------------------------------------

    /// Enter the training state. The caller commits with
    /// [`Self::complete_training`] once its delay elapses.
    ///
    /// # Errors
    ///
    /// Returns an error while another training action or a battle is outstanding.
    pub fn begin_training(&mut self) -> Result<(), ArenaError> {
        self.ensure_idle()?;
        self.activity = Activity::Training;
        log::debug!("training started");
        Ok(())
    }

    /// Draw experience gains, apply them and leave the training state.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::NotTraining`] when no training was started.
    pub fn complete_training(&mut self) -> Result<TrainingOutcome, ArenaError> {
        if self.activity != Activity::Training {
            return Err(ArenaError::NotTraining);
        }
        let roll = TrainingRoll::draw(self.rng.training());
        let outcome = apply_training(&mut self.state.player, &mut self.state.companion, roll);
        self.activity = Activity::Idle;
        if outcome.player.leveled_up() {
            log::info!("player reached level {}", self.state.player.level);
        }
        if outcome.companion.leveled_up() {
            log::info!(
                "{} reached level {}",
                self.state.companion.name,
                self.state.companion.level
            );
        }
        self.commit(ChangeSet::player_and_companion());
        Ok(outcome)
    }

    /// Begin and complete a training action without a delay.
    ///
    /// # Errors
    ///
    /// Returns an error while another action is outstanding.
    pub fn train(&mut self) -> Result<TrainingOutcome, ArenaError> {
        self.begin_training()?;
        self.complete_training()
    }

    // Battle ---------------------------------------------------------------

    /// Pick a random opponent and open a battle at full health.
    ///
    /// # Errors
    ///
    /// Returns an error while another action is outstanding or when the
    /// leaderboard holds nobody but the player.
    pub fn start_battle(&mut self) -> Result<&BattleState, ArenaError> {
        self.ensure_idle()?;
        log::debug!("selecting opponent");
        let opponent = battle::select_opponent(
            &self.state.leaderboard,
            &self.state.player.nickname,
            self.rng.matchmaking(),
        )
        .ok_or(ArenaError::NoOpponents)?;
        log::info!(
            "battle started: {} vs {}",
            self.state.player.nickname,
            opponent.nickname
        );
        self.activity = Activity::Battle;
        Ok(self.battle.insert(BattleState::new(
            &self.state.player,
            &self.state.companion,
            &opponent,
        )))
    }

    /// Play one turn of the running battle.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::NoBattle`] when no battle is running.
    pub fn advance_battle(&mut self) -> Result<BattleTick, ArenaError> {
        let current = self
            .battle
            .as_ref()
            .filter(|b| b.is_running())
            .ok_or(ArenaError::NoBattle)?;
        let draws = TurnDraws::draw(self.rng.battle());
        let next = advance_turn(current, draws);
        let outcome = next.outcome();
        self.battle = Some(next);
        match outcome {
            Some(outcome) => Ok(BattleTick::Resolved(self.resolve_battle(outcome))),
            None => Ok(BattleTick::Continue),
        }
    }

    /// Tick the running battle until it resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::NoBattle`] when no battle is running.
    pub fn run_battle_to_end(&mut self) -> Result<BattleReward, ArenaError> {
        loop {
            if let BattleTick::Resolved(reward) = self.advance_battle()? {
                return Ok(reward);
            }
        }
    }

    fn resolve_battle(&mut self, outcome: BattleOutcome) -> BattleReward {
        let reward = battle::apply_battle_result(&mut self.state.player, outcome);
        self.activity = Activity::Idle;
        log::info!(
            "battle resolved: {:?} (wins {}, losses {})",
            outcome,
            self.state.player.wins,
            self.state.player.losses
        );
        self.commit(ChangeSet::player());
        reward
    }

    /// Dismiss the battle view.
    ///
    /// A running battle is cancelled when `cancel_battle_on_close` is set;
    /// otherwise it keeps running and must still be ticked to completion.
    pub fn close_battle(&mut self) -> BattleClose {
        let Some(current) = self.battle.as_ref() else {
            return BattleClose::NothingOpen;
        };
        if let Some(outcome) = current.outcome() {
            self.battle = None;
            return BattleClose::Dismissed(outcome);
        }
        if !self.config.cancel_battle_on_close {
            return BattleClose::StillRunning;
        }
        log::info!("battle against {} cancelled", current.opponent.name);
        self.battle = None;
        self.activity = Activity::Idle;
        BattleClose::Cancelled
    }

    // Shop -----------------------------------------------------------------

    /// Spend `cost` coins on `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InsufficientCoins`] without touching state when
    /// the player cannot pay.
    pub fn buy_upgrade(&mut self, cost: u32, target: UpgradeTarget) -> Result<Purchase, ArenaError> {
        let coins = self.state.player.coins;
        let purchase = apply_upgrade(
            &mut self.state.player,
            &mut self.state.companion,
            cost,
            target,
        )
        .ok_or(ArenaError::InsufficientCoins { cost, coins })?;
        log::debug!("bought {} for {cost}", target.label());
        let changes = match target {
            UpgradeTarget::Companion => ChangeSet::player_and_companion(),
            UpgradeTarget::Strength | UpgradeTarget::Elixir => ChangeSet::player(),
        };
        self.commit(changes);
        Ok(purchase)
    }

    /// Buy `target` at its list price.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InsufficientCoins`] when the player cannot pay.
    pub fn buy_item(&mut self, target: UpgradeTarget) -> Result<Purchase, ArenaError> {
        self.buy_upgrade(target.list_price(), target)
    }

    // Profile --------------------------------------------------------------

    /// Rename the player and move their leaderboard row.
    ///
    /// # Errors
    ///
    /// Returns an error for empty or overlong names, and for names held by
    /// another leaderboard entry.
    pub fn set_nickname(&mut self, name: &str) -> Result<(), ArenaError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > NICKNAME_MAX_CHARS {
            return Err(ArenaError::InvalidNickname {
                max: NICKNAME_MAX_CHARS,
            });
        }
        let old = self.state.player.nickname.clone();
        if name == old {
            return Ok(());
        }
        let taken = leaderboard::is_seed_nickname(name)
            || self
                .state
                .leaderboard
                .iter()
                .any(|entry| entry.nickname != old && entry.nickname == name);
        if taken {
            return Err(ArenaError::NicknameTaken(name.to_string()));
        }
        self.state.player.nickname = name.to_string();
        self.state.leaderboard = leaderboard::rename(&self.state.leaderboard, &old, &self.state.player);
        log::info!("nickname changed from {old} to {name}");
        self.commit(ChangeSet {
            leaderboard: true,
            ..ChangeSet::player()
        });
        Ok(())
    }

    // Commit ---------------------------------------------------------------

    fn commit(&mut self, mut changes: ChangeSet) {
        if changes.player && self.state.refresh_leaderboard() {
            changes.leaderboard = true;
        }
        if changes.player || changes.companion {
            let unlocked = self.state.refresh_achievements();
            for kind in &unlocked {
                log::info!("achievement unlocked: {}", kind.name());
            }
            if !unlocked.is_empty() {
                changes.achievements = true;
            }
        }
        if changes.is_empty() || self.observers.is_empty() {
            return;
        }
        log::debug!("committing {changes:?}");
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer.on_commit(&snapshot, changes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Recorder {
        commits: Rc<RefCell<Vec<ChangeSet>>>,
    }

    impl StateObserver for Recorder {
        fn on_commit(&mut self, _snapshot: &ArenaSnapshot, changes: ChangeSet) {
            self.commits.borrow_mut().push(changes);
        }
    }

    fn session() -> (ArenaSession, Recorder) {
        let mut session = ArenaSession::new(ArenaState::default(), ArenaConfig::default(), 11);
        let recorder = Recorder::default();
        session.subscribe(Box::new(recorder.clone()));
        (session, recorder)
    }

    #[test]
    fn training_guard_rejects_reentry() {
        let (mut session, recorder) = session();
        session.begin_training().unwrap();
        assert_eq!(session.begin_training(), Err(ArenaError::TrainingInProgress));
        assert_eq!(session.train(), Err(ArenaError::TrainingInProgress));
        assert!(matches!(session.start_battle(), Err(ArenaError::TrainingInProgress)));
        assert!(recorder.commits.borrow().is_empty());

        session.complete_training().unwrap();
        assert_eq!(session.activity(), Activity::Idle);
        assert_eq!(session.complete_training(), Err(ArenaError::NotTraining));
        let commits = recorder.commits.borrow();
        assert_eq!(commits.len(), 1);
        assert!(commits[0].player && commits[0].companion && commits[0].leaderboard);
    }

    #[test]
    fn battle_blocks_other_actions_until_resolved() {
        let (mut session, _) = session();
        session.start_battle().unwrap();
        assert_eq!(session.activity(), Activity::Battle);
        assert_eq!(session.train(), Err(ArenaError::BattleInProgress));
        assert!(matches!(session.start_battle(), Err(ArenaError::BattleInProgress)));

        let reward = session.run_battle_to_end().unwrap();
        assert_eq!(session.activity(), Activity::Idle);
        let player = &session.state().player;
        assert_eq!(player.wins + player.losses, 1);
        assert_eq!(session.battle_phase(), BattlePhase::Resolved(reward.outcome));
        assert_eq!(session.advance_battle(), Err(ArenaError::NoBattle));
    }

    #[test]
    fn empty_opponent_pool_refuses_battle() {
        let player = Player::default();
        let state = ArenaState::from_parts(player, Default::default(), Vec::new(), Vec::new());
        let mut session = ArenaSession::new(state, ArenaConfig::default(), 1);
        assert!(matches!(session.start_battle(), Err(ArenaError::NoOpponents)));
        assert_eq!(session.activity(), Activity::Idle);
        assert!(session.battle().is_none());
    }

    #[test]
    fn closing_running_battle_cancels_by_default() {
        let (mut session, recorder) = session();
        session.start_battle().unwrap();
        session.advance_battle().unwrap();
        assert_eq!(session.close_battle(), BattleClose::Cancelled);
        assert_eq!(session.activity(), Activity::Idle);
        assert_eq!(session.state().player.wins + session.state().player.losses, 0);
        assert!(recorder.commits.borrow().is_empty());
        assert_eq!(session.close_battle(), BattleClose::NothingOpen);
    }

    #[test]
    fn closing_without_cancel_keeps_battle_running() {
        let config = ArenaConfig {
            cancel_battle_on_close: false,
            ..ArenaConfig::default()
        };
        let mut session = ArenaSession::new(ArenaState::default(), config, 5);
        session.start_battle().unwrap();
        assert_eq!(session.close_battle(), BattleClose::StillRunning);
        let reward = session.run_battle_to_end().unwrap();
        assert_eq!(session.close_battle(), BattleClose::Dismissed(reward.outcome));
        assert_eq!(session.battle_phase(), BattlePhase::Idle);
    }

    #[test]
    fn purchase_refusal_is_a_no_op() {
        let (mut session, recorder) = session();
        session.buy_upgrade(30, UpgradeTarget::Strength).unwrap();
        let before = session.state().clone();
        assert_eq!(
            session.buy_upgrade(30, UpgradeTarget::Strength),
            Err(ArenaError::InsufficientCoins { cost: 30, coins: 20 })
        );
        assert_eq!(session.state(), &before);
        assert_eq!(recorder.commits.borrow().len(), 1);
    }

    #[test]
    fn companion_purchase_marks_companion_changed() {
        let (mut session, recorder) = session();
        session.buy_item(UpgradeTarget::Companion).unwrap();
        assert_eq!(session.state().companion.power, 10);
        let commits = recorder.commits.borrow();
        assert!(commits[0].companion);
        assert!(!commits[0].leaderboard);
    }

    #[test]
    fn nickname_rules() {
        let (mut session, _) = session();
        assert!(matches!(
            session.set_nickname("   "),
            Err(ArenaError::InvalidNickname { .. })
        ));
        assert!(matches!(
            session.set_nickname(&"x".repeat(25)),
            Err(ArenaError::InvalidNickname { .. })
        ));
        assert_eq!(
            session.set_nickname("IronFist"),
            Err(ArenaError::NicknameTaken("IronFist".to_string()))
        );
        session.set_nickname("  Titan ").unwrap();
        assert_eq!(session.state().player.nickname, "Titan");
        let board = &session.state().leaderboard;
        assert_eq!(board.len(), 9);
        assert!(board.iter().any(|e| e.nickname == "Titan"));
        assert!(board.iter().all(|e| e.nickname != "Champion"));
    }

    #[test]
    fn renamed_player_is_never_chosen_as_opponent() {
        let (mut session, _) = session();
        session.set_nickname("Titan").unwrap();
        for _ in 0..30 {
            let battle = session.start_battle().unwrap();
            assert_ne!(battle.opponent.name, "Titan");
            assert_ne!(battle.opponent.name, "Champion");
            session.close_battle();
        }
    }

    #[test]
    fn same_seed_same_run() {
        let run = |seed| {
            let mut session = ArenaSession::new(ArenaState::default(), ArenaConfig::default(), seed);
            for _ in 0..5 {
                session.train().unwrap();
            }
            session.start_battle().unwrap();
            session.run_battle_to_end().unwrap();
            session.snapshot()
        };
        assert_eq!(run(77), run(77));
    }
}
