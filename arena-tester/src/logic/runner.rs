use arena_game::{
    ArenaConfig, ArenaEngine, ArenaError, ArenaSession, ArenaState, BattleOutcome, BattleTick,
    MemoryStorage,
};
use colored::Colorize;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::time::{Duration, Instant};

use super::checks::{self, Check, Violation};
use super::policy::{Action, ScriptedPolicy};

/// Upper bound on turns before a battle counts as non-terminating.
pub const MAX_BATTLE_TURNS: usize = 10_000;

#[derive(Debug, Clone, Serialize)]
pub struct SeedResult {
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub battles: u32,
    pub wins: u32,
    pub purchases: u32,
    pub refusals: u32,
    pub highest_level: u32,
    #[serde(serialize_with = "serialize_millis")]
    pub average_duration: Duration,
}

fn serialize_millis<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(value.as_secs_f64() * 1000.0)
}

/// Counters and violations from one scripted run.
#[derive(Debug, Default)]
pub struct IterationSummary {
    pub violations: Vec<Violation>,
    pub battles: u32,
    pub wins: u32,
    pub purchases: u32,
    pub refusals: u32,
    pub final_level: u32,
}

pub struct LogicTester {
    config: ArenaConfig,
    policy: ScriptedPolicy,
    verbose: bool,
}

impl LogicTester {
    pub fn new(config: ArenaConfig, verbose: bool) -> Self {
        Self {
            config,
            policy: ScriptedPolicy::default(),
            verbose,
        }
    }

    pub fn run_seed(&self, seed: u64, iterations: usize, actions: usize) -> SeedResult {
        let mut failures = Vec::new();
        let mut successes = 0;
        let mut durations = Vec::with_capacity(iterations);
        let mut totals = IterationSummary::default();

        for i in 0..iterations {
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let start = Instant::now();
            let summary = self.run_iteration(iteration_seed, actions);
            durations.push(start.elapsed());

            totals.battles += summary.battles;
            totals.wins += summary.wins;
            totals.purchases += summary.purchases;
            totals.refusals += summary.refusals;
            totals.final_level = totals.final_level.max(summary.final_level);

            if summary.violations.is_empty() {
                successes += 1;
            } else {
                for violation in &summary.violations {
                    failures.push(format!(
                        "Iteration {} (seed {iteration_seed}): {violation}",
                        i + 1
                    ));
                }
            }
            if self.verbose {
                println!(
                    "  {} seed {iteration_seed}: level {}, {}/{} battles won",
                    if summary.violations.is_empty() {
                        "ok".green()
                    } else {
                        "FAIL".red()
                    },
                    summary.final_level,
                    summary.wins,
                    summary.battles
                );
            }
        }

        let average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };

        SeedResult {
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            battles: totals.battles,
            wins: totals.wins,
            purchases: totals.purchases,
            refusals: totals.refusals,
            highest_level: totals.final_level,
            average_duration,
        }
    }

    /// Play `actions` scripted steps against fresh in-memory storage.
    pub fn run_iteration(&self, seed: u64, actions: usize) -> IterationSummary {
        let storage = MemoryStorage::new();
        let engine = ArenaEngine::new(storage, self.config.clone());
        let mut session = engine.open_session(seed);
        let mut policy_rng = ChaCha8Rng::seed_from_u64(seed);
        let mut summary = IterationSummary::default();

        for step in 0..actions {
            let before = session.state().clone();
            let action = self.policy.next_action(step, &before, &mut policy_rng);
            log::debug!("seed {seed} step {step}: {action:?}");
            match action {
                Action::Train => train(&mut session, &before, &mut summary.violations),
                Action::Buy(target) => {
                    let cost = target.list_price();
                    let result = session.buy_upgrade(cost, target);
                    match &result {
                        Ok(_) => summary.purchases += 1,
                        Err(_) => summary.refusals += 1,
                    }
                    checks::check_purchase(
                        &before,
                        session.state(),
                        cost,
                        &result,
                        &mut summary.violations,
                    );
                }
                Action::Battle => {
                    if let Some(won) = battle(&mut session, &before, &mut summary.violations) {
                        summary.battles += 1;
                        summary.wins += u32::from(won);
                    }
                }
            }
            checks::check_derived(&before, session.state(), &mut summary.violations);
        }

        let reloaded = engine.open_session(seed);
        if reloaded.state() != session.state() {
            summary.violations.push(Violation::new(
                Check::PersistenceRoundTrip,
                "reloaded state differs from session state",
            ));
        }
        summary.final_level = session.state().player.level;
        summary
    }
}

fn train(session: &mut ArenaSession, before: &ArenaState, out: &mut Vec<Violation>) {
    if let Err(err) = session.begin_training() {
        out.push(Violation::new(
            Check::SingleAction,
            format!("idle session refused training: {err}"),
        ));
        return;
    }
    if !matches!(session.start_battle(), Err(ArenaError::TrainingInProgress)) {
        out.push(Violation::new(
            Check::SingleAction,
            "battle accepted during training",
        ));
    }
    if let Err(err) = session.complete_training() {
        out.push(Violation::new(
            Check::SingleAction,
            format!("training could not complete: {err}"),
        ));
        return;
    }
    checks::check_training(before, session.state(), out);
}

/// Run one battle to completion. Returns whether it was won.
fn battle(
    session: &mut ArenaSession,
    before: &ArenaState,
    out: &mut Vec<Violation>,
) -> Option<bool> {
    if let Err(err) = session.start_battle() {
        out.push(Violation::new(
            Check::SingleAction,
            format!("idle session refused battle: {err}"),
        ));
        return None;
    }
    if session.train() != Err(ArenaError::BattleInProgress) {
        out.push(Violation::new(
            Check::SingleAction,
            "training accepted during battle",
        ));
    }
    for _ in 0..MAX_BATTLE_TURNS {
        match session.advance_battle() {
            Ok(BattleTick::Continue) => {}
            Ok(BattleTick::Resolved(reward)) => {
                let after = &session.state().player;
                checks::check_battle_reward(&before.player, after, &reward, out);
                session.close_battle();
                return Some(reward.outcome == BattleOutcome::Win);
            }
            Err(err) => {
                out.push(Violation::new(
                    Check::BattleTerminates,
                    format!("battle stopped unexpectedly: {err}"),
                ));
                return None;
            }
        }
    }
    out.push(Violation::new(
        Check::BattleTerminates,
        format!("battle still running after {MAX_BATTLE_TURNS} turns"),
    ));
    session.close_battle();
    None
}
