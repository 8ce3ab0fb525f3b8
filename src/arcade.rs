//! Game session controller
//!
//! `NotStarted -> Playing <-> Paused`, and `Playing -> GameOver` exactly once
//! per session. The controller owns the session, spawns the next wave as soon
//! as the current one is cleared, and hands the final score to the report sink
//! when a scored session ends.

use std::sync::Arc;

use serde::Serialize;

use crate::persistence::{Anonymous, AuthProvider, ReportSink, ScoreReport};
use crate::settings::GameMode;
use crate::sim::{
    self, Block, BlockId, GameEvent, GamePhase, GameState, Operation, QuestionProvider,
    SelectOutcome, TickOutcome,
};
use crate::tuning::Tuning;

/// Read-only view for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub score: u64,
    pub wave: u32,
    pub operation: Operation,
    pub target: u32,
    pub blocks: Vec<Block>,
    pub selection: Vec<BlockId>,
    pub difficulty: f32,
    pub time_ticks: u64,
}

impl Snapshot {
    /// Taps the autopilot would make on this wave
    pub fn autopilot_taps(&self) -> Option<Vec<BlockId>> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        sim::autopilot::plan(
            self.operation,
            self.target,
            &self.blocks,
            &self.selection,
        )
    }
}

pub struct Arcade {
    state: GameState,
    provider: QuestionProvider,
    tuning: Tuning,
    auth: Arc<dyn AuthProvider>,
    sink: Box<dyn ReportSink>,
    last_report: Option<ScoreReport>,
}

impl Arcade {
    /// Anonymous arcade: sessions are playable but never reported
    pub fn new(provider: QuestionProvider, tuning: Tuning, seed: u64) -> Self {
        Self {
            state: GameState::new(seed),
            provider,
            tuning,
            auth: Arc::new(Anonymous),
            sink: Box::new(|_: ScoreReport| {}),
            last_report: None,
        }
    }

    /// Report scored sessions of `auth`'s current user to `sink`
    pub fn with_reporting(
        mut self,
        auth: Arc<dyn AuthProvider>,
        sink: impl ReportSink + 'static,
    ) -> Self {
        self.auth = auth;
        self.sink = Box::new(sink);
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn mode(&self) -> GameMode {
        self.provider.mode()
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Report produced by the most recent scored game over
    pub fn last_report(&self) -> Option<&ScoreReport> {
        self.last_report.as_ref()
    }

    /// Begin a fresh session, discarding any previous one
    pub fn start(&mut self) {
        let seed = self.state.next_seed();
        self.state = GameState::new(seed);
        self.last_report = None;
        self.state.phase = GamePhase::Playing;
        let mode = self.mode().as_str();
        log::info!("Session started ({mode} mode, seed {seed})");
        self.spawn_next_wave();
    }

    pub fn pause(&mut self) {
        if self.state.phase == GamePhase::Playing {
            self.state.phase = GamePhase::Paused;
            log::info!("Paused at score {}", self.state.score);
        }
    }

    pub fn resume(&mut self) {
        if self.state.phase == GamePhase::Paused {
            self.state.phase = GamePhase::Playing;
            log::info!("Resumed");
        }
    }

    /// Handle a tap on a block
    pub fn select(&mut self, id: &BlockId) -> SelectOutcome {
        let outcome = sim::select(&mut self.state, id);
        if matches!(outcome, SelectOutcome::Matched { .. }) {
            self.spawn_next_wave();
        }
        outcome
    }

    /// Advance gravity by one tick
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = sim::tick(&mut self.state, &self.tuning);
        if outcome == TickOutcome::Landed {
            self.finish();
        }
        outcome
    }

    /// End the session now. Only the first call per session has any effect.
    pub fn game_over(&mut self) {
        if self.state.enter_game_over() {
            self.finish();
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.state.phase,
            score: self.state.score,
            wave: self.state.wave_index,
            operation: self.state.operation,
            target: self.state.target,
            blocks: self.state.blocks.clone(),
            selection: self.state.selection.clone(),
            difficulty: sim::difficulty_multiplier(self.state.score),
            time_ticks: self.state.time_ticks,
        }
    }

    fn spawn_next_wave(&mut self) {
        let question = self.provider.next(self.state.rng_mut());
        sim::spawn_wave(&mut self.state, question, &self.tuning);
    }

    fn finish(&mut self) {
        let score = self.state.score;
        log::info!(
            "Game over: score {score}, wave {}",
            self.state.wave_index
        );
        if score == 0 {
            return;
        }
        let Some(user_id) = self.auth.current_user() else {
            log::info!("Anonymous session, score not reported");
            return;
        };
        let report = ScoreReport::new(user_id, self.mode(), score);
        self.last_report = Some(report.clone());
        self.sink.submit(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::LANE_COUNT;
    use crate::persistence::SignedIn;
    use crate::sim::{QuestionRecord, plan_taps};
    use std::sync::Mutex;

    fn recording(arcade: Arcade) -> (Arcade, Arc<Mutex<Vec<ScoreReport>>>) {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();
        let arcade = arcade.with_reporting(Arc::new(SignedIn("u1".into())), move |r: ScoreReport| {
            sink.lock().unwrap().push(r)
        });
        (arcade, reports)
    }

    fn run_until_landed(arcade: &mut Arcade) {
        for _ in 0..1_000_000 {
            if arcade.tick() == TickOutcome::Landed {
                return;
            }
        }
        panic!("block never landed");
    }

    #[test]
    fn test_start_spawns_first_wave() {
        let mut arcade = Arcade::new(QuestionProvider::new(GameMode::Mixed), Tuning::default(), 1);
        assert_eq!(arcade.state().phase, GamePhase::NotStarted);
        arcade.start();
        let snap = arcade.snapshot();
        assert_eq!(snap.phase, GamePhase::Playing);
        assert_eq!(snap.blocks.len(), LANE_COUNT);
        assert_eq!(snap.wave, 1);
        assert_eq!(snap.score, 0);
        assert!(matches!(
            arcade.drain_events().as_slice(),
            [GameEvent::WaveSpawned { wave: 1, .. }]
        ));
    }

    #[test]
    fn test_match_spawns_next_wave_immediately() {
        let mut arcade = Arcade::new(
            QuestionProvider::new(GameMode::Multiply),
            Tuning::default(),
            2,
        );
        arcade.start();
        let first_ids: Vec<BlockId> = arcade
            .state()
            .blocks
            .iter()
            .map(|b| b.id.clone())
            .collect();
        for id in plan_taps(arcade.state()).unwrap() {
            arcade.select(&id);
        }
        let state = arcade.state();
        assert!(state.score > 0);
        assert_eq!(state.wave_index, 2);
        assert_eq!(state.blocks.len(), LANE_COUNT);
        assert!(state.blocks.iter().all(|b| !first_ids.contains(&b.id)));
    }

    #[test]
    fn test_scored_game_over_reports_once() {
        let provider = QuestionProvider::with_bank(
            GameMode::Add,
            [QuestionRecord::new(Operation::Add, &[3, 7, 2, 9, 1], 10)],
        );
        let (mut arcade, reports) = recording(Arcade::new(provider, Tuning::default(), 3));
        arcade.start();
        let ids: Vec<BlockId> = arcade.state().blocks[..2]
            .iter()
            .map(|b| b.id.clone())
            .collect();
        arcade.select(&ids[0]);
        arcade.select(&ids[1]);
        assert_eq!(arcade.state().score, 30);

        run_until_landed(&mut arcade);
        arcade.game_over();
        arcade.tick();
        arcade.game_over();

        let reports = reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0],
            ScoreReport {
                user_id: "u1".into(),
                game_mode: GameMode::Add,
                score: 30,
                wave_reached: 1,
                xp_gain: 15,
            }
        );
        assert_eq!(arcade.last_report(), Some(&reports[0]));
    }

    #[test]
    fn test_zero_score_is_not_reported() {
        let (mut arcade, reports) = recording(Arcade::new(
            QuestionProvider::new(GameMode::Mixed),
            Tuning::default(),
            4,
        ));
        arcade.start();
        run_until_landed(&mut arcade);
        assert!(arcade.state().is_game_over());
        assert!(reports.lock().unwrap().is_empty());
        assert!(arcade.last_report().is_none());
    }

    #[test]
    fn test_anonymous_session_is_not_reported() {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();
        let provider = QuestionProvider::new(GameMode::Square);
        let mut arcade = Arcade::new(provider, Tuning::default(), 5)
            .with_reporting(Arc::new(Anonymous), move |r: ScoreReport| {
                sink.lock().unwrap().push(r)
            });
        arcade.start();
        for id in plan_taps(arcade.state()).unwrap() {
            arcade.select(&id);
        }
        arcade.game_over();
        assert!(arcade.state().is_game_over());
        assert!(reports.lock().unwrap().is_empty());
    }

    #[test]
    fn test_pause_freezes_gravity_and_taps() {
        let mut arcade = Arcade::new(QuestionProvider::new(GameMode::Add), Tuning::default(), 6);
        arcade.start();
        arcade.tick();
        arcade.pause();
        let frozen = arcade.snapshot();
        assert_eq!(arcade.tick(), TickOutcome::Idle);
        let id = frozen.blocks[0].id.clone();
        assert_eq!(arcade.select(&id), SelectOutcome::Ignored);
        assert_eq!(arcade.snapshot(), frozen);

        arcade.resume();
        assert_eq!(arcade.tick(), TickOutcome::Falling);
    }

    #[test]
    fn test_restart_resets_session() {
        let mut arcade = Arcade::new(QuestionProvider::new(GameMode::Add), Tuning::default(), 7);
        arcade.start();
        for id in plan_taps(arcade.state()).unwrap() {
            arcade.select(&id);
        }
        run_until_landed(&mut arcade);
        let old_seed = arcade.state().seed;

        arcade.start();
        let state = arcade.state();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, 0);
        assert_eq!(state.wave_index, 1);
        assert_ne!(state.seed, old_seed);
    }
}
