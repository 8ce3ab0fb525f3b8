//! Timer-driven arcade loop (native)
//!
//! The [`Arcade`] is moved into a single tokio task which owns it outright.
//! Input reaches it as [`Command`]s, gravity comes from an interval that is
//! only polled while a session is playing, and every change is published as a
//! [`Snapshot`]. Stopping or dropping the runner ends the task, so no tick can
//! ever touch a torn-down session.

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::arcade::{Arcade, Snapshot};
use crate::sim::{BlockId, GameEvent};

/// Capacity of the event broadcast; slow subscribers skip old events
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub enum Command {
    Start,
    Select(BlockId),
    Pause,
    Resume,
    /// End the game now (e.g. the player quits mid-run)
    GameOver,
    Stop,
}

pub struct ArcadeRunner {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    events: broadcast::Sender<GameEvent>,
    task: Option<JoinHandle<Arcade>>,
}

impl ArcadeRunner {
    /// Move `arcade` into a background task. Must be called inside a tokio runtime.
    pub fn spawn(arcade: Arcade) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshots) = watch::channel(arcade.snapshot());
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let task = tokio::spawn(run(arcade, command_rx, snapshot_tx, events.clone()));
        Self {
            commands,
            snapshots,
            events,
            task: Some(task),
        }
    }

    /// Queue a command. Returns `false` once the loop has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn start(&self) -> bool {
        self.send(Command::Start)
    }

    pub fn select(&self, id: BlockId) -> bool {
        self.send(Command::Select(id))
    }

    pub fn pause(&self) -> bool {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> bool {
        self.send(Command::Resume)
    }

    /// Latest published state
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    pub fn events(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Stop the loop and take the arcade back
    ///
    /// Persistence tasks already in flight keep running.
    pub async fn stop(mut self) -> Option<Arcade> {
        let _ = self.commands.send(Command::Stop);
        let task = self.task.take()?;
        match task.await {
            Ok(arcade) => Some(arcade),
            Err(e) => {
                log::error!("Arcade loop ended abnormally: {e}");
                None
            }
        }
    }
}

impl Drop for ArcadeRunner {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    mut arcade: Arcade,
    mut commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<Snapshot>,
    events: broadcast::Sender<GameEvent>,
) -> Arcade {
    let mut gravity = time::interval(arcade.tuning().tick_period());
    gravity.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                None | Some(Command::Stop) => break,
                Some(Command::Start) => {
                    arcade.start();
                    gravity.reset();
                }
                Some(Command::Select(id)) => {
                    arcade.select(&id);
                }
                Some(Command::Pause) => arcade.pause(),
                Some(Command::Resume) => {
                    arcade.resume();
                    gravity.reset();
                }
                Some(Command::GameOver) => arcade.game_over(),
            },
            _ = gravity.tick(), if arcade.is_playing() => {
                arcade.tick();
            }
        }

        for event in arcade.drain_events() {
            // No subscribers is fine
            let _ = events.send(event);
        }
        snapshots.send_replace(arcade.snapshot());
    }

    log::info!("Arcade loop stopped at score {}", arcade.state().score);
    arcade
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, SCORES_TABLE, ScoreReporter, SignedIn};
    use crate::settings::GameMode;
    use crate::sim::{GamePhase, QuestionProvider, solve};
    use crate::tuning::Tuning;
    use std::sync::Arc;
    use std::time::Duration;

    fn arcade(mode: GameMode) -> Arcade {
        Arcade::new(QuestionProvider::new(mode), Tuning::default(), 99)
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocks_fall_and_game_ends() {
        let runner = ArcadeRunner::spawn(arcade(GameMode::Add));
        let mut snapshots = runner.subscribe();
        assert!(runner.start());

        let snap = snapshots
            .wait_for(|s| s.phase == GamePhase::Playing)
            .await
            .unwrap()
            .clone();
        assert_eq!(snap.blocks.len(), 5);

        let over = snapshots
            .wait_for(|s| s.phase == GamePhase::GameOver)
            .await
            .unwrap()
            .clone();
        assert!(over.time_ticks > 0);
        assert!(over.blocks.is_empty());
        assert!(over.selection.is_empty());

        // Terminal: more time passes, nothing changes
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runner.snapshot().time_ticks, over.time_ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_clears_wave_through_commands() {
        let runner = ArcadeRunner::spawn(arcade(GameMode::Divide));
        let mut events = runner.events();
        runner.start();
        let mut snapshots = runner.subscribe();
        snapshots.wait_for(|s| s.wave == 1).await.unwrap();

        // Build a plan from the published state and tap through it
        let view = runner.snapshot();
        let values: Vec<u32> = view.blocks.iter().map(|b| b.value).collect();
        let lanes = solve(view.operation, &values, view.target).unwrap();
        for lane in lanes {
            runner.select(view.blocks[lane].id.clone());
        }

        let snap = snapshots.wait_for(|s| s.wave == 2).await.unwrap().clone();
        assert!(snap.score > 0);

        let mut matched = false;
        while let Ok(event) = events.try_recv() {
            matched |= matches!(event, GameEvent::Matched { .. });
        }
        assert!(matched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_the_clock() {
        let runner = ArcadeRunner::spawn(arcade(GameMode::Add));
        let mut snapshots = runner.subscribe();
        runner.start();
        snapshots.wait_for(|s| s.time_ticks >= 3).await.unwrap();
        runner.pause();
        snapshots
            .wait_for(|s| s.phase == GamePhase::Paused)
            .await
            .unwrap();
        let paused_at = runner.snapshot().time_ticks;

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(runner.snapshot().time_ticks, paused_at);

        runner.resume();
        snapshots
            .wait_for(|s| s.time_ticks > paused_at)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_returns_arcade_and_rejects_commands() {
        let runner = ArcadeRunner::spawn(arcade(GameMode::Square));
        runner.start();
        let mut snapshots = runner.subscribe();
        snapshots.wait_for(|s| s.time_ticks >= 1).await.unwrap();

        let commands = runner.commands.clone();
        let arcade = runner.stop().await.expect("loop exits cleanly");
        let ticks = arcade.state().time_ticks;
        assert!(commands.send(Command::Start).is_err());

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(arcade.state().time_ticks, ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_runner_cancels_gravity() {
        let runner = ArcadeRunner::spawn(arcade(GameMode::Add));
        let mut snapshots = runner.subscribe();
        runner.start();
        snapshots.wait_for(|s| s.time_ticks >= 2).await.unwrap();
        let ticks = snapshots.borrow_and_update().time_ticks;
        assert_eq!(snapshots.borrow().phase, GamePhase::Playing);

        drop(runner);
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(snapshots.borrow().time_ticks, ticks);
        // The loop and its snapshot sender are gone
        assert!(snapshots.has_changed().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scored_run_is_persisted_in_background() {
        let store = Arc::new(MemoryStore::new());
        store.add_user("u1", 10);
        let arcade = arcade(GameMode::Multiply).with_reporting(
            Arc::new(SignedIn("u1".into())),
            ScoreReporter::new(store.clone()),
        );
        let runner = ArcadeRunner::spawn(arcade);
        let mut snapshots = runner.subscribe();
        runner.start();
        snapshots.wait_for(|s| s.wave == 1).await.unwrap();

        let view = runner.snapshot();
        let values: Vec<u32> = view.blocks.iter().map(|b| b.value).collect();
        let lanes = solve(view.operation, &values, view.target).unwrap();
        for lane in lanes {
            runner.select(view.blocks[lane].id.clone());
        }
        let score = snapshots.wait_for(|s| s.wave == 2).await.unwrap().score;
        assert!(score > 0);

        runner.send(Command::GameOver);
        snapshots
            .wait_for(|s| s.phase == GamePhase::GameOver)
            .await
            .unwrap();
        // Second request is a no-op
        runner.send(Command::GameOver);

        time::sleep(Duration::from_millis(10)).await;
        let rows = store.rows(SCORES_TABLE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["score"], score);
        assert_eq!(store.xp("u1"), Some(10 + score / 2));
    }
}
