//! Speed Calc entry point
//!
//! Native: a headless demo run. The autopilot clears a handful of waves with a
//! human-ish reaction delay, then lets the blocks fall. The web build is driven
//! from JavaScript through `speed_calc::web::WebArcade`.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use speed_calc::arcade::Arcade;
    use speed_calc::generate::{GenerateRequest, LocalGenerator, fetch_questions};
    use speed_calc::persistence::{
        Anonymous, AuthProvider, MemoryStore, SCORES_TABLE, ScoreReporter, SignedIn,
    };
    use speed_calc::runner::ArcadeRunner;
    use speed_calc::sim::{GamePhase, QuestionProvider};
    use speed_calc::{HighScores, Settings, platform};

    /// Waves the autopilot clears before it stops playing
    const DEMO_WAVES: u32 = 8;
    /// Questions requested up front; the provider generates more when they run out
    const DEMO_BANK: usize = 12;
    /// Delay before each tap
    const REACTION: Duration = Duration::from_millis(250);

    fn settings_path() -> PathBuf {
        std::env::var_os("SPEED_CALC_SETTINGS")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("speed-calc.json"))
    }

    pub async fn run() {
        platform::init_logging();
        log::info!("Speed Calc (native demo) starting...");

        let settings = Settings::load_or_default(&settings_path());
        let seed = platform::now_ms() as u64;

        let store = Arc::new(MemoryStore::new());
        let auth: Arc<dyn AuthProvider> = match &settings.user_id {
            Some(id) => {
                store.add_user(id, 0);
                Arc::new(SignedIn(id.clone()))
            }
            None => Arc::new(Anonymous),
        };

        let request = GenerateRequest {
            topic: settings.mode.as_str().to_string(),
            count: DEMO_BANK,
        };
        let generator = LocalGenerator::new(seed);
        let bank = fetch_questions(&generator, "quant", settings.mode, &request).await;
        log::info!(
            "Question bank: {} records ({:?})",
            bank.records.len(),
            bank.source
        );
        let provider = QuestionProvider::with_bank(settings.mode, bank.records);
        let arcade = Arcade::new(provider, settings.tuning.clone(), seed)
            .with_reporting(auth, ScoreReporter::new(store.clone()));

        let runner = ArcadeRunner::spawn(arcade);
        let mut snapshots = runner.subscribe();
        runner.start();
        if snapshots
            .wait_for(|s| s.phase == GamePhase::Playing)
            .await
            .is_err()
        {
            return;
        }

        // Autopilot: plan from the published snapshot, tap through the runner
        let mut cleared = 0;
        while cleared < DEMO_WAVES {
            let Ok(snap) = snapshots
                .wait_for(|s| s.phase != GamePhase::Playing || s.wave > cleared)
                .await
                .map(|s| s.clone())
            else {
                break;
            };
            if snap.phase != GamePhase::Playing {
                break;
            }
            let Some(taps) = snap.autopilot_taps() else {
                break;
            };
            for id in taps {
                tokio::time::sleep(REACTION).await;
                runner.select(id);
            }
            cleared = snap.wave;
        }

        log::info!("Autopilot stopped after {cleared} waves");
        let _ = snapshots
            .wait_for(|s| s.phase == GamePhase::GameOver)
            .await;

        let Some(arcade) = runner.stop().await else {
            return;
        };
        let state = arcade.state();
        println!(
            "Game over: score {} after {} waves ({} mode)",
            state.score,
            state.wave_index,
            arcade.mode().as_str()
        );

        let scores_path = PathBuf::from("speed-calc-scores.json");
        let mut high_scores = HighScores::load_from(&scores_path);
        let mode = arcade.mode();
        if let Some(rank) =
            high_scores.add_score(state.score, state.wave_index, mode, platform::now_ms())
        {
            println!("New local high score: #{rank}");
            if let Err(e) = high_scores.save_to(&scores_path) {
                log::warn!("Could not save high scores: {e}");
            }
        }

        if let Some(report) = arcade.last_report() {
            // Let the detached writes land before the process exits
            tokio::time::sleep(Duration::from_millis(50)).await;
            println!(
                "Reported {} (wave {}), {} score rows, {} now has {:?} xp",
                report.score,
                report.wave_reached,
                store.rows(SCORES_TABLE).len(),
                report.user_id,
                store.xp(&report.user_id)
            );
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() {
    demo::run().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is speed_calc::web::WebArcade, this is just to satisfy the compiler
}
