//! Headless driver: runs the engine against a file store, auto-resolving
//! events, and logs a summary.
//!
//! ```text
//! idle-sim [--seconds N] [--clicks-per-sec N] [--save-dir DIR] [--config FILE] [--reset] [--realtime]
//! ```
//!
//! Without `--realtime` time is simulated: the run finishes immediately and
//! the save is stamped as if `--seconds` had really passed.

#[cfg(not(target_arch = "wasm32"))]
mod driver {
    use std::path::PathBuf;
    use std::thread;
    use std::time::Duration;

    use anyhow::{Context, Result};
    use idle_sim::format::{format_compact, format_duration, format_number};
    use idle_sim::{
        subsystem, Clock, Engine, EngineConfig, EventKind, EventOutcome, FileStore, FrameTimer,
        LoadOutcome, ManualClock, Millis, SystemClock,
    };
    use tracing::{info, warn};
    use tracing_subscriber::EnvFilter;

    struct Args {
        seconds: u64,
        clicks_per_sec: f64,
        save_dir: PathBuf,
        config: Option<PathBuf>,
        reset: bool,
        realtime: bool,
    }

    fn parse_args() -> Args {
        let mut args = Args {
            seconds: 60,
            clicks_per_sec: 5.0,
            save_dir: PathBuf::from(".idle-sim"),
            config: None,
            reset: false,
            realtime: false,
        };
        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--seconds" => {
                    if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                        args.seconds = v;
                    }
                }
                "--clicks-per-sec" => {
                    if let Some(v) = it.next().and_then(|s| s.parse::<f64>().ok()) {
                        args.clicks_per_sec = v.max(0.0);
                    }
                }
                "--save-dir" => {
                    if let Some(v) = it.next() {
                        args.save_dir = PathBuf::from(v);
                    }
                }
                "--config" => args.config = it.next().map(PathBuf::from),
                "--reset" => args.reset = true,
                "--realtime" => args.realtime = true,
                other => warn!(arg = other, "ignoring unknown argument"),
            }
        }
        args
    }

    /// Real time, or a manual clock advanced by the loop itself.
    #[derive(Clone)]
    enum DriverClock {
        Real,
        Simulated(ManualClock),
    }

    impl DriverClock {
        fn wait(&self, ms: Millis) {
            match self {
                DriverClock::Real => thread::sleep(Duration::from_millis(ms)),
                DriverClock::Simulated(clock) => clock.advance(ms),
            }
        }
    }

    impl Clock for DriverClock {
        fn now_ms(&self) -> Millis {
            match self {
                DriverClock::Real => SystemClock.now_ms(),
                DriverClock::Simulated(clock) => clock.now_ms(),
            }
        }
    }

    fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
        let Some(path) = path else {
            return Ok(EngineConfig::default());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        EngineConfig::from_json(&json).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn run() -> Result<()> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(filter).init();

        let args = parse_args();
        info!(
            seconds = args.seconds,
            clicks_per_sec = args.clicks_per_sec,
            save_dir = %args.save_dir.display(),
            realtime = args.realtime,
            "starting headless run"
        );

        let config = load_config(args.config.as_ref())?;
        let store = FileStore::open(&args.save_dir)
            .with_context(|| format!("opening save dir {}", args.save_dir.display()))?;
        let clock = if args.realtime {
            DriverClock::Real
        } else {
            DriverClock::Simulated(ManualClock::new(SystemClock.now_ms()))
        };

        let mut engine = Engine::builder()
            .config(config)
            .clock(clock.clone())
            .store(store)
            .build()?;

        if args.reset {
            engine.reset().context("resetting save")?;
        }
        match engine.load() {
            LoadOutcome::Loaded(report) if report.gain > 0.0 => info!(
                away = %format_duration(report.elapsed_ms),
                gain = %format_number(report.gain),
                "welcome back"
            ),
            LoadOutcome::Corrupt(e) => warn!(error = %e, "save was unreadable, started fresh"),
            _ => {}
        }
        engine.start();

        let base = engine.config().base_resolution_ms;
        let end = clock.now_ms() + args.seconds * 1000;
        let mut timer = FrameTimer::new();
        timer.update(clock.now_ms() as f64);
        let mut click_debt = 0.0;
        let mut events_resolved = 0u64;

        while clock.now_ms() < end {
            clock.wait(base);
            let delta = timer.update(clock.now_ms() as f64);

            click_debt += args.clicks_per_sec * delta as f64 / 1000.0;
            while click_debt >= 1.0 {
                engine.handle_click();
                click_debt -= 1.0;
            }
            engine.tick(delta);

            while let Some(kind) = engine.active_event().map(|e| e.kind) {
                let outcome = match kind {
                    EventKind::Tutorial => EventOutcome::Dismissed,
                    _ => EventOutcome::Success,
                };
                engine.on_event_complete(outcome);
                events_resolved += 1;
            }
            buy_cheapest(&mut engine);
        }

        engine.on_visibility_change(false);

        let p = engine.production();
        info!(
            score = %format_compact(engine.score()),
            total = %format_compact(engine.total_score()),
            per_second = %format_number(p.per_second),
            click_power = %format_number(p.click_power),
            clicks = engine.total_clicks(),
            milestones = engine.triggered_milestones().len(),
            events_resolved,
            autosaves = engine.subsystem_fired(subsystem::AUTOSAVE),
            "run finished"
        );
        Ok(())
    }

    /// Spend on whatever unlocked upgrade is cheapest right now.
    fn buy_cheapest(engine: &mut Engine) {
        let cheapest = engine
            .catalog()
            .upgrades
            .iter()
            .filter_map(|u| engine.catalog().upgrade_price(&u.id).ok().map(|c| (c, u.id.clone())))
            .min_by(|a, b| a.0.total_cmp(&b.0));
        if let Some((cost, id)) = cheapest {
            if cost <= engine.score() && engine.purchase_upgrade(&id).is_ok() {
                info!(upgrade = %id, cost = %format_number(cost), "bought");
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    driver::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
