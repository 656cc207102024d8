//! Kuhn Poker self-play trainer.
//!
//! Usage:
//!   cargo run --release --bin train_selfplay -- [OPTIONS]
//!
//! Writes learning curves, value functions and a final checkpoint into the
//! output directory. Set `RUST_LOG=debug` for per-interval progress lines.

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};

use kuhn_selfplay::games::kuhn::Terminal;
use kuhn_selfplay::training::{Trainer, TrainingConfig};
use kuhn_selfplay::SelfPlayResult;

#[derive(Parser, Debug)]
#[command(name = "train_selfplay", about = "Train two Kuhn Poker agents by self-play.")]
struct Args {
    /// Configuration JSON file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resume from a checkpoint instead of starting fresh
    #[arg(long, conflicts_with = "config")]
    resume: Option<PathBuf>,

    /// Hands to play
    #[arg(short = 'n', long)]
    hands: Option<u64>,

    /// Exploration rate for both players
    #[arg(short, long)]
    epsilon: Option<f64>,

    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Hands between learning-curve points
    #[arg(long)]
    log_interval: Option<u64>,

    /// Alternate learning between the players every N hands
    #[arg(long, value_name = "N")]
    interleave: Option<u64>,

    /// Save a checkpoint every N hands
    #[arg(long, value_name = "N")]
    checkpoint_every: Option<u64>,

    /// Hands of frozen-policy evaluation after training (0 to skip)
    #[arg(long, default_value_t = 100_000)]
    eval_hands: u64,

    /// Output directory
    #[arg(short, long, default_value = "selfplay_out")]
    output: PathBuf,
}

fn build_config(args: &Args) -> SelfPlayResult<TrainingConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("{:<32}{}", "loading config", path.display());
            TrainingConfig::from_json_file(path)?
        }
        None => TrainingConfig::default(),
    };
    if let Some(hands) = args.hands {
        config.hands = hands;
    }
    if let Some(epsilon) = args.epsilon {
        config = config.with_epsilon(epsilon);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(interval) = args.log_interval {
        config = config.with_log_interval(interval);
    }
    if let Some(interval) = args.interleave {
        config = config.with_interleave(interval);
    }
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> SelfPlayResult<()> {
    let (mut trainer, hands) = match &args.resume {
        Some(path) => {
            let trainer = Trainer::load_checkpoint(path)?;
            // On resume, --hands means "this many more"
            let hands = args
                .hands
                .unwrap_or_else(|| trainer.config().hands.saturating_sub(trainer.hands_played()));
            (trainer, hands)
        }
        None => {
            let trainer = Trainer::new(build_config(&args)?)?;
            let hands = trainer.config().hands;
            (trainer, hands)
        }
    };

    train(&mut trainer, hands, &args)?;
    finish(&trainer, &args)
}

fn train(trainer: &mut Trainer, hands: u64, args: &Args) -> SelfPlayResult<()> {
    std::fs::create_dir_all(&args.output)?;
    let checkpoint_path = args.output.join("checkpoint.json");

    let bar = ProgressBar::new(hands);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} hands ({per_sec}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let start = Instant::now();
    let first_hand = trainer.hands_played();
    let chunk = args.checkpoint_every.unwrap_or(hands).max(1);
    let tick = (hands / 1_000).max(1);
    let mut remaining = hands;

    while remaining > 0 {
        let step = remaining.min(chunk);
        trainer.train_with_callback(step, tick, |stats| {
            bar.set_position(stats.hands - first_hand);
            bar.set_message(format!("P1 {:+.4}", stats.mean_payoff1()));
        })?;
        remaining -= step;
        bar.set_position(hands - remaining);

        if args.checkpoint_every.is_some() {
            trainer.save_checkpoint(&checkpoint_path)?;
        }
    }

    bar.finish_with_message("done");
    info!("{:<32}{:.2}s", "training time", start.elapsed().as_secs_f64());
    Ok(())
}

fn finish(trainer: &Trainer, args: &Args) -> SelfPlayResult<()> {
    trainer.save_telemetry(&args.output)?;
    trainer.save_checkpoint(args.output.join("checkpoint.json"))?;
    trainer.print_summary();

    if args.eval_hands > 0 {
        let seed = trainer.config().seed.unwrap_or(0);
        let report = trainer.evaluate_parallel(args.eval_hands, seed);
        println!();
        println!("  Evaluation ({} hands, policies frozen)", report.hands);
        println!("    P1 mean payoff:   {:+.4}", report.mean_payoff1());
        println!("    Check showdown:   {:.1}%", report.frequency(Terminal::CheckShowdown) * 100.0);
        println!("    Fold:             {:.1}%", report.frequency(Terminal::Fold) * 100.0);
        println!("    Call showdown:    {:.1}%", report.frequency(Terminal::CallShowdown) * 100.0);
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        process::exit(1);
    }
}
