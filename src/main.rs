//! Chess Arena - evaluates the MCTS-driven model against a UCI engine
//!
//! Plays either one match at a fixed skill level or a sweep over several
//! levels, then writes PGN files, a CSV of all games and the summary reports.

use clap::Parser;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use chess_arena::arena::{run_match, run_skill_sweep, ColorAssignment, MatchSummary, ModelPlayer};
use chess_arena::config::{EvaluationConfig, OracleKind};
use chess_arena::engine::{ReferenceEngine, UciEngine};
use chess_arena::logging::setup_logging;
use chess_arena::neural::{MoveVocabulary, PolicyValueOracle, UniformOracle};
use chess_arena::recording::{
    write_games_csv, write_json_summary, write_pgns, write_text_report, EvaluationReport, GameRecord, PgnDirectory,
};

#[derive(Parser, Debug)]
#[command(
    name = "chess_arena",
    version,
    about = "Evaluate an MCTS chess model against a UCI engine such as Stockfish"
)]
struct Args {
    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the engine executable
    #[arg(long)]
    stockfish: Option<PathBuf>,

    /// Model weights (.safetensors or .ot)
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Model hyperparameters (JSON)
    #[arg(long)]
    model_config: Option<PathBuf>,

    /// Move vocabulary, one UCI move per line
    #[arg(long)]
    vocabulary: Option<PathBuf>,

    /// transformer or uniform
    #[arg(long)]
    oracle: Option<OracleKind>,

    /// cpu or cuda
    #[arg(long)]
    device: Option<String>,

    /// Play a single match at this skill level instead of the sweep
    #[arg(long)]
    skill: Option<u8>,

    /// Rounds of the single match, or rounds per colour and level in a sweep
    #[arg(long)]
    rounds: Option<u32>,

    /// white, black or both (single match only)
    #[arg(long)]
    model_color: Option<ColorAssignment>,

    /// MCTS simulations per model move
    #[arg(long)]
    simulations: Option<u32>,

    /// Move selection temperature, 0 = most visited
    #[arg(long)]
    temperature: Option<f64>,

    /// Plies before a game is adjudicated a draw
    #[arg(long)]
    max_plies: Option<u32>,

    /// Engine time per move in milliseconds
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Engine search depth per move
    #[arg(long)]
    depth_limit: Option<u32>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write rotating log files into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let _logger = setup_logging(&args.log_level, args.log_dir.as_deref())?;

    let config = build_config(&args)?;
    config.validate()?;

    let engine_path = config
        .engine
        .path
        .clone()
        .ok_or("no engine executable given, use --stockfish or engine.path")?;

    log::info!("♟️  Chess Arena {}", chess_arena::VERSION);
    log::info!("Oracle: {}", config.oracle);
    log::info!("Engine: {}", engine_path.display());
    log::info!("MCTS: {}", config.mcts.to_config_string());
    log::info!(
        "Simulations: {}, temperature: {}, max plies: {}",
        config.match_config.simulations,
        config.match_config.temperature,
        config.match_config.max_plies
    );

    let oracle = load_oracle(&config)?;
    log::info!("Warming up the oracle...");
    oracle.warm_up()?;

    let model_name = match &config.checkpoint {
        Some(path) if config.oracle == OracleKind::Transformer => path.display().to_string(),
        _ => "Uniform MCTS".to_string(),
    };
    let mut model = ModelPlayer::new(&*oracle, config.mcts.clone(), config.seed).with_name(model_name.clone());
    let mut engine = UciEngine::spawn(&engine_path, Some(config.engine.skill_level))?;

    fs::create_dir_all(&config.output_dir)?;
    let summaries = match args.skill {
        Some(_) => {
            let mut sink = PgnDirectory::new(&config.output_dir);
            let summary = run_match(&mut model, &mut engine, &config.match_config, &config.engine, &mut sink)?;
            vec![summary]
        }
        None => {
            let mut sink = PgnDirectory::new(&config.output_dir).split_by_skill(true);
            let sweep_config = chess_arena::config::MatchConfig {
                rounds: config.sweep_rounds,
                ..config.match_config.clone()
            };
            run_skill_sweep(
                &mut model,
                &mut engine,
                &sweep_config,
                &config.engine,
                &config.skill_levels,
                &mut sink,
            )?
        }
    };

    write_outputs(&config.output_dir, &model_name, &engine.name(), &summaries)?;
    print_summary(&summaries);
    Ok(())
}

/// Defaults, then the config file, then command-line flags.
fn build_config(args: &Args) -> Result<EvaluationConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => EvaluationConfig::load(path)?,
        None => EvaluationConfig::default(),
    };

    if let Some(path) = &args.stockfish {
        config.engine.path = Some(path.clone());
    }
    if args.checkpoint.is_some() {
        config.checkpoint = args.checkpoint.clone();
    }
    if args.model_config.is_some() {
        config.model_config = args.model_config.clone();
    }
    if args.vocabulary.is_some() {
        config.vocabulary = args.vocabulary.clone();
    }
    if let Some(oracle) = args.oracle {
        config.oracle = oracle;
    }
    if let Some(device) = &args.device {
        config.device = device.clone();
    }
    if let Some(level) = args.skill {
        config.engine.skill_level = level;
    }
    if let Some(rounds) = args.rounds {
        config.match_config.rounds = rounds;
        config.sweep_rounds = rounds;
    }
    if let Some(color) = args.model_color {
        config.match_config.model_color = color;
    }
    if let Some(simulations) = args.simulations {
        config.match_config.simulations = simulations;
    }
    if let Some(temperature) = args.temperature {
        config.match_config.temperature = temperature;
    }
    if let Some(max_plies) = args.max_plies {
        config.match_config.max_plies = max_plies;
    }
    if args.time_limit_ms.is_some() {
        config.engine.time_limit_ms = args.time_limit_ms;
    }
    if args.depth_limit.is_some() {
        config.engine.depth_limit = args.depth_limit;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn load_vocabulary(config: &EvaluationConfig) -> Result<MoveVocabulary, Box<dyn Error>> {
    match &config.vocabulary {
        Some(path) => {
            let vocabulary = MoveVocabulary::load(path)?;
            log::info!("Loaded {} vocabulary moves from {}", vocabulary.len(), path.display());
            Ok(vocabulary)
        }
        None => Ok(MoveVocabulary::standard()),
    }
}

#[cfg(feature = "torch")]
fn load_oracle(config: &EvaluationConfig) -> Result<Box<dyn PolicyValueOracle>, Box<dyn Error>> {
    use chess_arena::neural::{ModelConfig, TransformerOracle};

    let vocabulary = load_vocabulary(config)?;
    match config.oracle {
        OracleKind::Uniform => Ok(Box::new(UniformOracle::with_vocabulary(vocabulary, 0.5))),
        OracleKind::Transformer => {
            let (Some(checkpoint), Some(model_config)) = (&config.checkpoint, &config.model_config) else {
                return Err("the transformer oracle needs --checkpoint and --model-config".into());
            };
            let device = match config.device.as_str() {
                "cuda" => tch::Device::cuda_if_available(),
                _ => tch::Device::Cpu,
            };
            let model_config = ModelConfig::load(model_config)?;
            Ok(Box::new(TransformerOracle::load(model_config, checkpoint, vocabulary, device)?))
        }
    }
}

#[cfg(not(feature = "torch"))]
fn load_oracle(config: &EvaluationConfig) -> Result<Box<dyn PolicyValueOracle>, Box<dyn Error>> {
    let vocabulary = load_vocabulary(config)?;
    match config.oracle {
        OracleKind::Uniform => Ok(Box::new(UniformOracle::with_vocabulary(vocabulary, 0.5))),
        OracleKind::Transformer => {
            Err("this build has no transformer support, rebuild with --features torch or use --oracle uniform".into())
        }
    }
}

fn write_outputs(
    output_dir: &Path,
    model_name: &str,
    engine_name: &str,
    summaries: &[MatchSummary],
) -> Result<(), Box<dyn Error>> {
    for summary in summaries {
        let path = output_dir.join(format!("skill_{}_games.pgn", summary.skill_level));
        write_pgns(path, &summary.records)?;
    }

    let records: Vec<GameRecord> = summaries.iter().flat_map(|s| s.records.iter().cloned()).collect();
    write_games_csv(output_dir.join("games.csv"), &records)?;

    let report = EvaluationReport::new(model_name, engine_name, summaries);
    write_json_summary(output_dir.join("summary.json"), &report)?;
    write_text_report(output_dir.join("evaluation_summary.txt"), &report)?;
    Ok(())
}

fn print_summary(summaries: &[MatchSummary]) {
    println!("\n{}", "=".repeat(60));
    println!("📊 EVALUATION RESULTS");
    println!("{}", "=".repeat(60));
    println!(
        "{:>6} {:>6} {:>6} {:>6} {:>6} {:>9} {:>9} {:>9}",
        "Skill", "Games", "Wins", "Losses", "Draws", "Win %", "White", "Black"
    );
    for s in summaries {
        println!(
            "{:>6} {:>6} {:>6} {:>6} {:>6} {:>8.2}% {:>9} {:>9}",
            s.skill_level,
            s.total.games(),
            s.total.wins,
            s.total.losses,
            s.total.draws,
            s.win_rate(),
            s.as_white.to_string(),
            s.as_black.to_string()
        );
        if s.failed_rounds > 0 {
            println!("       ({} failed rounds)", s.failed_rounds);
        }
    }
    println!("{}", "=".repeat(60));
}
