//! Pick'em season analytics CLI
//!
//! Season statistics for an against-the-spread pick'em league and per-participant
//! pick models.

use clap::{Parser, Subcommand};
use pickem::{Config, Result};

#[derive(Parser)]
#[command(name = "pickem")]
#[command(about = "Pick'em league statistics and participant pick models", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Compute season statistics
    Stats {
        /// Write the full report to the configured report path
        #[arg(long)]
        save: bool,
        /// Print the full report as JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Train one pick model per participant
    Train {
        /// Override number of epochs
        #[arg(long)]
        epochs: Option<usize>,
        /// Override inverse regularization strength (C)
        #[arg(long)]
        c: Option<f64>,
    },
    /// Predict a participant's pick for a matchup
    Predict {
        /// Participant name
        participant: String,
        /// Home team id
        home: String,
        /// Away team id
        away: String,
        /// Spread, negative favors the home team
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        spread: f32,
        /// Week number
        #[arg(long, default_value = "1")]
        week: u32,
        /// Game is played indoors
        #[arg(long)]
        indoor: bool,
        /// Rain or snow expected
        #[arg(long)]
        rain_snow: bool,
        /// Wind speed in mph
        #[arg(long)]
        wind: Option<f32>,
        /// Temperature in Fahrenheit
        #[arg(long)]
        temp: Option<f32>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Generate random matchups and show predicted picks
    Scenario {
        /// Only show this participant
        #[arg(long)]
        participant: Option<String>,
        /// Number of matchups
        #[arg(long, default_value = "1")]
        count: usize,
        /// RNG seed for reproducible matchups
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Guess-the-pick game: make picks and see if the model called them
    Play {
        /// Participant name
        participant: String,
        /// RNG seed for reproducible matchups
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Show loaded record counts
    Status,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Stats { save, json } => commands::stats(&config, save, json),
        Commands::Train { epochs, c } => commands::train(config, epochs, c),
        Commands::Predict {
            participant,
            home,
            away,
            spread,
            week,
            indoor,
            rain_snow,
            wind,
            temp,
            format,
        } => {
            let conditions = commands::Conditions {
                spread,
                week,
                indoor,
                rain_snow,
                wind,
                temp,
            };
            commands::predict(&config, &participant, &home, &away, conditions, format)
        }
        Commands::Scenario {
            participant,
            count,
            seed,
        } => commands::scenario(&config, participant, count, seed),
        Commands::Play { participant, seed } => commands::play(&config, &participant, seed),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use log::warn;
    use pickem::data::RecordStore;
    use pickem::features::{ConferenceMap, Matchup};
    use pickem::model::ModelBundle;
    use pickem::predict::{
        describe_matchup, format_prediction, read_answer, PlayAnswer, Predictor, ScenarioGenerator,
        Scorecard,
    };
    use pickem::stats::{AffinityMatrix, SeasonReport};
    use pickem::training::ParticipantTrainer;
    use pickem::{ParticipantId, PickemError};
    use std::io::BufRead;

    /// Game conditions given on the command line
    pub struct Conditions {
        pub spread: f32,
        pub week: u32,
        pub indoor: bool,
        pub rain_snow: bool,
        pub wind: Option<f32>,
        pub temp: Option<f32>,
    }

    fn load_store(config: &Config) -> Result<RecordStore> {
        RecordStore::open(&config.data, &config.roster)
    }

    fn conference_map(store: &RecordStore, config: &Config) -> ConferenceMap {
        ConferenceMap::new(store.teams(), &config.roster.default_conference)
    }

    /// Predictor with PAA annotations when the season data is available
    fn load_predictor(config: &Config) -> Result<(Predictor, Option<RecordStore>)> {
        let bundle = ModelBundle::load(&config.data.model_path)?;
        let predictor = Predictor::new(bundle, &config.analysis);

        match load_store(config) {
            Ok(store) => {
                let affinity = AffinityMatrix::from_store(&store);
                Ok((predictor.with_affinity(affinity), Some(store)))
            }
            Err(e) => {
                warn!("Season data unavailable, explanations will omit PAA: {}", e);
                Ok((predictor, None))
            }
        }
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("model")?;
        println!("Created data/ and model/ directories");

        println!("\nNext steps:");
        println!("  1. Edit {} to set the roster", config_path);
        println!(
            "  2. Place {}, {} and {}",
            config.data.games_path, config.data.picks_path, config.data.teams_path
        );
        println!("  3. Run 'pickem stats' for season statistics");
        println!("  4. Run 'pickem train' to fit participant models");
        println!("  5. Run 'pickem predict <PARTICIPANT> <HOME> <AWAY>' to predict a pick");

        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let store = load_store(config)?;
        let stats = store.stats();

        println!("Data Status");
        println!("───────────────────────────────");
        println!("  Games:        {}", config.data.games_path);
        println!("  Picks:        {}", config.data.picks_path);
        println!("  Teams:        {}", config.data.teams_path);
        println!();
        println!("  Games:        {}", stats.game_count);
        println!("  Picks:        {}", stats.pick_count);
        println!("  Orphan picks: {}", stats.orphan_picks);
        println!("  Participants: {}", stats.participant_count);
        println!(
            "  Teams:        {} ({} current)",
            stats.team_count, stats.current_team_count
        );
        if let (Some(first), Some(last)) = (stats.first_week, stats.last_week) {
            println!("  Weeks:        {} to {}", first, last);
        }

        Ok(())
    }

    pub fn stats(config: &Config, save: bool, json: bool) -> Result<()> {
        let store = load_store(config)?;
        let report = SeasonReport::compute(&store, config);

        if save {
            report.save(&config.data.report_path)?;
        }
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        let top = config.analysis.top_n;

        println!("Leaderboard");
        println!("───────────────────────────────");
        for row in &report.leaderboard {
            println!("  {:>2}. {:<18} {:>4}", row.rank, row.participant, row.total_correct);
        }

        println!("\nBest ATS teams");
        println!("───────────────────────────────");
        for row in report.ats.iter().take(top) {
            println!(
                "  {:<4} {:>2}-{:>2}-{:<2} {:>5.1}%",
                row.team,
                row.ats_wins,
                row.ats_losses,
                row.ats_pushes,
                row.ats_pct * 100.0
            );
        }

        println!("\nFavorite cover rate by spread");
        println!("───────────────────────────────");
        for row in &report.spread_buckets {
            println!(
                "  {:<7} {:>5.1}%  ({} games)",
                row.label,
                row.fav_cover_rate * 100.0,
                row.games
            );
        }

        println!("\nBiggest fans (PAA)");
        println!("───────────────────────────────");
        for cell in &report.biggest_fans {
            println!("  {:<18} {:<4} {:+.1}", cell.participant, cell.team, cell.paa);
        }

        println!("\nBiggest haters (PAA)");
        println!("───────────────────────────────");
        for cell in &report.biggest_haters {
            println!("  {:<18} {:<4} {:+.1}", cell.participant, cell.team, cell.paa);
        }

        println!("\nHerd followers");
        println!("───────────────────────────────");
        for row in report.herd_rates.iter().take(top) {
            println!("  {:<18} {:>5.1}%", row.participant, row.herd_rate * 100.0);
        }

        println!("\nContrarians");
        println!("───────────────────────────────");
        for row in report.contrarians.iter().take(top) {
            let win_rate = row
                .contrarian_win_rate
                .map(|r| format!("{:.1}%", r * 100.0))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<18} {:>5.1}% against the herd, won {}",
                row.participant,
                row.contrarian_rate * 100.0,
                win_rate
            );
        }

        if let Some(summary) = &report.high_consensus {
            println!(
                "\nWhen over {:.0}% agreed, the majority was right {}/{} times ({:.1}%)",
                summary.threshold * 100.0,
                summary.majority_correct,
                summary.games,
                summary.accuracy * 100.0
            );
        }

        println!("\nStreaks ({} weeks)", config.analysis.streak_window);
        println!("───────────────────────────────");
        for row in &report.streaks {
            println!(
                "  {:<18} best W{}-W{} ({})  worst W{}-W{} ({})",
                row.participant,
                row.best.start_week,
                row.best.end_week,
                row.best.total_correct,
                row.worst.start_week,
                row.worst.end_week,
                row.worst.total_correct
            );
        }

        Ok(())
    }

    pub fn train(mut config: Config, epochs: Option<usize>, c: Option<f64>) -> Result<()> {
        if let Some(epochs) = epochs {
            config.training.epochs = epochs;
        }
        if let Some(c) = c {
            config.training.inverse_regularization = c;
        }

        let store = load_store(&config)?;
        let stats = store.stats();
        if stats.pick_count == 0 {
            return Err(PickemError::Config(format!(
                "No picks found in {}",
                config.data.picks_path
            )));
        }
        println!(
            "Loaded {} games and {} picks",
            stats.game_count, stats.pick_count
        );

        let trainer = ParticipantTrainer::new(&store, &config)?;
        println!(
            "Training with C={}, {} epochs, {} features...\n",
            config.training.inverse_regularization,
            config.training.epochs,
            trainer.schema().len()
        );
        let run = trainer.train(&store)?;

        for summary in &run.summaries {
            println!(
                "  {:<18} {:>3} picks  home {:>5.1}%  fit acc {:>5.1}%  log-loss {:.3}",
                summary.participant,
                summary.examples,
                summary.home_rate * 100.0,
                summary.metrics.accuracy() * 100.0,
                summary.metrics.log_loss()
            );
        }
        for (participant, picks) in &run.bundle.excluded {
            println!(
                "  {:<18} skipped: insufficient data ({} of {} picks)",
                participant, picks, config.training.min_picks
            );
        }

        run.bundle.save(&config.data.model_path)?;
        println!("\nSaved models to {}", config.data.model_path);

        Ok(())
    }

    pub fn predict(
        config: &Config,
        participant: &str,
        home: &str,
        away: &str,
        conditions: Conditions,
        format: OutputFormat,
    ) -> Result<()> {
        let (predictor, store) = load_predictor(config)?;
        let participant = ParticipantId::from(participant);

        let mut matchup = Matchup::new(
            config.roster.canonical_team(home),
            config.roster.canonical_team(away),
            conditions.spread,
            conditions.week,
            &config.analysis,
        );
        matchup.indoor = conditions.indoor;
        matchup.rain_snow = conditions.rain_snow;
        if let Some(wind) = conditions.wind {
            matchup.wind_mph = wind;
        }
        if let Some(temp) = conditions.temp {
            matchup.temperature = temp;
        }
        if let Some(store) = &store {
            let conferences = conference_map(store, config);
            conferences.warn_unknown([&matchup.home, &matchup.away]);
            matchup.cross_conference = conferences.is_cross_conference(&matchup.home, &matchup.away);
        }

        let prediction = predictor.predict(&participant, &matchup)?;
        let factors = predictor.explain(&participant, &matchup)?;

        match format {
            OutputFormat::Table => {
                println!("{}", describe_matchup(&matchup));
                print!("{}", format_prediction(&prediction, &factors));
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "participant": prediction.participant,
                    "home": prediction.home,
                    "away": prediction.away,
                    "prob_home": prediction.prob_home,
                    "prob_away": prediction.prob_away(),
                    "predicted_pick": prediction.predicted_pick(),
                    "confidence": prediction.confidence(),
                    "factors": factors,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Csv => {
                println!("participant,home,away,prob_home,predicted_pick,confidence");
                println!(
                    "{},{},{},{:.3},{},{:.3}",
                    prediction.participant,
                    prediction.home,
                    prediction.away,
                    prediction.prob_home,
                    prediction.predicted_pick(),
                    prediction.confidence()
                );
            }
        }

        Ok(())
    }

    fn generator(config: &Config, store: Option<&RecordStore>, seed: Option<u64>) -> Result<ScenarioGenerator> {
        let conferences = match store {
            Some(store) => conference_map(store, config),
            None => ConferenceMap::new(std::iter::empty(), &config.roster.default_conference),
        };
        ScenarioGenerator::new(config.roster.teams.clone(), conferences, &config.analysis, seed)
    }

    pub fn scenario(
        config: &Config,
        participant: Option<String>,
        count: usize,
        seed: Option<u64>,
    ) -> Result<()> {
        let (predictor, store) = load_predictor(config)?;
        let mut scenarios = generator(config, store.as_ref(), seed)?;

        for _ in 0..count {
            let matchup = scenarios.next_matchup();
            println!("{}", describe_matchup(&matchup));

            match &participant {
                Some(name) => {
                    let participant = ParticipantId::from(name.as_str());
                    let prediction = predictor.predict(&participant, &matchup)?;
                    let factors = predictor.explain(&participant, &matchup)?;
                    print!("{}", format_prediction(&prediction, &factors));
                }
                None => {
                    for prediction in predictor.predict_all(&matchup) {
                        println!("  {}", prediction);
                    }
                }
            }
            println!();
        }

        Ok(())
    }

    pub fn play(config: &Config, participant: &str, seed: Option<u64>) -> Result<()> {
        let (predictor, store) = load_predictor(config)?;
        let participant = ParticipantId::from(participant);
        let mut scenarios = generator(config, store.as_ref(), seed)?;
        let mut scorecard = Scorecard::new();
        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();

        println!("Pick the side you would take; the model guesses first. (h)ome, (a)way, (q)uit\n");
        loop {
            let matchup = scenarios.next_matchup();
            let prediction = predictor.predict(&participant, &matchup)?;

            println!("{}", describe_matchup(&matchup));
            println!("  Model confidence: {:.0}%", prediction.confidence() * 100.0);
            let actual = match read_answer(&mut lines, &mut std::io::stdout(), &matchup)? {
                Some(PlayAnswer::Pick(team)) => team,
                Some(PlayAnswer::Quit) | None => break,
            };

            let hit = scorecard.record(prediction.predicted_pick(), &actual);
            println!(
                "  Model picked {}: {}",
                prediction.predicted_pick(),
                if hit { "called it" } else { "missed" }
            );
            for factor in predictor.explain(&participant, &matchup)? {
                println!("    {}", factor);
            }
            println!("  {}\n", scorecard);
        }

        println!("Final {}", scorecard);
        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let bundle = ModelBundle::load(&config.data.model_path)?;

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:           {}", config.data.model_path);
        println!("  Trained:        {}", bundle.trained_at.format("%Y-%m-%d %H:%M UTC"));
        println!("  Features:       {}", bundle.schema.len());
        println!("  C:              {}", bundle.inverse_regularization);
        println!("  Min picks:      {}", bundle.min_picks);
        println!("  Models:         {}", bundle.models.len());
        for participant in bundle.participants() {
            println!("    {}", participant);
        }
        if !bundle.excluded.is_empty() {
            println!("  Skipped:");
            for (participant, picks) in &bundle.excluded {
                println!("    {} ({} picks)", participant, picks);
            }
        }

        Ok(())
    }
}
