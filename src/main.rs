use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use scrivener::{
    evaluate_transcript, parse_recognizer_file, run_pipeline, stages, BlockMergeConfig,
    ChunkConfig, ConfidenceAggregation, CorrectionConfig, Evaluation, EvaluationConfig,
    FilterConfig, HumanTranscript, IngestConfig, MachineTranscript, OracleClient, OracleConfig,
    PipelineConfig, PipelineOutput, PreMergeConfig, RunMergeConfig, SmoothConfig,
};

#[derive(Parser)]
#[command(name = "scrivener")]
#[command(author, version, about = "Transcript correction pipeline with confidence-gated LLM batching", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correct a recognized transcript and emit machine/human output
    Process {
        /// Input recognizer output file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for machine-readable transcript (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Output file for human-readable transcript (text)
        #[arg(long)]
        human_readable: Option<PathBuf>,

        /// Confidence below which a unit is sent for correction
        #[arg(long, default_value = "0.9")]
        confidence_threshold: f64,

        /// Trusted-unit gap absorbed when merging correction runs
        #[arg(long, default_value = "3")]
        run_merge_gap: usize,

        /// Character budget per oracle chunk
        #[arg(long, default_value = "600")]
        chunk_budget: usize,

        /// Maximum concurrent oracle requests
        #[arg(long, default_value = "4")]
        concurrency: usize,

        /// Maximum gap in ms for same-speaker pre-merge
        #[arg(long, default_value = "500")]
        pre_merge_gap_ms: u64,

        /// Maximum gap in ms for display block grouping
        #[arg(long, default_value = "5000")]
        block_gap_ms: u64,

        /// Maximum duration in ms for speaker-flip smoothing
        #[arg(long, default_value = "1500")]
        smooth_max_ms: u64,

        /// Token confidence reduction: mean, min, or geometric-mean
        #[arg(long, default_value = "mean")]
        aggregation: String,

        /// Skip oracle correction (pass everything through)
        #[arg(long)]
        skip_correction: bool,

        /// Run content evaluation on the corrected transcript
        #[arg(long)]
        evaluate: bool,

        /// Output file for the evaluation (JSON); defaults next to --output
        #[arg(long)]
        evaluation_output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze a recognized transcript without correcting it
    Analyze {
        /// Input recognizer output file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Confidence below which a unit would be sent for correction
        #[arg(long, default_value = "0.9")]
        confidence_threshold: f64,

        /// Trusted-unit gap absorbed when merging correction runs
        #[arg(long, default_value = "3")]
        run_merge_gap: usize,

        /// Character budget per oracle chunk
        #[arg(long, default_value = "600")]
        chunk_budget: usize,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Evaluate a processed machine transcript
    Evaluate {
        /// Machine transcript file produced by `process` (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the evaluation (JSON); defaults to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            human_readable,
            confidence_threshold,
            run_merge_gap,
            chunk_budget,
            concurrency,
            pre_merge_gap_ms,
            block_gap_ms,
            smooth_max_ms,
            aggregation,
            skip_correction,
            evaluate,
            evaluation_output,
            verbose,
        } => {
            setup_logging(verbose);
            let config = PipelineConfig {
                smooth: SmoothConfig {
                    max_flip_duration_ms: smooth_max_ms,
                },
                pre_merge: PreMergeConfig {
                    gap_ms: pre_merge_gap_ms,
                },
                filter: FilterConfig {
                    confidence_threshold,
                },
                run_merge: RunMergeConfig {
                    max_trusted_gap: run_merge_gap,
                },
                chunk: ChunkConfig {
                    char_budget: chunk_budget,
                },
                correction: CorrectionConfig {
                    max_concurrency: concurrency,
                },
                block_merge: BlockMergeConfig {
                    gap_ms: block_gap_ms,
                },
            };
            process_transcript(
                input,
                output,
                human_readable,
                config,
                parse_aggregation(&aggregation)?,
                skip_correction,
                evaluate,
                evaluation_output,
            )
            .await
        }
        Commands::Analyze {
            input,
            confidence_threshold,
            run_merge_gap,
            chunk_budget,
            verbose,
        } => {
            setup_logging(verbose);
            analyze_transcript(input, confidence_threshold, run_merge_gap, chunk_budget)
        }
        Commands::Evaluate {
            input,
            output,
            verbose,
        } => {
            setup_logging(verbose);
            evaluate_machine_transcript(input, output).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn parse_aggregation(name: &str) -> Result<ConfidenceAggregation> {
    match name {
        "mean" => Ok(ConfidenceAggregation::Mean),
        "min" => Ok(ConfidenceAggregation::Min),
        "geometric-mean" | "geometric_mean" => Ok(ConfidenceAggregation::GeometricMean),
        other => anyhow::bail!("Unknown aggregation '{}' (expected mean, min, or geometric-mean)", other),
    }
}

async fn process_transcript(
    input: PathBuf,
    output: PathBuf,
    human_readable: Option<PathBuf>,
    config: PipelineConfig,
    aggregation: ConfidenceAggregation,
    skip_correction: bool,
    evaluate: bool,
    evaluation_output: Option<PathBuf>,
) -> Result<()> {
    info!("Loading recognizer output from {:?}", input);
    let ingest = IngestConfig { aggregation };
    let utterances =
        parse_recognizer_file(&input, &ingest).context("Failed to parse input transcript")?;
    info!("Loaded {} utterances", utterances.len());

    let client = if skip_correction {
        info!("Skipping correction (--skip-correction)");
        None
    } else {
        let oracle_config = OracleConfig::from_env()?;
        Some(OracleClient::new(oracle_config))
    };

    let result = run_pipeline(client.as_ref(), utterances, &config)
        .await
        .context("Pipeline failed")?;

    write_outputs(&result, &output, human_readable.as_deref())?;

    info!(
        "Complete: {} units, {} corrected, {} blocks, {}/{} chunks failed",
        result.stats.units_total,
        result.stats.units_corrected,
        result.blocks.len(),
        result.stats.chunks_failed,
        result.stats.chunks_total
    );

    if evaluate {
        let Some(client) = client.as_ref() else {
            warn!("Evaluation requires an oracle client, skipping (--skip-correction is set)");
            return Ok(());
        };
        let text = transcript_text(&result);
        let evaluation = match evaluate_transcript(client, &text, &EvaluationConfig::default()).await
        {
            Ok(evaluation) => evaluation,
            Err(e) => {
                warn!("Evaluation failed, writing empty evaluation: {:#}", e);
                Evaluation::default()
            }
        };
        let eval_path = evaluation_output
            .unwrap_or_else(|| output.with_extension("evaluation.json"));
        write_evaluation(&evaluation, &eval_path)?;
        info!("Evaluation written to {:?}", eval_path);
    }

    Ok(())
}

fn write_outputs(
    result: &PipelineOutput,
    output: &Path,
    human_readable: Option<&Path>,
) -> Result<()> {
    let machine = MachineTranscript::from_pipeline(&result.units, &result.blocks, &result.stats);
    machine.write_json(output)?;
    info!("Output written to {:?}", output);

    if let Some(human_path) = human_readable {
        HumanTranscript::new(&result.blocks).write_file(human_path)?;
        info!("Human-readable output written to {:?}", human_path);
    }

    Ok(())
}

fn transcript_text(result: &PipelineOutput) -> String {
    result
        .blocks
        .iter()
        .map(|b| b.corrected_text())
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_evaluation(evaluation: &Evaluation, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    serde_json::to_writer_pretty(file, evaluation).context("Failed to write evaluation JSON")?;
    Ok(())
}

fn analyze_transcript(
    input: PathBuf,
    confidence_threshold: f64,
    run_merge_gap: usize,
    chunk_budget: usize,
) -> Result<()> {
    info!("Analyzing recognizer output from {:?}", input);
    let utterances = parse_recognizer_file(&input, &IngestConfig::default())
        .context("Failed to parse input transcript")?;

    println!("Transcript Analysis");
    println!("==================");
    println!("Total utterances: {}", utterances.len());

    if utterances.is_empty() {
        return Ok(());
    }

    let duration_ms = utterances
        .last()
        .map(|u| u.end_ms)
        .unwrap_or(0)
        .saturating_sub(utterances.first().map(|u| u.start_ms).unwrap_or(0));
    println!("Duration: {:.1}s", duration_ms as f64 / 1000.0);

    let mut speakers: Vec<&str> = Vec::new();
    for u in &utterances {
        if !speakers.contains(&u.speaker.as_str()) {
            speakers.push(&u.speaker);
        }
    }
    println!("Speakers: {:?}", speakers);
    println!();

    let confs: Vec<f64> = utterances.iter().map(|u| u.confidence).collect();
    let min = confs.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = confs.iter().cloned().fold(0.0, f64::max);
    let avg = confs.iter().sum::<f64>() / confs.len() as f64;
    let trusted = confs.iter().filter(|c| **c >= confidence_threshold).count();

    println!("Confidence");
    println!("----------");
    println!("min={:.4}, max={:.4}, avg={:.4}", min, max, avg);
    println!(
        ">= {:.2}: {}/{} utterances",
        confidence_threshold,
        trusted,
        utterances.len()
    );
    println!();

    // Forecast the correction workload under the current thresholds
    let smoothed = stages::smooth_speakers(&utterances, &SmoothConfig::default());
    let units = stages::pre_merge(smoothed, &PreMergeConfig::default());
    let needs = stages::classify(
        &units,
        &FilterConfig {
            confidence_threshold,
        },
    );
    let raw_runs = stages::find_runs(&needs);
    let runs = stages::merge_runs(
        raw_runs.clone(),
        &RunMergeConfig {
            max_trusted_gap: run_merge_gap,
        },
    );
    let chunks = stages::build_chunks(
        &units,
        &runs,
        &ChunkConfig {
            char_budget: chunk_budget,
        },
    );

    println!("Correction Forecast");
    println!("-------------------");
    println!("Pre-merged units: {}", units.len());
    println!(
        "Needs correction: {}/{}",
        needs.iter().filter(|n| **n).count(),
        units.len()
    );
    println!("Runs: {} raw, {} after gap merge", raw_runs.len(), runs.len());
    println!(
        "Chunks: {} (budget {} chars)",
        chunks.len(),
        chunk_budget
    );
    println!(
        "Units submitted after absorption: {}",
        runs.iter().map(|r| r.len()).sum::<usize>()
    );

    Ok(())
}

async fn evaluate_machine_transcript(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    info!("Loading machine transcript from {:?}", input);
    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read file: {:?}", input))?;
    let machine: MachineTranscript =
        serde_json::from_str(&content).context("Failed to parse machine transcript JSON")?;

    let text = machine
        .blocks
        .iter()
        .map(|b| b.corrected_text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let client = OracleClient::new(OracleConfig::from_env()?);
    let evaluation = evaluate_transcript(&client, &text, &EvaluationConfig::default()).await?;

    match output {
        Some(path) => {
            write_evaluation(&evaluation, &path)?;
            info!("Evaluation written to {:?}", path);
        }
        None => {
            let json = serde_json::to_string_pretty(&evaluation)
                .context("Failed to serialize evaluation")?;
            println!("{}", json);
        }
    }

    Ok(())
}
