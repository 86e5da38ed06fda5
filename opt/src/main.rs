use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use migopt::{OptimizerConfig, Session};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Optimize a combinational AIGER netlist as a majority-inverter graph.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Input file, binary (.aig) or ASCII (.aag) AIGER.
    input: PathBuf,

    /// Where to write the optimized netlist; ASCII if it ends in .aag.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Passes to run, separated by semicolons: rw (rewrite), rf (refactor), b (balance), rs (resubstitute).
    #[arg(long, conflicts_with = "mode")]
    script: Option<String>,

    /// A preset script.
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// JSON file overriding pass parameters.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check the result against the input by exhaustive simulation.
    #[arg(long)]
    verify: bool,

    /// Write the optimized graph in Graphviz format.
    #[arg(long)]
    dot: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Depth,
    Area,
    Balanced,
}

impl Mode {
    const fn script(self) -> &'static str {
        match self {
            Self::Depth => "b;rw;b;rw",
            Self::Area => "rs;rf;rs;rf",
            Self::Balanced => "rw;rs;b;rf",
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Step {
    Rewrite,
    Refactor,
    Balance,
    Resub,
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rw" => Ok(Self::Rewrite),
            "rf" => Ok(Self::Refactor),
            "b" => Ok(Self::Balance),
            "rs" => Ok(Self::Resub),
            _ => Err(format!("unknown step `{s}`")),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rewrite => "rewrite",
            Self::Refactor => "refactor",
            Self::Balance => "balance",
            Self::Resub => "resub",
        };
        f.pad(name)
    }
}

fn parse_script(script: &str) -> Result<Vec<Step>, String> {
    script.split(';').map(str::trim).filter(|step| !step.is_empty()).map(str::parse).collect()
}

fn report(label: &dyn fmt::Display, session: &Session) {
    println!(
        "{label:<10} gates {:>8}  depth {:>5}  wsa {:>12.3}",
        session.node_count(),
        session.depth(),
        session.switching_activity()
    );
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => serde_json::from_str::<OptimizerConfig>(&std::fs::read_to_string(path)?)?,
        None => OptimizerConfig::default(),
    };
    let script = match (&args.script, args.mode) {
        (Some(script), _) => script.as_str(),
        (None, Some(mode)) => mode.script(),
        (None, None) => Mode::Balanced.script(),
    };
    let steps = parse_script(script)?;

    let mut session = Session::load_with_config(&args.input, config)?;
    let original = args.verify.then(|| session.network().clone());
    report(&"input", &session);

    for step in steps {
        match step {
            Step::Rewrite => session.rewrite(),
            Step::Refactor => session.refactor(),
            Step::Balance => session.balance()?,
            Step::Resub => session.resub(),
        }
        report(&step, &session);
    }

    if let Some(original) = original {
        match migopt::sim::equivalent(&original, session.network()) {
            Some(true) => println!("verified: equivalent to input"),
            Some(false) => return Err("optimized network differs from the input".into()),
            None => warn!("too many inputs for exhaustive verification, skipped"),
        }
    }

    if let Some(path) = &args.dot {
        std::fs::write(path, migopt::dot::to_graphviz(session.network()))?;
    }
    if let Some(path) = &args.output {
        session.save(path)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
