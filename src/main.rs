use std::io;
use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use tracing_subscriber::EnvFilter;

use pascal_minus::error::PascalResult;

#[derive(Parser)]
#[command(name = "pascal-minus")]
#[command(about = "An interpreter for the Pascal-- teaching language")]
#[command(version)]
#[command(group(ArgGroup::new("program").required(true).args(["source", "eval"])))]
struct Cli {
    /// Pascal-- source file to execute
    source: Option<PathBuf>,

    /// Execute program text given on the command line
    #[arg(short = 'e', long)]
    eval: Option<String>,

    /// Print the token stream and exit
    #[arg(long, conflicts_with = "ast")]
    tokens: bool,

    /// Print the parsed blocks and exit
    #[arg(long)]
    ast: bool,

    /// Log pipeline stages and executed statements to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let source = match (&cli.eval, &cli.source) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("pascal-minus: cannot read {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        // clap enforces the group
        (None, None) => std::process::exit(2),
    };

    if let Err(e) = run(&cli, &source) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, source: &str) -> PascalResult<()> {
    if cli.tokens {
        for token in pascal_minus::tokenize(source)? {
            println!(
                "{}:{} {:?} {}",
                token.line(),
                token.col(),
                token.kind,
                token.lexeme
            );
        }
        return Ok(());
    }

    if cli.ast {
        let program = pascal_minus::parse_source(source)?;
        println!("{:#?}", program.blocks);
        return Ok(());
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    pascal_minus::run_source(source, stdin.lock(), stdout.lock())?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();
}
