use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use cmdtrace::command::{Dispatcher, TaskOutcome, params};
use cmdtrace::demo::{self, GreetGroup};
use cmdtrace::result::{LogFormat, LogSink, TraceConfig, WriterSink};
use cmdtrace::{Result, TraceReader, logging, pretty_print};
use serde_json::json;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cmdtrace")]
#[command(about = "Run traced command trees and pretty-print their logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild and print the command trees found in a log file.
    Pretty {
        /// Log file to read, or `-` for stdin.
        #[arg(long)]
        log: String,

        /// Only print the tree with this sequence id.
        #[arg(long)]
        sequence: Option<String>,

        #[arg(short = 'o', long)]
        out: Option<String>,
    },
    /// Run the demo greet-group command with tracing enabled.
    Demo {
        /// Names to greet (`help` prints the command's usage).
        #[arg(long, num_args = 1.., default_values = ["Avon", "Stringer"])]
        names: Vec<String>,

        #[arg(long, value_enum, default_value_t = LogFormat::Json)]
        format: LogFormat,

        /// Write trace lines here instead of stdout.
        #[arg(long)]
        log: Option<String>,
    },
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Pretty { log, sequence, out } => {
            let input: Box<dyn BufRead> = if log == "-" {
                Box::new(io::stdin().lock())
            } else {
                let file = File::open(&log).with_context(|| format!("open log file {}", log))?;
                Box::new(BufReader::new(file))
            };
            let reader = TraceReader::new(input, sequence)?;

            match out {
                Some(path) => {
                    let file =
                        File::create(&path).with_context(|| format!("create output file {}", path))?;
                    pretty_print(reader, BufWriter::new(file))?;
                    println!("Wrote {}", path);
                }
                None => {
                    let mut stdout = pretty_print(reader, io::stdout().lock())?;
                    stdout.flush().context("flush stdout")?;
                }
            }
        }
        Commands::Demo { names, format, log } => {
            let sink: Arc<dyn LogSink> = match &log {
                Some(path) => {
                    let file =
                        File::create(path).with_context(|| format!("create log file {}", path))?;
                    Arc::new(WriterSink::new(file))
                }
                None => Arc::new(WriterSink::new(io::stdout())),
            };

            let dispatcher = Dispatcher::new(demo::registry())
                .with_sink(sink)
                .with_config(TraceConfig { format });

            // A single name goes through as a plain string so `--names help`
            // reaches the help check.
            let names = match names.as_slice() {
                [only] if only == "help" => json!(only),
                _ => json!(names),
            };

            match dispatcher.execute_task::<GreetGroup>(params(json!({ "names": names })))? {
                TaskOutcome::Help(text) => print!("{}", text),
                TaskOutcome::Completed(result) => {
                    eprintln!("sequence: {}", result.sequence().unwrap_or("-"));
                    if !result.is_ok() {
                        bail!(
                            "demo failed with code {}: {}",
                            result.result_code(),
                            result.last_error().unwrap_or_default()
                        );
                    }
                    if let Some(path) = log {
                        println!("Wrote {}", path);
                    }
                }
            }
        }
    }

    Ok(())
}
