//! Script harness for the bagdesk core.
//!
//! # Responsibility
//! - Read a command script from a file argument or stdin.
//! - Drive one `Desk` through its public operations, one line at a time.
//! - Print each result (or `error: <msg>`) and keep going.
//!
//! Usage: `bagdesk_cli [--config <desk.json>] [script]`

mod runner;
mod script;

use bagdesk_core::{init_logging, DeskConfig, LoggingConfig};
use log::{info, warn};
use runner::Runner;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

struct Args {
    config: Option<PathBuf>,
    script: Option<PathBuf>,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args {
        config: None,
        script: None,
    };
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--config" => {
                let path = raw.next().ok_or("`--config` requires a file path")?;
                args.config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag `{flag}`")),
            _ if args.script.is_some() => return Err("only one script path is accepted".into()),
            _ => args.script = Some(PathBuf::from(arg)),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&PathBuf>) -> Result<DeskConfig, String> {
    let Some(path) = path else {
        return Ok(DeskConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read config `{}`: {err}", path.display()))?;
    DeskConfig::from_json_str(&raw).map_err(|err| format!("config `{}`: {err}", path.display()))
}

fn open_script(path: Option<&PathBuf>) -> Result<Box<dyn Read>, String> {
    match path {
        Some(path) => std::fs::File::open(path)
            .map(|file| Box::new(file) as Box<dyn Read>)
            .map_err(|err| format!("cannot open script `{}`: {err}", path.display())),
        None => Ok(Box::new(io::stdin())),
    }
}

fn run() -> Result<(), String> {
    let args = parse_args(std::env::args().skip(1))?;

    let logging = LoggingConfig::from_env();
    if logging.is_enabled() {
        if let Err(err) = init_logging(&logging) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let config = load_config(args.config.as_ref())?;
    let input = open_script(args.script.as_ref())?;
    info!(
        "event=script_start module=cli status=ok checks={} audit_after_mutation={}",
        config.precondition_checks, config.audit_after_mutation
    );

    let mut runner = Runner::new(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0usize;

    for (index, line) in BufReader::new(input).lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|err| format!("read failed at line {line_no}: {err}"))?;
        let outcome = match script::parse_line(line_no, &line) {
            Ok(None) => continue,
            Ok(Some(command)) => runner
                .execute(command)
                .map_err(|err| format!("line {line_no}: {err}")),
            Err(err) => Err(err.to_string()),
        };
        let written = match outcome {
            Ok(text) => writeln!(out, "{text}"),
            Err(message) => {
                failures += 1;
                warn!("event=script_line module=cli status=error line={line_no}");
                writeln!(out, "error: {message}")
            }
        };
        written.map_err(|err| format!("write failed: {err}"))?;
    }

    info!("event=script_end module=cli status=ok failures={failures}");
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("bagdesk_cli: {message}");
            ExitCode::FAILURE
        }
    }
}
