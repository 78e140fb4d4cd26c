use super::{pod_list, resolve_targets, sdk};
use crate::{
    config::Config,
    display::{print_error, print_info, print_success},
    CliError, Result,
};
use clap::Args;
use colored::Colorize;
use lium_api::DEFAULT_MAX_WORKERS;
use lium_core::utils::parse_env_vars;
use lium_core::PodExecOutcome;
use lium_utils::OutputChunk;
use std::fs;
use std::io::Write;

/// Arguments for `lium exec`.
///
/// Options go before the command; everything after the first
/// non-option word is passed to the pod verbatim.
#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Pods: index, range, "all", huid, name or id (comma-separated)
    #[arg(value_name = "TARGETS")]
    pub targets: String,

    /// Environment variable for the command, KEY=VALUE
    #[arg(short, long, value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Run the contents of a local script instead of a command
    #[arg(short, long, value_name = "FILE", conflicts_with = "command")]
    pub script: Option<String>,

    /// Command to run
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,

    /// Parallel connections when targeting many pods
    #[arg(long, default_value_t = DEFAULT_MAX_WORKERS)]
    pub workers: usize,
}

/// Run a command on one or many pods.
///
/// A single pod streams its output live and a non-zero exit becomes an
/// error. Several pods run in parallel; each pod's output is printed as
/// its own section followed by a summary line.
pub async fn handle(args: ExecArgs, config: &Config) -> Result<()> {
    let command = build_command(&args)?;
    let env = parse_env_vars(&args.env)?;

    let lium = sdk(config)?;
    let pods = resolve_targets(&lium, config, &args.targets).await?;

    if let [pod] = pods.as_slice() {
        let exit_code = lium
            .stream_exec(pod, &command, &env, |chunk| match chunk {
                OutputChunk::Stdout(line) => println!("{}", line),
                OutputChunk::Stderr(line) => eprintln!("{}", line),
            })
            .await?;
        return if exit_code == 0 {
            Ok(())
        } else {
            Err(CliError::OperationFailed(format!(
                "Command exited with code {} on {}",
                exit_code, pod.huid
            )))
        };
    }

    print_info(&format!("Running on {} pods: {}", pods.len(), pod_list(&pods)));
    let outcomes = lium.exec_all(&pods, &command, &env, args.workers).await;
    for outcome in &outcomes {
        print_outcome(outcome);
    }

    let failed = outcomes.iter().filter(|o| !succeeded(o)).count();
    if failed == 0 {
        print_success(&format!("Succeeded on all {} pods", outcomes.len()));
        Ok(())
    } else {
        Err(CliError::OperationFailed(format!(
            "Failed on {} of {} pods",
            failed,
            outcomes.len()
        )))
    }
}

/// Command text from `--script` or the trailing words
pub fn build_command(args: &ExecArgs) -> Result<String> {
    match &args.script {
        Some(path) => {
            let script = fs::read_to_string(path)
                .map_err(|e| CliError::InvalidInput(format!("Cannot read {}: {}", path, e)))?;
            if script.trim().is_empty() {
                return Err(CliError::InvalidInput(format!("{} is empty", path)));
            }
            Ok(script)
        }
        None if !args.command.is_empty() => Ok(args.command.join(" ")),
        None => Err(CliError::InvalidInput(
            "Either a command or --script must be provided".to_string(),
        )),
    }
}

fn succeeded(outcome: &PodExecOutcome) -> bool {
    matches!(&outcome.outcome, Ok(result) if result.success)
}

fn print_outcome(outcome: &PodExecOutcome) {
    println!("\n{}", format!("── {} ──", outcome.huid).cyan().bold());
    match &outcome.outcome {
        Ok(result) => {
            print!("{}", result.stdout);
            if !result.stderr.is_empty() {
                let _ = std::io::stdout().flush();
                eprint!("{}", result.stderr);
            }
            if !result.success {
                print_error(&format!("exit code {}", result.exit_code));
            }
        }
        Err(e) => print_error(e),
    }
}
