use super::sdk;
use crate::{
    config::Config,
    display::{print_info, print_success},
    CliError, Result,
};
use clap::Args;
use lium_api::Machine;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for `lium run`.
///
/// The script must define `main`. `--args` is a JSON object (keyword
/// arguments) or array (positional arguments).
///
/// # Examples
/// ```bash
/// lium run train.py --gpu A100 --req torch --args '{"epochs": 3}'
/// ```
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Python script defining main()
    pub script: PathBuf,

    /// GPU type to rent
    #[arg(short, long)]
    pub gpu: String,

    /// GPUs per executor
    #[arg(short, long)]
    pub count: Option<u32>,

    /// pip requirement (repeatable)
    #[arg(short, long = "req", value_name = "PACKAGE")]
    pub requirements: Vec<String>,

    /// Arguments for main() as JSON
    #[arg(short, long, default_value = "{}")]
    pub args: String,

    /// Keep the pod after the job
    #[arg(long)]
    pub keep: bool,

    /// Template id for the pod
    #[arg(short, long)]
    pub template: Option<String>,

    /// Seconds to wait for the pod to start
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,
}

impl RunArgs {
    pub fn machine(&self) -> Machine {
        let mut machine = Machine::new(self.gpu.clone())
            .requirements(self.requirements.clone())
            .keep(self.keep)
            .timeout(Duration::from_secs(self.timeout));
        if let Some(count) = self.count {
            machine = machine.count(count);
        }
        if let Some(template) = &self.template {
            machine = machine.template(template.clone());
        }
        machine
    }
}

pub async fn handle(args: RunArgs, config: &Config) -> Result<()> {
    let source = std::fs::read_to_string(&args.script).map_err(|e| {
        CliError::InvalidInput(format!("Cannot read {}: {}", args.script.display(), e))
    })?;
    let job_args = parse_job_args(&args.args)?;

    let lium = sdk(config)?;
    print_info(&format!(
        "Running {} on a {} pod...",
        args.script.display(),
        args.gpu
    ));
    let output = args.machine().run_python(&lium, &source, &job_args).await?;

    print!("{}", output.stdout);
    if !output.stderr.is_empty() {
        eprint!("{}", output.stderr);
    }
    print_success("Job finished");
    println!("{}", serde_json::to_string_pretty(&output.value)?);
    Ok(())
}

/// JSON object or array
pub fn parse_job_args(raw: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| CliError::InvalidInput(format!("--args is not valid JSON: {}", e)))?;
    match value {
        Value::Object(_) | Value::Array(_) => Ok(value),
        _ => Err(CliError::InvalidInput(
            "--args must be a JSON object or array".to_string(),
        )),
    }
}
