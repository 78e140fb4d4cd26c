use super::{confirmed, sdk};
use crate::{
    config::Config,
    display::{display_pod_details, gpu_config, print_info, print_success, print_warning},
    resolvers::resolve_from_selection,
    storage::{last_selection, SelectionKind},
    CliError, Result,
};
use clap::Args;
use lium_api::{ExecutorFilter, Lium, UpRequest};
use lium_core::utils::{filter_by_country, rank_executors};
use lium_core::{termination_time, ExecutorInfo, SortKey};
use log::debug;
use std::time::Duration;

/// Arguments for `lium up`.
///
/// The executor can be an index into the last `lium ls` listing, a huid
/// or a raw id. Without one, the best Pareto-optimal executor matching
/// `--gpu`, `--count` and `--country` is picked.
#[derive(Args, Debug, Default)]
pub struct UpArgs {
    /// Executor index, huid or id
    #[arg(value_name = "EXECUTOR")]
    pub executor: Option<String>,

    /// GPU type for automatic selection
    #[arg(short, long)]
    pub gpu: Option<String>,

    /// GPU count for automatic selection
    #[arg(short, long)]
    pub count: Option<u32>,

    /// Country for automatic selection
    #[arg(long)]
    pub country: Option<String>,

    /// Number of ports to open on the pod
    #[arg(long)]
    pub ports: Option<u32>,

    /// Pod name (defaults to the executor huid)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Template id (defaults to template.default_id, then a PyTorch image)
    #[arg(short, long)]
    pub template: Option<String>,

    /// Volume id to attach
    #[arg(long)]
    pub volume: Option<String>,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Wait until the pod is running
    #[arg(short, long)]
    pub wait: bool,

    /// Seconds to wait for the pod
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,

    /// Remove the pod after this long, e.g. 6h
    #[arg(long = "in", value_name = "DURATION", conflicts_with = "at")]
    pub in_: Option<String>,

    /// Remove the pod at this local time, e.g. "tomorrow 09:00"
    #[arg(long, value_name = "TIME")]
    pub at: Option<String>,

    /// Install Jupyter on this internal port once running
    #[arg(long, value_name = "PORT")]
    pub jupyter: Option<u16>,
}

pub async fn handle(args: UpArgs, config: &Config) -> Result<()> {
    // Validate the schedule before renting anything
    let removal_at = termination_time(
        args.in_.as_deref(),
        args.at.as_deref(),
        &chrono::Local::now(),
    )?;

    let lium = sdk(config)?;

    let executor = match &args.executor {
        Some(target) => {
            let selection = last_selection(config, SelectionKind::Executors)?;
            let id = resolve_from_selection(selection.as_deref(), SelectionKind::Executors, target)?;
            lium.get_executor(&id)
                .await?
                .ok_or_else(|| CliError::NotFound(format!("Executor '{}' not found", target)))?
        }
        None => auto_select(&lium, &args).await?,
    };

    let name = args.name.clone().unwrap_or_else(|| executor.huid.clone());
    println!(
        "Executor {} ({}) in {} at ${:.2}/h",
        executor.huid.as_str(),
        gpu_config(Some(&executor)),
        executor.country(),
        executor.price_per_hour
    );
    if !confirmed(args.yes, &format!("Rent pod '{}'?", name))? {
        print_info("Cancelled");
        return Ok(());
    }

    let mut request = UpRequest::new(executor.id.clone());
    request.name = name;
    request.template_id = args.template.clone().or_else(|| config.default_template_id());
    request.volume_id = args.volume.clone();
    request.ports = args.ports;

    let handle = lium.up(request).await?;
    print_success(&format!("Pod {} ({}) created", handle.name, handle.huid));

    let needs_running = args.wait || args.jupyter.is_some() || removal_at.is_some();
    if !needs_running {
        println!("Run 'lium ps' to follow its status.");
        return Ok(());
    }

    print_info("Waiting for the pod to start...");
    let pod = match lium
        .wait_ready(&handle.id, Duration::from_secs(args.timeout))
        .await?
    {
        Some(pod) => pod,
        None => {
            print_warning(&format!(
                "Pod {} not ready after {}s. Check 'lium ps'.",
                handle.huid, args.timeout
            ));
            return Ok(());
        }
    };

    if let Some(at) = removal_at {
        lium.schedule_termination(&pod, at).await?;
        print_success(&format!(
            "Removal scheduled for {}",
            at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M %Z")
        ));
    }
    if let Some(port) = args.jupyter {
        lium.install_jupyter(&pod, port).await?;
        print_success("Jupyter installation started. 'lium ps' shows the URL once ready.");
    }

    display_pod_details(&pod, chrono::Utc::now());
    Ok(())
}

/// Best executor for the filters: Pareto-optimal first, cheapest per GPU
async fn auto_select(lium: &Lium, args: &UpArgs) -> Result<ExecutorInfo> {
    let filter = ExecutorFilter {
        gpu_type: args.gpu.clone(),
        gpu_count: args.count,
        ..Default::default()
    };
    let mut executors = lium.ls(&filter).await?;
    if let Some(country) = &args.country {
        executors = filter_by_country(&executors, country);
    }
    debug!("{} candidate executors", executors.len());

    pick_best(executors).ok_or_else(|| {
        CliError::NotFound("No executors match the given filters. Try 'lium ls'.".to_string())
    })
}

pub fn pick_best(executors: Vec<ExecutorInfo>) -> Option<ExecutorInfo> {
    rank_executors(executors, SortKey::PriceGpu, true)
        .into_iter()
        .next()
        .map(|(executor, _)| executor)
}
