use super::{sdk, OutputFormat};
use crate::{
    config::Config,
    display::{display_executors_detailed, display_executors_table},
    storage::{store_selection, SelectionKind},
    CliError, Result,
};
use clap::Args;
use lium_api::ExecutorFilter;
use lium_core::utils::{
    filter_by_country, filter_by_gpu_count, filter_by_min_ports, filter_by_price_range,
    parse_price_range, rank_executors,
};
use lium_core::{ExecutorInfo, SortKey};
use log::debug;

/// Command-line arguments for `lium ls`.
///
/// Executors are ranked with Pareto-optimal machines first, then by the
/// sort key. The printed order is remembered so `lium up 3` rents the
/// third row.
///
/// # Examples
/// ```bash
/// lium ls H100
/// lium ls --count 8 --price 1.0-2.5 --sort price_total
/// lium ls A100 --lat 40.7 --lon -74.0 --radius 500
/// ```
#[derive(Args, Debug, Default)]
pub struct LsArgs {
    /// GPU type, e.g. H100, A100, RTX4090
    #[arg(value_name = "GPU")]
    pub gpu: Option<String>,

    /// Exact number of GPUs per executor
    #[arg(short, long)]
    pub count: Option<u32>,

    /// Country name or ISO code
    #[arg(long)]
    pub country: Option<String>,

    /// Price range per GPU per hour, "MIN-MAX"
    #[arg(short, long)]
    pub price: Option<String>,

    /// Minimum number of free ports
    #[arg(long)]
    pub min_ports: Option<u32>,

    /// price_gpu, price_total, loc, id or gpu
    #[arg(short, long, default_value = "price_gpu")]
    pub sort: String,

    /// Show at most this many executors
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Do not move Pareto-optimal executors to the top
    #[arg(long)]
    pub no_pareto: bool,

    /// Latitude for distance filtering
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude for distance filtering
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,

    /// Maximum distance in miles from --lat/--lon
    #[arg(long)]
    pub radius: Option<f64>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl LsArgs {
    pub fn filter(&self) -> ExecutorFilter {
        ExecutorFilter {
            gpu_type: self.gpu.clone(),
            gpu_count: self.count,
            lat: self.lat,
            lon: self.lon,
            max_distance_miles: self.radius,
        }
    }
}

pub async fn handle(args: LsArgs, config: &mut Config) -> Result<()> {
    let lium = sdk(config)?;
    let executors = lium.ls(&args.filter()).await?;
    debug!("{} executors before local filters", executors.len());

    let ranked = rank(executors, &args)?;
    store_selection(
        config,
        SelectionKind::Executors,
        &ranked.iter().map(|(e, _)| e.clone()).collect::<Vec<_>>(),
    )?;

    match args.format {
        OutputFormat::Table => display_executors_table(&ranked),
        OutputFormat::Detailed => display_executors_detailed(&ranked),
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = ranked
                .iter()
                .map(|(executor, optimal)| {
                    let mut value = serde_json::to_value(executor)?;
                    if let Some(obj) = value.as_object_mut() {
                        obj.insert("pareto_optimal".to_string(), (*optimal).into());
                    }
                    Ok(value)
                })
                .collect::<std::result::Result<_, serde_json::Error>>()?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}

/// Apply the client-side filters, rank and truncate
pub fn rank(executors: Vec<ExecutorInfo>, args: &LsArgs) -> Result<Vec<(ExecutorInfo, bool)>> {
    let sort_key: SortKey = args.sort.parse()?;
    let executors = apply_filters(executors, args)?;

    let mut ranked = rank_executors(executors, sort_key, !args.no_pareto);
    if let Some(limit) = args.limit {
        ranked.truncate(limit);
    }
    Ok(ranked)
}

/// Filters the API does not apply itself
pub fn apply_filters(mut executors: Vec<ExecutorInfo>, args: &LsArgs) -> Result<Vec<ExecutorInfo>> {
    if let Some(count) = args.count {
        executors = filter_by_gpu_count(&executors, count);
    }
    if let Some(country) = &args.country {
        executors = filter_by_country(&executors, country);
    }
    if let Some(price) = &args.price {
        let (min, max) = parse_price_range(price)?;
        executors = filter_by_price_range(&executors, min, max);
    }
    if let Some(min_ports) = args.min_ports {
        executors = filter_by_min_ports(&executors, min_ports);
    }
    if args.radius.is_some() && args.lat.is_none() {
        return Err(CliError::InvalidInput(
            "--radius needs --lat and --lon".to_string(),
        ));
    }
    Ok(executors)
}
