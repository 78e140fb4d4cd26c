use crate::{errors::LiumError, models::ExecutorInfo, optimization::calculate_pareto_frontier, Result};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

/// Parse executor index from user input (1-based to 0-based)
pub fn parse_executor_index(input: &str, max_index: usize) -> Result<usize> {
    let index = input
        .trim()
        .parse::<usize>()
        .map_err(|_| LiumError::InvalidInput(format!("Invalid index: {}", input)))?;

    if index == 0 || index > max_index {
        return Err(LiumError::InvalidInput(format!(
            "Index must be between 1 and {}",
            max_index
        )));
    }

    Ok(index - 1)
}

/// Parse price range filter
pub fn parse_price_range(price_str: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = price_str.split('-').collect();
    if parts.len() != 2 {
        return Err(LiumError::InvalidInput(
            "Price range must be in format 'min-max' (e.g., '0.5-2.0')".to_string(),
        ));
    }

    let min = parts[0]
        .trim()
        .parse::<f64>()
        .map_err(|_| LiumError::InvalidInput(format!("Invalid minimum price: {}", parts[0])))?;
    let max = parts[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| LiumError::InvalidInput(format!("Invalid maximum price: {}", parts[1])))?;

    if min >= max {
        return Err(LiumError::InvalidInput(
            "Minimum price must be less than maximum price".to_string(),
        ));
    }

    Ok((min, max))
}

/// Filter executors by GPU type (case-insensitive substring)
pub fn filter_by_gpu_type(executors: &[ExecutorInfo], gpu_type: &str) -> Vec<ExecutorInfo> {
    let filter = gpu_type.to_uppercase();
    executors
        .iter()
        .filter(|e| e.gpu_type.to_uppercase().contains(&filter))
        .cloned()
        .collect()
}

/// Filter executors by price range (per GPU per hour)
pub fn filter_by_price_range(
    executors: &[ExecutorInfo],
    min_price: f64,
    max_price: f64,
) -> Vec<ExecutorInfo> {
    executors
        .iter()
        .filter(|e| e.price_per_gpu_hour >= min_price && e.price_per_gpu_hour <= max_price)
        .cloned()
        .collect()
}

pub fn filter_by_gpu_count(executors: &[ExecutorInfo], count: u32) -> Vec<ExecutorInfo> {
    executors
        .iter()
        .filter(|e| e.gpu_count == count)
        .cloned()
        .collect()
}

/// Match on country name or ISO code
pub fn filter_by_country(executors: &[ExecutorInfo], country: &str) -> Vec<ExecutorInfo> {
    let wanted = country.trim().to_lowercase();
    executors
        .iter()
        .filter(|e| {
            e.country().to_lowercase() == wanted
                || ["country", "country_code", "iso_code"]
                    .iter()
                    .filter_map(|k| e.location.get(*k))
                    .any(|v| v.trim().to_lowercase() == wanted)
        })
        .cloned()
        .collect()
}

/// Executors that advertise at least `min_ports` free ports. Unknown counts are dropped.
pub fn filter_by_min_ports(executors: &[ExecutorInfo], min_ports: u32) -> Vec<ExecutorInfo> {
    executors
        .iter()
        .filter(|e| e.available_port_count.is_some_and(|n| n >= min_ports))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    PriceGpu,
    PriceTotal,
    Location,
    Id,
    Gpu,
}

impl FromStr for SortKey {
    type Err = LiumError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "price_gpu" => Ok(SortKey::PriceGpu),
            "price_total" => Ok(SortKey::PriceTotal),
            "loc" | "location" => Ok(SortKey::Location),
            "id" => Ok(SortKey::Id),
            "gpu" => Ok(SortKey::Gpu),
            other => Err(LiumError::InvalidInput(format!(
                "Unknown sort key '{}'. Use price_gpu, price_total, loc, id or gpu",
                other
            ))),
        }
    }
}

fn compare_by(key: SortKey, a: &ExecutorInfo, b: &ExecutorInfo) -> Ordering {
    match key {
        SortKey::PriceGpu => a.price_per_gpu_hour.total_cmp(&b.price_per_gpu_hour),
        SortKey::PriceTotal => a.price_per_hour.total_cmp(&b.price_per_hour),
        SortKey::Location => a.country().cmp(&b.country()),
        SortKey::Id => a.huid.cmp(&b.huid),
        SortKey::Gpu => a
            .gpu_type
            .cmp(&b.gpu_type)
            .then(a.gpu_count.cmp(&b.gpu_count)),
    }
}

/// Stable in-place sort
pub fn sort_executors(executors: &mut [ExecutorInfo], key: SortKey) {
    executors.sort_by(|a, b| compare_by(key, a, b));
}

/// Sort with Pareto-optimal executors first (when `pareto` is set), then by key.
pub fn rank_executors(
    executors: Vec<ExecutorInfo>,
    key: SortKey,
    pareto: bool,
) -> Vec<(ExecutorInfo, bool)> {
    let mut ranked = calculate_pareto_frontier(executors);
    ranked.sort_by(|(a, a_opt), (b, b_opt)| {
        let front = if pareto {
            b_opt.cmp(a_opt)
        } else {
            Ordering::Equal
        };
        front.then_with(|| compare_by(key, a, b))
    });
    ranked
}

/// Parse a target list such as "1,3,5-7" or "all" into 0-based indices.
///
/// Indices are 1-based on input, de-duplicated, and kept in first-seen order.
pub fn parse_targets(spec: &str, len: usize) -> Result<Vec<usize>> {
    let spec = spec.trim();
    if spec.eq_ignore_ascii_case("all") {
        return Ok((0..len).collect());
    }

    let mut indices = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (parse_one_based(a, len)?, parse_one_based(b, len)?),
            None => {
                let i = parse_one_based(part, len)?;
                (i, i)
            }
        };
        if start > end {
            return Err(LiumError::InvalidInput(format!("Invalid range: {}", part)));
        }
        for i in start..=end {
            if !indices.contains(&i) {
                indices.push(i);
            }
        }
    }

    if indices.is_empty() {
        return Err(LiumError::InvalidInput("No targets given".to_string()));
    }
    Ok(indices)
}

fn parse_one_based(raw: &str, len: usize) -> Result<usize> {
    if len == 0 {
        return Err(LiumError::InvalidInput(format!(
            "Index {} out of range: nothing to select",
            raw.trim()
        )));
    }
    parse_executor_index(raw, len)
}

/// True when `spec` only contains indices, ranges, commas or "all".
pub fn looks_like_index_spec(spec: &str) -> bool {
    let spec = spec.trim();
    spec.eq_ignore_ascii_case("all")
        || (!spec.is_empty()
            && spec
                .chars()
                .all(|c| c.is_ascii_digit() || c == ',' || c == '-' || c == ' ')
            && spec.chars().next().is_some_and(|c| c.is_ascii_digit()))
}

/// Validate Docker image name
pub fn validate_docker_image(image: &str) -> Result<()> {
    if image.is_empty() {
        return Err(LiumError::InvalidInput(
            "Docker image cannot be empty".to_string(),
        ));
    }

    let valid_chars = image.chars().all(|c| {
        c.is_ascii_lowercase()
            || c.is_ascii_digit()
            || c == '/'
            || c == ':'
            || c == '.'
            || c == '-'
            || c == '_'
    });

    if !valid_chars {
        return Err(LiumError::InvalidInput(format!(
            "Docker image name '{}' contains invalid characters",
            image
        )));
    }

    Ok(())
}

/// Parse environment variables given as repeated `KEY=VALUE` items.
/// The value may itself contain '='.
pub fn parse_env_vars<S: AsRef<str>>(items: &[S]) -> Result<HashMap<String, String>> {
    let mut env_vars = HashMap::new();

    for item in items {
        let item = item.as_ref();
        let (key, value) = item.split_once('=').ok_or_else(|| {
            LiumError::InvalidInput(format!(
                "Invalid environment variable format: '{}'. Use KEY=VALUE",
                item
            ))
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(LiumError::InvalidInput(
                "Environment variable key cannot be empty".to_string(),
            ));
        }
        if !is_env_key(key) {
            return Err(LiumError::InvalidInput(format!(
                "Invalid environment variable name: '{}'",
                key
            )));
        }

        env_vars.insert(key.to_string(), value.to_string());
    }

    Ok(env_vars)
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_env_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a port list such as "22,8000"
pub fn parse_ports(ports_str: &str) -> Result<Vec<u16>> {
    ports_str
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<u16>()
                .map_err(|_| LiumError::InvalidInput(format!("Invalid port: {}", p)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_executor_index() {
        assert_eq!(parse_executor_index("1", 5).unwrap(), 0);
        assert_eq!(parse_executor_index("5", 5).unwrap(), 4);
        assert!(parse_executor_index("0", 5).is_err());
        assert!(parse_executor_index("6", 5).is_err());
        assert!(parse_executor_index("abc", 5).is_err());
    }

    #[test]
    fn test_parse_price_range() {
        let (min, max) = parse_price_range("0.5-2.0").unwrap();
        assert_eq!(min, 0.5);
        assert_eq!(max, 2.0);

        assert!(parse_price_range("2.0-0.5").is_err());
        assert!(parse_price_range("invalid").is_err());
    }

    #[test]
    fn test_parse_env_vars() {
        let env_vars = parse_env_vars(&["KEY1=value1", "URL=http://x?a=b"]).unwrap();
        assert_eq!(env_vars.get("KEY1"), Some(&"value1".to_string()));
        assert_eq!(env_vars.get("URL"), Some(&"http://x?a=b".to_string()));

        assert!(parse_env_vars(&["INVALID"]).is_err());
        assert!(parse_env_vars(&["=value"]).is_err());
        assert!(parse_env_vars(&["A;rm -rf /=1"]).is_err());
        assert!(parse_env_vars(&["1ABC=1"]).is_err());
        assert!(parse_env_vars::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_is_env_key() {
        assert!(is_env_key("PATH"));
        assert!(is_env_key("_private_1"));
        assert!(!is_env_key(""));
        assert!(!is_env_key("9LIVES"));
        assert!(!is_env_key("A-B"));
        assert!(!is_env_key("X$(id)"));
    }

    #[test]
    fn test_parse_targets() {
        assert_eq!(parse_targets("all", 3).unwrap(), vec![0, 1, 2]);
        assert_eq!(parse_targets("1,3", 3).unwrap(), vec![0, 2]);
        assert_eq!(parse_targets("2-4,1,3", 5).unwrap(), vec![1, 2, 3, 0]);
        assert!(parse_targets("4", 3).is_err());
        assert!(parse_targets("3-1", 3).is_err());
        assert!(parse_targets("x", 3).is_err());
        assert!(parse_targets("1", 0).is_err());
    }

    #[test]
    fn test_looks_like_index_spec() {
        assert!(looks_like_index_spec("1"));
        assert!(looks_like_index_spec("1-3,5"));
        assert!(looks_like_index_spec("ALL"));
        assert!(!looks_like_index_spec("brave-owl-12ab"));
        assert!(!looks_like_index_spec(""));
    }

    #[test]
    fn test_parse_ports() {
        assert_eq!(parse_ports("22, 8000").unwrap(), vec![22, 8000]);
        assert!(parse_ports("22,http").is_err());
    }

    #[test]
    fn test_filters() {
        let executors = vec![
            create_test_executor("1", "RTX4090", 1.0, "US", Some(4)),
            create_test_executor("2", "H100", 2.0, "DE", Some(1)),
            create_test_executor("3", "RTX4090", 1.5, "US", None),
        ];

        assert_eq!(filter_by_gpu_type(&executors, "rtx4090").len(), 2);
        assert_eq!(filter_by_price_range(&executors, 1.2, 2.5).len(), 2);
        assert_eq!(filter_by_country(&executors, "de").len(), 1);
        assert_eq!(filter_by_min_ports(&executors, 2).len(), 1);
        assert_eq!(filter_by_gpu_count(&executors, 1).len(), 3);
    }

    #[test]
    fn test_sort_and_rank() {
        let mut executors = vec![
            create_test_executor("b", "H100", 2.0, "US", None),
            create_test_executor("a", "A100", 1.0, "DE", None),
        ];
        sort_executors(&mut executors, SortKey::Location);
        assert_eq!(executors[0].huid, "a");

        sort_executors(&mut executors, "price_total".parse().unwrap());
        assert_eq!(executors[0].huid, "a");

        let ranked = rank_executors(executors, SortKey::Id, true);
        // "a" is cheaper with identical specs, so it dominates "b"
        assert_eq!(ranked[0].0.huid, "a");
        assert!(ranked[0].1);
        assert!(!ranked[1].1);

        assert!("bogus".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_validate_docker_image() {
        assert!(validate_docker_image("user/image:latest").is_ok());
        assert!(validate_docker_image("").is_err());
        assert!(validate_docker_image("User/Image").is_err());
    }

    fn create_test_executor(
        huid: &str,
        gpu_type: &str,
        price: f64,
        country: &str,
        ports: Option<u32>,
    ) -> ExecutorInfo {
        ExecutorInfo {
            id: format!("exec_{}", huid),
            huid: huid.to_string(),
            machine_name: format!("NVIDIA {}", gpu_type),
            gpu_type: gpu_type.to_string(),
            gpu_count: 1,
            price_per_gpu_hour: price,
            price_per_hour: price,
            status: "available".to_string(),
            location: HashMap::from([("country_code".to_string(), country.to_string())]),
            specs: json!({}),
            ip: String::new(),
            docker_in_docker: false,
            available_port_count: ports,
        }
    }
}
