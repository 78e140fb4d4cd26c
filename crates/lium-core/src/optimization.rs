use crate::errors::Result;
use crate::models::ExecutorInfo;
use std::collections::HashMap;

/// Trait for metrics extraction
pub trait MetricsExtractor<T> {
    fn extract_metrics(&self, item: &T) -> Result<HashMap<String, f64>>;
}

/// Pareto frontier calculator trait
pub trait ParetoOptimizer<T> {
    fn calculate_pareto_frontier(&self, items: Vec<T>) -> Vec<(T, bool)>;
    fn dominates(&self, metrics_a: &HashMap<String, f64>, metrics_b: &HashMap<String, f64>)
        -> bool;
}

/// Executor metrics. Every metric is oriented so that higher is better.
pub struct ExecutorMetricsExtractor;

impl MetricsExtractor<ExecutorInfo> for ExecutorMetricsExtractor {
    fn extract_metrics(&self, executor: &ExecutorInfo) -> Result<HashMap<String, f64>> {
        let mut metrics = HashMap::new();

        // Lower price is better, so negate it
        metrics.insert(
            "price_per_gpu_hour".to_string(),
            -executor.price_per_gpu_hour,
        );

        let optional = [
            ("vram_gb", executor.vram_gb()),
            ("ram_gb", executor.ram_gb()),
            ("disk_gb", executor.disk_gb()),
            ("net_up", executor.net_up()),
            ("net_down", executor.net_down()),
            ("tflops", executor.tflops()),
        ];
        for (name, value) in optional {
            metrics.insert(name.to_string(), value.unwrap_or(0.0));
        }

        Ok(metrics)
    }
}

/// Default Pareto optimizer implementation
pub struct DefaultParetoOptimizer<T, E> {
    extractor: E,
    _phantom: std::marker::PhantomData<T>,
}

impl<T, E> DefaultParetoOptimizer<T, E>
where
    E: MetricsExtractor<T>,
{
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T, E> ParetoOptimizer<T> for DefaultParetoOptimizer<T, E>
where
    T: Clone,
    E: MetricsExtractor<T>,
{
    /// True if `metrics_a` is at least as good as `metrics_b` everywhere and
    /// strictly better somewhere. Missing metrics count as 0.
    fn dominates(
        &self,
        metrics_a: &HashMap<String, f64>,
        metrics_b: &HashMap<String, f64>,
    ) -> bool {
        let mut strictly_better_in_one = false;

        let mut all_keys: std::collections::HashSet<&String> = metrics_a.keys().collect();
        all_keys.extend(metrics_b.keys());

        for key in all_keys {
            let a_val = metrics_a.get(key).copied().unwrap_or(0.0);
            let b_val = metrics_b.get(key).copied().unwrap_or(0.0);

            if a_val < b_val {
                return false;
            } else if a_val > b_val {
                strictly_better_in_one = true;
            }
        }

        strictly_better_in_one
    }

    /// Returns `(item, is_pareto_optimal)` pairs in input order.
    fn calculate_pareto_frontier(&self, items: Vec<T>) -> Vec<(T, bool)> {
        let metrics: Vec<Option<HashMap<String, f64>>> = items
            .iter()
            .map(|item| self.extractor.extract_metrics(item).ok())
            .collect();

        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let optimal = match &metrics[i] {
                    Some(metrics_a) => !metrics.iter().enumerate().any(|(j, other)| {
                        i != j
                            && other
                                .as_ref()
                                .is_some_and(|metrics_b| self.dominates(metrics_b, metrics_a))
                    }),
                    None => false,
                };
                (item, optimal)
            })
            .collect()
    }
}

pub fn extract_executor_metrics(executor: &ExecutorInfo) -> Result<HashMap<String, f64>> {
    ExecutorMetricsExtractor.extract_metrics(executor)
}

pub fn dominates(metrics_a: &HashMap<String, f64>, metrics_b: &HashMap<String, f64>) -> bool {
    let optimizer = DefaultParetoOptimizer::new(ExecutorMetricsExtractor);
    optimizer.dominates(metrics_a, metrics_b)
}

pub fn calculate_pareto_frontier(executors: Vec<ExecutorInfo>) -> Vec<(ExecutorInfo, bool)> {
    let optimizer = DefaultParetoOptimizer::new(ExecutorMetricsExtractor);
    optimizer.calculate_pareto_frontier(executors)
}
