use regex::Regex;
use std::sync::OnceLock;

static GPU_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Consumer parts are normalised by dropping spaces ("RTX 4090 Ti" -> "RTX4090Ti").
fn get_gpu_patterns() -> &'static [Regex] {
    GPU_PATTERNS.get_or_init(|| {
        let patterns = [
            r"(?i)\b((?:RTX|GTX)\s*[A-Z]?\d{3,4}(?:\s*Ti)?(?:\s*Super)?)\b",
            r"(?i)\b(RTX\s*A\d{4})\b",
            r"(?i)\b([ABHL]\d{2,3}S?(?:\s*SXM\d?|\s*PCIE|\s*NVL)?)\b",
            r"(?i)\b(GH\d{3}|GB\d{3})\b",
            r"(?i)\b(V100|P100|K80|T4|L4|A10G?)\b",
        ];

        patterns
            .into_iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// Trait for GPU model extraction - allows for different implementations
pub trait GpuModelExtractor {
    fn extract_gpu_model(&self, machine_name: &str) -> String;
}

/// Default GPU model extractor implementation
pub struct DefaultGpuModelExtractor;

impl GpuModelExtractor for DefaultGpuModelExtractor {
    /// Extract a short GPU type from a machine name such as
    /// "NVIDIA GeForce RTX 4090" or "NVIDIA H100 80GB HBM3".
    ///
    /// Falls back to the last word of the name when nothing matches.
    fn extract_gpu_model(&self, machine_name: &str) -> String {
        let cleaned = machine_name
            .split_whitespace()
            .filter(|w| {
                !matches!(
                    w.to_ascii_lowercase().as_str(),
                    "nvidia" | "geforce" | "tesla"
                )
            })
            .collect::<Vec<_>>()
            .join(" ");

        for pattern in get_gpu_patterns() {
            if let Some(matched) = pattern.captures(&cleaned).and_then(|c| c.get(1)) {
                let compact: String = matched
                    .as_str()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join("");
                return normalise_case(&compact);
            }
        }

        machine_name
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .to_string()
    }
}

// "rtx4090ti" -> "RTX4090Ti", "h100sxm" -> "H100SXM"
fn normalise_case(model: &str) -> String {
    let upper = model.to_ascii_uppercase();
    upper.replace("TI", "Ti").replace("SUPER", "Super")
}

pub fn extract_gpu_type(machine_name: &str) -> String {
    DefaultGpuModelExtractor.extract_gpu_model(machine_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_cards() {
        assert_eq!(extract_gpu_type("NVIDIA GeForce RTX 4090"), "RTX4090");
        assert_eq!(extract_gpu_type("NVIDIA GeForce RTX 3080 Ti"), "RTX3080Ti");
        assert_eq!(extract_gpu_type("GeForce GTX 1080"), "GTX1080");
        assert_eq!(extract_gpu_type("NVIDIA RTX A6000"), "RTXA6000");
    }

    #[test]
    fn test_datacenter_cards() {
        assert_eq!(extract_gpu_type("NVIDIA H100 80GB HBM3"), "H100");
        assert_eq!(extract_gpu_type("NVIDIA A100-SXM4-80GB"), "A100");
        assert_eq!(extract_gpu_type("NVIDIA L40S"), "L40S");
        assert_eq!(extract_gpu_type("NVIDIA H200"), "H200");
        assert_eq!(extract_gpu_type("Tesla V100-PCIE-16GB"), "V100");
    }

    #[test]
    fn test_fallback_to_last_word() {
        assert_eq!(extract_gpu_type("Mystery Accelerator"), "Accelerator");
        assert_eq!(extract_gpu_type(""), "");
    }
}
