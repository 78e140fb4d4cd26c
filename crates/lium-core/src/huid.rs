use uuid::Uuid;

// Word lists for generating human-readable IDs
const ADJECTIVES: &[&str] = &[
    "swift", "silent", "brave", "bright", "calm", "clever", "eager", "fierce", "gentle", "grand",
    "happy", "jolly", "kind", "lively", "lucky", "mighty", "noble", "proud", "quick", "quiet",
    "rapid", "royal", "shiny", "smart", "solid", "sunny", "super", "sweet", "tidy", "vivid",
    "warm", "wise", "zesty", "agile", "bold", "cosmic", "daring", "epic", "golden", "humble",
];

const NOUNS: &[&str] = &[
    "hawk", "lion", "tiger", "eagle", "falcon", "wolf", "bear", "fox", "owl", "panda", "otter",
    "lynx", "raven", "shark", "whale", "cobra", "bison", "crane", "heron", "koala", "lemur",
    "moose", "orca", "puma", "robin", "seal", "swan", "viper", "yak", "zebra", "comet", "nova",
    "pulsar", "quasar", "nebula", "photon", "quark", "atom", "ion", "ray",
];

/// Trait for generating IDs - allows for different implementations and testing
pub trait IdGenerator {
    fn generate_uuid(&self) -> String;
    fn generate_human_id(&self, id: &str) -> String;
    fn is_valid_uuid(&self, uuid_str: &str) -> bool;
}

/// Default ID generator implementation
pub struct DefaultIdGenerator;

impl IdGenerator for DefaultIdGenerator {
    fn generate_uuid(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Generate a human-readable ID from an executor or pod id.
    /// Format: adjective-noun-suffix (e.g., "brave-owl-a1b2"), where the
    /// suffix is the last four characters of the id.
    fn generate_human_id(&self, id: &str) -> String {
        if id.is_empty() {
            return String::new();
        }

        let hash = id.chars().enumerate().fold(0u32, |acc, (i, c)| {
            acc.wrapping_add((c as u32).wrapping_mul(i as u32 + 1))
        });

        let adj_idx = (hash % ADJECTIVES.len() as u32) as usize;
        let noun_idx = ((hash / ADJECTIVES.len() as u32) % NOUNS.len() as u32) as usize;

        let chars: Vec<char> = id.chars().collect();
        let suffix: String = chars[chars.len().saturating_sub(4)..].iter().collect();

        format!("{}-{}-{}", ADJECTIVES[adj_idx], NOUNS[noun_idx], suffix)
    }

    fn is_valid_uuid(&self, uuid_str: &str) -> bool {
        Uuid::parse_str(uuid_str).is_ok()
    }
}

pub fn generate_uuid() -> String {
    DefaultIdGenerator.generate_uuid()
}

pub fn generate_human_id(id: &str) -> String {
    DefaultIdGenerator.generate_human_id(id)
}

pub fn is_valid_uuid(uuid_str: &str) -> bool {
    DefaultIdGenerator.is_valid_uuid(uuid_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_id_is_deterministic() {
        let id = "550e8400-e29b-41d4-a716-446655440000";
        let first = generate_human_id(id);
        let second = generate_human_id(id);

        assert_eq!(first, second);
        assert_eq!(first.matches('-').count(), 2);
        assert!(first.ends_with("-0000"));
    }

    #[test]
    fn test_human_id_uses_word_lists() {
        let huid = generate_human_id("abcd");
        let parts: Vec<&str> = huid.split('-').collect();

        assert!(ADJECTIVES.contains(&parts[0]));
        assert!(NOUNS.contains(&parts[1]));
        assert_eq!(parts[2], "abcd");
    }

    #[test]
    fn test_short_and_empty_ids() {
        assert_eq!(generate_human_id(""), "");
        assert!(generate_human_id("ab").ends_with("-ab"));
    }

    #[test]
    fn test_uuid_validation() {
        assert!(is_valid_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_valid_uuid("invalid-uuid"));
        assert!(is_valid_uuid(&generate_uuid()));
    }
}
