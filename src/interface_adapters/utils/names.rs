use crate::domain::ports::NameGenerator;
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "Swift", "Crimson", "Silent", "Lucky", "Brave", "Rogue", "Cosmic", "Frosty", "Golden",
    "Iron", "Neon", "Rapid", "Shadow", "Solar", "Stormy", "Wild",
];

const NOUNS: &[&str] = &[
    "Falcon", "Comet", "Viper", "Nebula", "Raven", "Meteor", "Pilot", "Hornet", "Orbit",
    "Phoenix", "Rocket", "Spark", "Wasp", "Zephyr", "Quasar", "Lynx",
];

/// Adjective + noun call signs for freshly spawned ships.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomNameGenerator;

impl NameGenerator for RandomNameGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::rng();
        let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
        let noun = NOUNS[rng.random_range(0..NOUNS.len())];
        format!("{adjective} {noun}")
    }
}
