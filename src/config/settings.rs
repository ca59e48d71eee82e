use crate::pairing::DEFAULT_SEARCH_BUDGET;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub pairing_search_budget: usize,
    pub default_rounds: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            pairing_search_budget: DEFAULT_SEARCH_BUDGET,
            default_rounds: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "swiss_ranking.db".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub engine: EngineSettings,
    pub database: DatabaseSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            engine: EngineSettings::default(),
            database: DatabaseSettings::default(),
        }
    }
}
