//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use std::io::Write;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.min_samples, 50);
        assert_eq!(config.window, 10);
        assert_eq!(config.recent_window, 50);
        assert_eq!(config.history_limit, 1000);
        assert_eq!(config.statistics_limit, 500);
        assert!(config.max_value.is_none());
        assert!(config.fallback_to_statistical);
    }

    #[test]
    fn test_trainer_config_default() {
        let config = TrainerConfig::default();
        assert_eq!(config.test_ratio, 0.2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.min_training_rows, 20);
        assert_eq!(config.n_trees, 100);
        assert_eq!(config.max_depth, 10);
    }

    #[test]
    fn test_engine_config_partial_toml() {
        let toml_str = r#"
min_samples = 30
max_value = 99
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.min_samples, 30);
        assert_eq!(config.max_value, Some(99));
        assert_eq!(config.window, 10);
        assert_eq!(config.recent_window, 50);
    }

    #[test]
    fn test_full_config_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.database.path, "data/draws.db");
        assert_eq!(config.evaluation.default_days, 7);
        assert_eq!(config.trainer, TrainerConfig::default());
    }

    #[test]
    fn test_full_config_sections() {
        let toml_str = r#"
[database]
path = "/tmp/draws.db"

[trainer]
n_trees = 25
seed = 7

[evaluation]
default_days = 30
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database.path, "/tmp/draws.db");
        assert_eq!(config.trainer.n_trees, 25);
        assert_eq!(config.trainer.seed, 7);
        assert_eq!(config.trainer.max_depth, 10);
        assert_eq!(config.evaluation.default_days, 30);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.engine.window, 10);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictor.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[engine]\nmin_samples = 80\nwindow = 12").unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.engine.min_samples, 80);
        assert_eq!(config.engine.window, 12);
    }

    #[test]
    fn test_expanded_path_without_tilde() {
        let db = DatabaseConfig {
            path: "relative/draws.db".to_string(),
        };
        assert_eq!(db.expanded_path(), "relative/draws.db");
    }
}
