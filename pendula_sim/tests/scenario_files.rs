// pendula_sim/tests/scenario_files.rs

use std::path::PathBuf;

use pendula_sim::prelude::*;

fn scenario(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("assets/scenarios")
        .join(name)
}

#[test]
fn classic_file_matches_built_in_defaults() {
    figment::Jail::expect_with(|_jail| {
        let config: ScenarioConfig =
            ScenarioConfig::figment(Some(scenario("double_pendulum.toml").as_path())).extract()?;

        let mut expected = ScenarioConfig::default();
        expected.simulation.seed = Some(42);
        assert_eq!(config, expected);
        Ok(())
    });
}

#[test]
fn bundled_scenarios_are_valid() {
    figment::Jail::expect_with(|_jail| {
        for name in ["double_pendulum.toml", "single_pendulum.toml", "tip_tracking.toml"] {
            let config: ScenarioConfig =
                ScenarioConfig::figment(Some(scenario(name).as_path())).extract()?;
            config
                .validate()
                .map_err(|err| format!("{name}: {err}"))?;
        }
        Ok(())
    });
}

#[test]
fn single_pendulum_file_runs() {
    figment::Jail::expect_with(|_jail| {
        let config: ScenarioConfig =
            ScenarioConfig::figment(Some(scenario("single_pendulum.toml").as_path())).extract()?;
        let seed = config.simulation.seed.unwrap_or(0);
        let report = run_scenario(&config, seed).map_err(|err| err.to_string())?;

        assert_eq!(report.records.len(), config.simulation.steps - 1);
        assert!(report.dropped_measurements > 0);
        Ok(())
    });
}

#[test]
fn missing_file_is_reported() {
    let result = ScenarioConfig::load(Some(scenario("nope.toml").as_path()));
    assert!(matches!(result, Err(SimError::MissingScenario(_))));
}
