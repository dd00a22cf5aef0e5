use crate::cli::InferenceArgs;
use crate::error::{CliError, Result};
use bondscan::core::distributions::registry::{
    DistributionRegistry, STANDARD_SIG_DIGITS, STANDARD_UNBONDED_RIGHT_TAIL_MASS,
};
use bondscan::core::models::topology::BondOrder;
use bondscan::core::valence::ValenceRules;
use bondscan::engine::config::{InferenceConfig, InferenceConfigBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialInferenceConfig {
    distance_cutoff: Option<f64>,
    acceptance_threshold: Option<f64>,
    max_bond_order: Option<u8>,
    score_unbonded_pairs: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialDataConfig {
    bond_lengths: Option<PathBuf>,
    valence_rules: Option<PathBuf>,
    store: Option<PathBuf>,
    unbonded_tail_mass: Option<f64>,
    sig_digits: Option<u32>,
    overrides: Option<Vec<String>>,
}

/// Contents of a `bondscan` TOML config file. Every key is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialAppConfig {
    inference: Option<PartialInferenceConfig>,
    data: Option<PartialDataConfig>,
}

/// Fully resolved settings for one command.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub inference: InferenceConfig,
    pub bond_lengths: Option<PathBuf>,
    pub valence_rules: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub unbonded_tail_mass: f64,
    pub sig_digits: u32,
    /// Range overrides in the order they are applied: file first, then CLI.
    pub overrides: Vec<String>,
}

impl PartialAppConfig {
    /// Reads a config file. Relative data paths are taken relative to the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

        if let (Some(base), Some(data)) = (path.parent(), config.data.as_mut()) {
            for slot in [
                &mut data.bond_lengths,
                &mut data.valence_rules,
                &mut data.store,
            ] {
                if let Some(p) = slot.as_mut().filter(|p| p.is_relative()) {
                    *p = base.join(&*p);
                }
            }
        }
        Ok(config)
    }

    /// Reads `path` if given, otherwise starts from an empty config.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_cli(mut self, args: &InferenceArgs) -> Result<AppConfig> {
        self.apply_set_values(&args.set_values)?;

        let inference = self.inference.take().unwrap_or_default();
        let data = self.data.take().unwrap_or_default();

        let mut builder = InferenceConfigBuilder::new();
        if let Some(cutoff) = args.distance_cutoff.or(inference.distance_cutoff) {
            builder = builder.distance_cutoff(cutoff);
        }
        if let Some(threshold) = args.acceptance_threshold.or(inference.acceptance_threshold) {
            builder = builder.acceptance_threshold(threshold);
        }
        if let Some(value) = args.max_bond_order.or(inference.max_bond_order) {
            let order = BondOrder::from_value(value).ok_or_else(|| {
                CliError::Config(format!("Invalid maximum bond order: {}", value))
            })?;
            builder = builder.max_bond_order(order);
        }
        if args.score_unbonded_pairs {
            builder = builder.score_unbonded_pairs(true);
        } else if let Some(enabled) = inference.score_unbonded_pairs {
            builder = builder.score_unbonded_pairs(enabled);
        }
        let inference = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let mut overrides = data.overrides.unwrap_or_default();
        overrides.extend(args.ranges.iter().cloned());

        Ok(AppConfig {
            inference,
            bond_lengths: args.bond_lengths.clone().or(data.bond_lengths),
            valence_rules: args.valence_rules.clone().or(data.valence_rules),
            store: data.store,
            unbonded_tail_mass: data
                .unbonded_tail_mass
                .unwrap_or(STANDARD_UNBONDED_RIGHT_TAIL_MASS),
            sig_digits: data.sig_digits.unwrap_or(STANDARD_SIG_DIGITS),
            overrides,
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;

            let invalid = |kind: &str| {
                CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value_str))
            };

            match key {
                "inference.distance-cutoff" => {
                    self.inference
                        .get_or_insert_with(Default::default)
                        .distance_cutoff = Some(value_str.parse().map_err(|_| invalid("float"))?);
                }
                "inference.acceptance-threshold" => {
                    self.inference
                        .get_or_insert_with(Default::default)
                        .acceptance_threshold =
                        Some(value_str.parse().map_err(|_| invalid("float"))?);
                }
                "inference.max-bond-order" => {
                    self.inference
                        .get_or_insert_with(Default::default)
                        .max_bond_order = Some(value_str.parse().map_err(|_| invalid("integer"))?);
                }
                "inference.score-unbonded-pairs" => {
                    self.inference
                        .get_or_insert_with(Default::default)
                        .score_unbonded_pairs =
                        Some(value_str.parse().map_err(|_| invalid("boolean"))?);
                }
                "data.unbonded-tail-mass" => {
                    self.data
                        .get_or_insert_with(Default::default)
                        .unbonded_tail_mass = Some(value_str.parse().map_err(|_| invalid("float"))?);
                }
                "data.sig-digits" => {
                    self.data.get_or_insert_with(Default::default).sig_digits =
                        Some(value_str.parse().map_err(|_| invalid("integer"))?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

impl AppConfig {
    /// Builds the distribution registry: the bond-length table first, then every
    /// range override in order.
    pub fn build_registry(&self) -> Result<DistributionRegistry> {
        let mut registry = DistributionRegistry::new();

        match &self.bond_lengths {
            Some(path) => {
                info!("Loading bond length distributions from {:?}", path);
                let report = registry
                    .add_from_csv_file(path, self.unbonded_tail_mass, self.sig_digits)
                    .map_err(|e| CliError::FileParsing {
                        path: path.clone(),
                        source: e.into(),
                    })?;
                if !report.skipped.is_empty() {
                    warn!(
                        "{} malformed row(s) skipped in {:?}.",
                        report.skipped.len(),
                        path
                    );
                }
            }
            None if self.overrides.is_empty() => {
                warn!("No bond length table or range overrides given; no pair will be bonded.");
            }
            None => {}
        }

        for spec in &self.overrides {
            registry.add_from_range_spec(spec).map_err(|e| {
                CliError::Config(format!("Invalid range override '{}': {}", spec, e))
            })?;
        }
        Ok(registry)
    }

    pub fn build_valence_rules(&self) -> Result<ValenceRules> {
        match &self.valence_rules {
            Some(path) => {
                info!("Loading valence rules from {:?}", path);
                ValenceRules::load(path).map_err(|e| CliError::FileParsing {
                    path: path.clone(),
                    source: e.into(),
                })
            }
            None => Ok(ValenceRules::default()),
        }
    }

    /// The store snapshot to use: the CLI path if given, otherwise `data.store`.
    pub fn store_path(&self, cli: Option<&Path>) -> Result<PathBuf> {
        cli.map(Path::to_path_buf)
            .or_else(|| self.store.clone())
            .ok_or_else(|| {
                CliError::Config(
                    "A store path is required either in the config file (`data.store`) or via --store."
                        .to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use bondscan::core::models::atom::Element;
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    const BOND_LENGTHS: &str = "\
atom_a,atom_b,bond_order,length,count
C,C,1,1.54,10
C,C,2,1.34,10
";

    fn inference_args(argv: &[&str]) -> InferenceArgs {
        let mut full = vec!["bondscan", "infer", "-i", "in.xyz"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Infer(args) => args.inference,
            other => panic!("Expected 'infer' subcommand, got {:?}", other),
        }
    }

    #[test]
    fn empty_config_resolves_to_defaults() {
        let config = PartialAppConfig::default()
            .merge_with_cli(&inference_args(&[]))
            .unwrap();

        assert_eq!(config.inference, InferenceConfig::default());
        assert_eq!(config.unbonded_tail_mass, STANDARD_UNBONDED_RIGHT_TAIL_MASS);
        assert_eq!(config.sig_digits, STANDARD_SIG_DIGITS);
        assert!(config.overrides.is_empty());
        assert!(config.store_path(None).is_err());
    }

    #[test]
    fn file_values_are_loaded_and_relative_paths_resolved() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("bondscan.toml");
        fs::write(
            &config_path,
            r#"
            [inference]
            distance-cutoff = 2.4
            max-bond-order = 2
            score-unbonded-pairs = true

            [data]
            bond-lengths = "lengths.csv"
            store = "/abs/store.cbor"
            sig-digits = 2
            overrides = ["N~N:1.0-2.0"]
            "#,
        )
        .unwrap();

        let config = PartialAppConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&inference_args(&[]))
            .unwrap();

        assert_eq!(config.inference.distance_cutoff, 2.4);
        assert_eq!(config.inference.max_bond_order, BondOrder::Double);
        assert!(config.inference.score_unbonded_pairs);
        assert_eq!(config.bond_lengths, Some(dir.path().join("lengths.csv")));
        assert_eq!(
            config.store_path(None).unwrap(),
            PathBuf::from("/abs/store.cbor")
        );
        assert_eq!(config.sig_digits, 2);
        assert_eq!(config.overrides, vec!["N~N:1.0-2.0".to_string()]);
    }

    #[test]
    fn cli_args_override_file_values() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("bondscan.toml");
        fs::write(
            &config_path,
            r#"
            [inference]
            distance-cutoff = 2.4
            acceptance-threshold = 0.1

            [data]
            bond-lengths = "/data/file.csv"
            store = "/data/file.cbor"
            overrides = ["N~N:1.0-2.0"]
            "#,
        )
        .unwrap();

        let args = inference_args(&[
            "--distance-cutoff",
            "1.8",
            "-b",
            "/data/cli.csv",
            "-r",
            "C=C:1.2-1.4",
            "-S",
            "inference.acceptance-threshold=0.25",
        ]);
        let config = PartialAppConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();

        assert_eq!(config.inference.distance_cutoff, 1.8);
        assert_eq!(config.inference.acceptance_threshold, 0.25);
        assert_eq!(config.bond_lengths, Some(PathBuf::from("/data/cli.csv")));
        assert_eq!(
            config.store_path(Some(Path::new("/cli/store.cbor"))).unwrap(),
            PathBuf::from("/cli/store.cbor")
        );
        assert_eq!(
            config.overrides,
            vec!["N~N:1.0-2.0".to_string(), "C=C:1.2-1.4".to_string()]
        );
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("bad.toml");
        fs::write(&config_path, "[inference]\nsearch-depth = 3\n").unwrap();
        assert!(matches!(
            PartialAppConfig::from_file(&config_path),
            Err(CliError::FileParsing { .. })
        ));

        let bad_set = inference_args(&["-S", "inference.max-iterations=3"]);
        assert!(matches!(
            PartialAppConfig::default().merge_with_cli(&bad_set),
            Err(CliError::Config(_))
        ));

        let bad_order = inference_args(&["--max-bond-order", "0"]);
        assert!(matches!(
            PartialAppConfig::default().merge_with_cli(&bad_order),
            Err(CliError::Config(_))
        ));

        let bad_cutoff = inference_args(&["--distance-cutoff", "0"]);
        assert!(matches!(
            PartialAppConfig::default().merge_with_cli(&bad_cutoff),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn registry_combines_table_and_overrides() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("lengths.csv");
        fs::write(&csv_path, BOND_LENGTHS).unwrap();

        let args = inference_args(&[
            "-b",
            csv_path.to_str().unwrap(),
            "-r",
            "N~N:1.0-2.0",
        ]);
        let config = PartialAppConfig::default().merge_with_cli(&args).unwrap();
        let registry = config.build_registry().unwrap();

        assert!(
            registry
                .lookup(Element::C, Element::C, BondOrder::Double)
                .admits(1.34, 0.0)
        );
        assert!(
            registry
                .lookup(Element::N, Element::N, BondOrder::Single)
                .admits(1.5, 0.0)
        );

        let bad = PartialAppConfig::default()
            .merge_with_cli(&inference_args(&["-r", "N~N:2.0"]))
            .unwrap();
        assert!(matches!(bad.build_registry(), Err(CliError::Config(_))));
    }

    #[test]
    fn valence_rules_default_or_load_from_file() {
        let config = PartialAppConfig::default()
            .merge_with_cli(&inference_args(&[]))
            .unwrap();
        assert_eq!(config.build_valence_rules().unwrap(), ValenceRules::default());

        let dir = tempdir().unwrap();
        let path = dir.path().join("valence.toml");
        fs::write(&path, "\"S\" = 6\n").unwrap();
        let args = inference_args(&["--valence-rules", path.to_str().unwrap()]);
        let config = PartialAppConfig::default().merge_with_cli(&args).unwrap();
        let rules = config.build_valence_rules().unwrap();
        assert_eq!(
            rules.get(bondscan::core::models::atom::AtomType::new(Element::S, 0)),
            Some(6)
        );
    }
}
