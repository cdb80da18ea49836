use anyhow::Context;
use ng_domain::config::{Config, ConfigError, ConfigSeverity};

/// Validation result of one config file, errors listed before warnings.
pub struct Report {
    issues: Vec<ConfigError>,
}

impl Report {
    pub fn of(config: &Config) -> Self {
        let mut issues = config.validate();
        issues.sort_by_key(|i| i.severity != ConfigSeverity::Error);
        Self { issues }
    }

    pub fn errors(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConfigSeverity::Error)
            .count()
    }

    pub fn warnings(&self) -> usize {
        self.issues.len() - self.errors()
    }

    pub fn is_ok(&self) -> bool {
        self.errors() == 0
    }
}

/// `nodegate config validate`. Prints every issue and returns `false` when
/// any of them is an error.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let report = Report::of(config);
    if report.issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }
    for issue in &report.issues {
        println!("{issue}");
    }
    println!(
        "\n{} error(s), {} warning(s) in {config_path}",
        report.errors(),
        report.warnings()
    );
    report.is_ok()
}

/// `nodegate config show`: the effective config, defaults filled in.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let output = toml::to_string_pretty(config).context("serializing config")?;
    print!("{output}");
    Ok(())
}
