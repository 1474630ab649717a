use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepConfig {
    pub matcher: Matcher,
    pub cleanup: Cleanup,
    pub output: Output,
}

/// What counts as a SQL Server service or product on this host.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Matcher {
    pub service_prefix: String,
    pub product_pattern: String,
    pub stop_timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cleanup {
    /// When set, replaces the environment-derived residual directory list.
    pub residual_dirs: Option<Vec<PathBuf>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Output {
    pub mode: String,
    pub file_path: Option<PathBuf>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        let pd = ProjectDirs::from("io", "SqlSweep", "sqlsweep")
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| "./data".into());
        Self {
            matcher: Matcher {
                service_prefix: "MSSQL".into(),
                product_pattern: "SQL Server".into(),
                stop_timeout_secs: 60,
            },
            cleanup: Cleanup { residual_dirs: None },
            output: Output {
                mode: "stdout".into(),
                file_path: Some(pd.join("logs").join("sqlsweep.jsonl")),
            },
        }
    }
}

pub fn load_config_with_precedence(cli: Option<&PathBuf>) -> Result<SweepConfig> {
    let mut cfg = SweepConfig::default();
    if let Some(p) = cli {
        if p.exists() {
            let s = fs::read_to_string(p)
                .with_context(|| format!("reading config file {}", p.display()))?;
            let f: SweepConfig = toml::from_str(&s).context("parsing config TOML")?;
            cfg = merge_config(&cfg, &f);
        }
    } else if let Ok(env_path) = env::var("SQLSWEEP_CONFIG") {
        let p: PathBuf = env_path.into();
        if p.exists() {
            let s = fs::read_to_string(&p)
                .with_context(|| format!("reading config file {}", p.display()))?;
            let f: SweepConfig = toml::from_str(&s).context("parsing config TOML")?;
            cfg = merge_config(&cfg, &f);
        }
    }
    if let Ok(v) = env::var("SQLSWEEP_SERVICE_PREFIX") {
        if !v.is_empty() {
            cfg.matcher.service_prefix = v;
        }
    }
    if let Ok(v) = env::var("SQLSWEEP_STOP_TIMEOUT_SECS") {
        if let Ok(n) = v.parse::<u64>() {
            cfg.matcher.stop_timeout_secs = n;
        }
    }
    Ok(cfg)
}

pub fn merge_config(a: &SweepConfig, b: &SweepConfig) -> SweepConfig {
    let mut out = a.clone();
    out.matcher = b.matcher.clone();
    out.cleanup = b.cleanup.clone();
    out.output = b.output.clone();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_product_suite() {
        let cfg = SweepConfig::default();
        assert_eq!(cfg.matcher.service_prefix, "MSSQL");
        assert_eq!(cfg.matcher.product_pattern, "SQL Server");
        assert_eq!(cfg.output.mode, "stdout");
        assert!(cfg.cleanup.residual_dirs.is_none());
    }

    #[test]
    fn file_section_wins_over_defaults() {
        let file: SweepConfig = toml::from_str(
            r#"
            [matcher]
            service_prefix = "SQLAgent"
            product_pattern = "SQL Server"
            stop_timeout_secs = 5

            [cleanup]

            [output]
            mode = "stdout"
            "#,
        )
        .unwrap();
        let merged = merge_config(&SweepConfig::default(), &file);
        assert_eq!(merged.matcher.service_prefix, "SQLAgent");
        assert_eq!(merged.matcher.stop_timeout_secs, 5);
    }

    #[test]
    fn missing_explicit_config_file_falls_back_to_defaults() {
        let p = PathBuf::from("definitely-not-a-real-config.toml");
        let cfg = load_config_with_precedence(Some(&p)).unwrap();
        assert_eq!(cfg.matcher.service_prefix, "MSSQL");
    }
}
