use crate::config::SweepConfig;
use anyhow::Result;

/// One installed component as the uninstall hive reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub display_name: String,
    pub display_version: Option<String>,
    pub uninstall_string: Option<String>,
}

pub fn name_matches(display_name: &str, pattern: &str) -> bool {
    display_name.to_lowercase().contains(&pattern.to_lowercase())
}

/// Scans both HKLM uninstall roots (native and WOW6432Node) and keeps the
/// entries whose display name matches the configured product pattern. A root
/// that cannot be opened is skipped; it is absent on 32-bit hosts.
#[cfg(target_os = "windows")]
pub fn locate_products(cfg: &SweepConfig) -> Result<Vec<Product>> {
    use winreg::enums::HKEY_LOCAL_MACHINE;
    use winreg::RegKey;

    const UNINSTALL_ROOTS: [&str; 2] = [
        r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
        r"SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall",
    ];

    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    let mut products = Vec::new();
    for root in UNINSTALL_ROOTS {
        if let Ok(key) = hklm.open_subkey(root) {
            collect_matching(&key, &cfg.matcher.product_pattern, &mut products);
        }
    }
    Ok(products)
}

#[cfg(target_os = "windows")]
fn collect_matching(parent: &winreg::RegKey, pattern: &str, out: &mut Vec<Product>) {
    for subkey_name in parent.enum_keys().flatten() {
        if let Ok(subkey) = parent.open_subkey(&subkey_name) {
            if let Ok(name) = subkey.get_value::<String, _>("DisplayName") {
                if !name_matches(&name, pattern) {
                    continue;
                }
                out.push(Product {
                    display_name: name,
                    display_version: subkey.get_value::<String, _>("DisplayVersion").ok(),
                    uninstall_string: subkey.get_value::<String, _>("UninstallString").ok(),
                });
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub fn locate_products(_cfg: &SweepConfig) -> Result<Vec<Product>> {
    anyhow::bail!("the uninstall hive only exists on Windows")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_matches_all_suite_components() {
        for name in [
            "Microsoft SQL Server 2019 (64-bit)",
            "Microsoft SQL Server 2019 Setup (English)",
            "SQL Server Browser",
            "sql server management objects",
        ] {
            assert!(name_matches(name, "SQL Server"), "{name}");
        }
    }

    #[test]
    fn pattern_leaves_unrelated_software_alone() {
        for name in ["Microsoft Visual C++ 2019 Redistributable", "Microsoft ODBC Driver 17", ""] {
            assert!(!name_matches(name, "SQL Server"), "{name}");
        }
    }

    // Plain substring matching, so "MySQL Server" is swept up too. Operators
    // with MySQL on the same host should narrow `matcher.product_pattern`.
    #[test]
    fn pattern_is_a_plain_substring_match() {
        assert!(name_matches("MySQL Server 8.0", "SQL Server"));
    }
}
