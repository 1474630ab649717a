use crate::registry::Product;
use regex::Regex;
use tracing::{error, info, warn};

/// Silent flags for SQL Server's own setup.exe: quiet, no reboot, drop shared
/// features, and skip the reboot-pending setup rule that would otherwise veto
/// an unattended removal.
pub const SETUP_SILENT_FLAGS: &str =
    " /QUIET /NORESTART /REMOVEALLSHAREDFEATURES /SKIPRULES=REBOOTREQUIREDCHECK";

/// Outcome of rewriting a registered uninstall string into silent form. The
/// rules are tried in order and the first match wins; `Unchanged` is the
/// explicit fallback for shapes the rewriter does not understand, which then
/// run exactly as registered (and may not actually be silent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// An `msiexec /I{code}` install invocation turned into uninstall-by-code.
    MsiProductCode(String),
    /// A `setup.exe` invocation with the silent suffix appended.
    SetupFlags(String),
    /// Neither shape matched; passed through verbatim.
    Unchanged(String),
}

impl Normalized {
    pub fn command(&self) -> &str {
        match self {
            Normalized::MsiProductCode(c) | Normalized::SetupFlags(c) | Normalized::Unchanged(c) => {
                c
            }
        }
    }
}

pub fn normalize(raw: &str) -> Normalized {
    // The product-code class stays limited to hex digits and hyphens; codes
    // outside it fall through to the verbatim variant.
    let msi_install = Regex::new(r"(?i)^(?P<exe>.*msiexec(?:\.exe)?)\s*/i\{(?P<code>[0-9A-F-]+)\}")
        .unwrap();
    if let Some(caps) = msi_install.captures(raw) {
        return Normalized::MsiProductCode(format!(
            "{} /x{{{}}} /quiet /norestart",
            &caps["exe"], &caps["code"]
        ));
    }
    let lowered = raw.to_lowercase();
    if lowered.contains("setup.exe") && !lowered.contains("/quiet") {
        return Normalized::SetupFlags(format!("{raw}{SETUP_SILENT_FLAGS}"));
    }
    Normalized::Unchanged(raw.to_string())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Summary {
    pub attempted: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Runs every product's uninstaller in inventory order, blocking on each.
/// A missing uninstall string, a spawn failure, or a failing child is logged
/// against that product and the loop moves on; one bad uninstaller must not
/// stop the rest from being attempted.
pub fn remove_all(products: &[Product]) -> Summary {
    let mut summary = Summary::default();
    for product in products {
        let raw = match product.uninstall_string.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => {
                warn!(product = %product.display_name, "no uninstall string registered, skipping");
                summary.skipped += 1;
                continue;
            }
        };
        let normalized = normalize(raw);
        info!(product = %product.display_name, command = %normalized.command(), "uninstalling");
        summary.attempted += 1;
        match run_via_interpreter(normalized.command()) {
            Ok(status) if status.success() => {
                info!(product = %product.display_name, "uninstall finished");
            }
            Ok(status) => {
                error!(
                    product = %product.display_name,
                    code = ?status.code(),
                    "uninstaller exited with failure"
                );
                summary.failed += 1;
            }
            Err(e) => {
                error!(product = %product.display_name, error = %e, "could not launch uninstaller");
                summary.failed += 1;
            }
        }
    }
    summary
}

/// `cmd /C` parses the registered command line the same way the Programs and
/// Features applet would. The sweep already runs elevated, so the child
/// inherits the elevated token.
#[cfg(target_os = "windows")]
fn run_via_interpreter(command: &str) -> std::io::Result<std::process::ExitStatus> {
    use std::os::windows::process::CommandExt;
    std::process::Command::new("cmd")
        .arg("/C")
        .raw_arg(command)
        .status()
}

#[cfg(not(target_os = "windows"))]
fn run_via_interpreter(_command: &str) -> std::io::Result<std::process::ExitStatus> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "uninstallers can only be launched on Windows",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn product(name: &str, uninstall_string: Option<&str>) -> Product {
        Product {
            display_name: name.into(),
            display_version: None,
            uninstall_string: uninstall_string.map(Into::into),
        }
    }

    #[test]
    fn msi_install_invocation_becomes_silent_uninstall() {
        let n = normalize("msiexec.exe /I{ABCD1234-0000-0000-0000-000000000001}");
        assert_eq!(
            n,
            Normalized::MsiProductCode(
                "msiexec.exe /x{ABCD1234-0000-0000-0000-000000000001} /quiet /norestart".into()
            )
        );
    }

    #[test]
    fn msi_rewrite_discards_trailing_arguments() {
        let n = normalize("msiexec.exe /I{ABCD1234-0000-0000-0000-000000000001} /L*v install.log");
        assert_eq!(
            n.command(),
            "msiexec.exe /x{ABCD1234-0000-0000-0000-000000000001} /quiet /norestart"
        );
    }

    #[test]
    fn msi_rewrite_keeps_the_registered_installer_token() {
        let n = normalize(r"C:\Windows\system32\MsiExec.exe /I{0000AAAA-1111-2222-3333-444455556666}");
        assert_eq!(
            n.command(),
            r"C:\Windows\system32\MsiExec.exe /x{0000AAAA-1111-2222-3333-444455556666} /quiet /norestart"
        );
    }

    #[test]
    fn setup_invocation_gets_the_silent_suffix_once() {
        let raw = r#""C:\Program Files\Microsoft SQL Server\150\Setup Bootstrap\setup.exe" /Action=Uninstall"#;
        let n = normalize(raw);
        assert_eq!(n, Normalized::SetupFlags(format!("{raw}{SETUP_SILENT_FLAGS}")));
    }

    #[test]
    fn already_quiet_setup_invocation_is_left_alone() {
        let raw = r"setup.exe /Action=Uninstall /QUIET";
        assert_eq!(normalize(raw), Normalized::Unchanged(raw.into()));
    }

    #[test]
    fn unknown_shapes_pass_through_verbatim() {
        let raw = r#""C:\Program Files\Widget\uninstall.exe" --purge"#;
        assert_eq!(normalize(raw), Normalized::Unchanged(raw.into()));
    }

    #[test]
    fn non_hex_product_code_falls_through_unchanged() {
        let raw = "msiexec.exe /I{NOT-A-REAL-GUID-ZZZZ}";
        assert_eq!(normalize(raw), Normalized::Unchanged(raw.into()));
    }

    #[test]
    fn products_without_uninstall_strings_are_skipped() {
        let products = [product("SQL Server Orphan", None), product("SQL Server Blank", Some("  "))];
        let summary = remove_all(&products);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.attempted, 0);
    }

    // run_via_interpreter is unsupported off-Windows, so every attempt fails;
    // what matters is that the loop still reaches every product.
    #[cfg(not(target_os = "windows"))]
    #[test]
    fn one_failing_uninstall_does_not_stop_the_rest() {
        let products = [
            product("SQL Server A", Some("msiexec.exe /I{ABCD1234-0000-0000-0000-000000000001}")),
            product("SQL Server B", Some("setup.exe /Action=Uninstall")),
        ];
        let summary = remove_all(&products);
        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.failed, 2);
    }

    proptest! {
        #[test]
        fn any_hex_product_code_is_rewritten(code in "[0-9A-Fa-f]{8}(-[0-9A-Fa-f]{4}){3}-[0-9A-Fa-f]{12}") {
            let n = normalize(&format!("msiexec.exe /I{{{code}}}"));
            prop_assert_eq!(
                n.command(),
                format!("msiexec.exe /x{{{code}}} /quiet /norestart")
            );
        }
    }
}
