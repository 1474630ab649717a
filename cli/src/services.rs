use crate::config::SweepConfig;
use anyhow::Result;

/// Case-insensitive service-name prefix match, safe on any byte length.
pub fn name_has_prefix(name: &str, prefix: &str) -> bool {
    name.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Stops every service whose name starts with the configured prefix. Returns
/// how many stops were confirmed; per-service failures are warnings and the
/// loop moves on.
#[cfg(target_os = "windows")]
pub fn stop_matching(cfg: &SweepConfig) -> Result<usize> {
    use anyhow::Context;
    use std::thread;
    use std::time::{Duration, Instant};
    use tracing::{debug, info, warn};
    use windows_service::service::{ServiceAccess, ServiceState};
    use windows_service::service_manager::{ServiceManager, ServiceManagerAccess};
    use winreg::enums::HKEY_LOCAL_MACHINE;
    use winreg::RegKey;

    // windows-service has no EnumServicesStatusExW wrapper; the SCM's own
    // registry key lists every registered service by name.
    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    let services_key = hklm
        .open_subkey(r"SYSTEM\CurrentControlSet\Services")
        .context("opening the service list registry key")?;
    let names: Vec<String> = services_key
        .enum_keys()
        .flatten()
        .filter(|n| name_has_prefix(n, &cfg.matcher.service_prefix))
        .collect();
    if names.is_empty() {
        info!(prefix = %cfg.matcher.service_prefix, "no matching services registered");
        return Ok(0);
    }

    let mgr = ServiceManager::local_computer(None::<&str>, ServiceManagerAccess::CONNECT)
        .context("connecting to the service manager")?;
    let mut stopped = 0usize;
    for name in names {
        let svc = match mgr.open_service(&name, ServiceAccess::QUERY_STATUS | ServiceAccess::STOP) {
            Ok(s) => s,
            Err(e) => {
                // drivers and stale entries also live under the Services key
                debug!(service = %name, error = %e, "not an openable service, skipping");
                continue;
            }
        };
        let status = match svc.query_status() {
            Ok(s) => s,
            Err(e) => {
                warn!(service = %name, error = %e, "could not query service status");
                continue;
            }
        };
        if status.current_state == ServiceState::Stopped {
            debug!(service = %name, "already stopped");
            continue;
        }
        info!(service = %name, "stopping service");
        if let Err(e) = svc.stop() {
            warn!(service = %name, error = %e, "stop request failed");
            continue;
        }
        let deadline = Instant::now() + Duration::from_secs(cfg.matcher.stop_timeout_secs);
        loop {
            match svc.query_status() {
                Ok(s) if s.current_state == ServiceState::Stopped => {
                    info!(service = %name, "service stopped");
                    stopped += 1;
                    break;
                }
                Ok(_) if Instant::now() >= deadline => {
                    warn!(
                        service = %name,
                        timeout_secs = cfg.matcher.stop_timeout_secs,
                        "service did not stop in time"
                    );
                    break;
                }
                Ok(_) => thread::sleep(Duration::from_millis(500)),
                Err(e) => {
                    warn!(service = %name, error = %e, "lost track of service while stopping");
                    break;
                }
            }
        }
    }
    Ok(stopped)
}

#[cfg(not(target_os = "windows"))]
pub fn stop_matching(_cfg: &SweepConfig) -> Result<usize> {
    anyhow::bail!("service control is Windows-only")
}
