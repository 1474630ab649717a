use anyhow::Result;

/// Whether the current process token is elevated. Every later stage (service
/// control, HKLM reads, uninstaller launches, deletes under Program Files)
/// assumes administrator rights, so callers abort the run on `false`.
#[cfg(target_os = "windows")]
pub fn process_is_elevated() -> Result<bool> {
    use anyhow::Context;
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{
        GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY,
    };
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    unsafe {
        let mut token = HANDLE::default();
        OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token)
            .context("opening the process token")?;
        let mut elevation = TOKEN_ELEVATION::default();
        let mut returned = 0u32;
        let queried = GetTokenInformation(
            token,
            TokenElevation,
            Some(&mut elevation as *mut TOKEN_ELEVATION as *mut core::ffi::c_void),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned,
        );
        let _ = CloseHandle(token);
        queried.context("querying token elevation")?;
        Ok(elevation.TokenIsElevated != 0)
    }
}

#[cfg(not(target_os = "windows"))]
pub fn process_is_elevated() -> Result<bool> {
    anyhow::bail!("removing SQL Server is Windows-only")
}
