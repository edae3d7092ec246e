//! Run and uninstall scripts written next to the install directory.

use std::path::{Path, PathBuf};

use super::error::InstallError;

const UNIX_RUN: &str = "run_tracker.sh";
const UNIX_UNINSTALL: &str = "uninstall_tracker.sh";
const WINDOWS_RUN: &str = "Run_Tracker.bat";
const WINDOWS_UNINSTALL: &str = "Uninstall_Tracker.bat";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFlavor {
    Unix,
    Windows,
}

impl ScriptFlavor {
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) { Self::Windows } else { Self::Unix }
    }

    #[must_use]
    pub const fn run_script_name(self) -> &'static str {
        match self {
            Self::Unix => UNIX_RUN,
            Self::Windows => WINDOWS_RUN,
        }
    }

    #[must_use]
    pub const fn uninstall_script_name(self) -> &'static str {
        match self {
            Self::Unix => UNIX_UNINSTALL,
            Self::Windows => WINDOWS_UNINSTALL,
        }
    }
}

#[must_use]
pub fn render_run_script(flavor: ScriptFlavor, install_dir: &Path, binary: &Path) -> String {
    let dir = install_dir.display();
    let bin = binary.display();

    match flavor {
        ScriptFlavor::Unix => format!(
            r#"#!/bin/sh
echo "Starting Team Tracker..."
cd "{dir}" || exit 1
exec "{bin}" serve
"#
        ),
        ScriptFlavor::Windows => format!(
            "@echo off\r\n\
title Team Tracker\r\n\
echo Starting Team Tracker...\r\n\
cd /d \"{dir}\"\r\n\
\"{bin}\" serve\r\n\
pause\r\n"
        ),
    }
}

#[must_use]
pub fn render_uninstall_script(flavor: ScriptFlavor, install_dir: &Path) -> String {
    let dir = install_dir.display();

    match flavor {
        ScriptFlavor::Unix => format!(
            r#"#!/bin/sh
echo "============================================"
echo "  Team Tracker - Uninstaller"
echo "============================================"
echo
echo "This will completely remove Team Tracker and all its files."
echo
printf "Are you sure you want to uninstall? (y/N): "
read -r confirm
case "$confirm" in
    [Yy]) ;;
    *) echo "Uninstall cancelled."; exit 0 ;;
esac

echo "Stopping Team Tracker..."
pkill -f "team-tracker serve" 2>/dev/null
sleep 2

echo "Removing installation directory..."
if [ -d "{dir}" ]; then
    rm -rf "{dir}"
    if [ -d "{dir}" ]; then
        echo "Warning: some files could not be deleted. Check permissions and try again."
        exit 1
    fi
    echo "Installation directory removed."
else
    echo "Installation directory not found."
fi

rm -f "$(dirname "$0")/{UNIX_RUN}"

echo "Team Tracker has been removed from your system."
rm -f "$0"
"#
        ),
        ScriptFlavor::Windows => format!(
            "@echo off\r\n\
title Team Tracker - Uninstaller\r\n\
echo ============================================\r\n\
echo   Team Tracker - Uninstaller\r\n\
echo ============================================\r\n\
echo.\r\n\
echo This will completely remove Team Tracker and all its files.\r\n\
set /p confirm=\"Are you sure you want to uninstall? (Y/N): \"\r\n\
if /i \"%confirm%\" NEQ \"Y\" (\r\n\
    echo Uninstall cancelled.\r\n\
    pause\r\n\
    exit /b\r\n\
)\r\n\
echo Stopping Team Tracker...\r\n\
taskkill /f /im team-tracker.exe 2>nul\r\n\
timeout /t 2 /nobreak >nul\r\n\
echo Removing installation directory...\r\n\
if exist \"{dir}\" rmdir /s /q \"{dir}\"\r\n\
if exist \"%~dp0{WINDOWS_RUN}\" del \"%~dp0{WINDOWS_RUN}\"\r\n\
echo Team Tracker has been removed from your system.\r\n\
(goto) 2>nul & del \"%~f0\"\r\n"
        ),
    }
}

/// Writes both scripts into the parent of `install_dir` and returns their paths.
pub async fn write_scripts(
    flavor: ScriptFlavor,
    install_dir: &Path,
    binary: &Path,
) -> Result<Vec<PathBuf>, InstallError> {
    let parent = install_dir.parent().ok_or_else(|| {
        InstallError::Shortcut(format!(
            "{} has no parent directory",
            install_dir.display()
        ))
    })?;

    let scripts = [
        (
            parent.join(flavor.run_script_name()),
            render_run_script(flavor, install_dir, binary),
        ),
        (
            parent.join(flavor.uninstall_script_name()),
            render_uninstall_script(flavor, install_dir),
        ),
    ];

    let mut written = Vec::with_capacity(scripts.len());
    for (path, body) in scripts {
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| InstallError::Shortcut(format!("{}: {e}", path.display())))?;
        make_executable(&path).await?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| InstallError::Shortcut(format!("{}: {e}", path.display())))
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<(), InstallError> {
    Ok(())
}
