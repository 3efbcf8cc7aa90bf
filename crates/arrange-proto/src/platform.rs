use std::path::PathBuf;

/// Default TCP address of the native backend.
pub const BACKEND_TCP_ADDRESS: &str = "127.0.0.1:9877";

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/arrange/ (XDG standard)
    // instead of macOS Application Support for consistency
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("arrange")
    }
    #[cfg(windows)]
    {
        // Portable installs keep their data beside the executable
        if let Some(dir) = beside_exe("data") {
            return dir;
        }

        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("arrange")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(windows)]
    {
        if let Some(dir) = beside_exe("config.toml").and_then(|p| p.parent().map(PathBuf::from)) {
            return dir;
        }
    }

    // On macOS and Linux, always use ~/.config/arrange/
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("arrange")
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("arrange")
    }
}

pub fn log_path() -> PathBuf {
    data_dir().join("arranged.log")
}

#[cfg(windows)]
fn beside_exe(name: &str) -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let candidate = exe.parent()?.join(name);
    candidate.exists().then_some(candidate)
}
