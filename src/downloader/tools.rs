use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const YTDLP_BINARY: &str = "yt-dlp";

/// Finds the extraction tool: explicit override, then PATH, then a short list
/// of well-known install locations
#[derive(Debug, Clone, Default)]
pub struct ToolLocator {
    binary_override: Option<PathBuf>,
    search_path: Option<OsString>,
}

impl ToolLocator {
    pub fn new(binary_override: Option<PathBuf>) -> Self {
        Self {
            binary_override,
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Replace the PATH value searched (tests)
    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn locate_ytdlp(&self) -> Option<PathBuf> {
        // An explicit override is authoritative, even when it doesn't exist
        if let Some(path) = &self.binary_override {
            return path.is_file().then(|| path.clone());
        }

        if let Some(found) = self.search_in_path(YTDLP_BINARY) {
            return Some(found);
        }

        Self::well_known_locations()
            .into_iter()
            .find(|candidate| candidate.is_file())
    }

    fn search_in_path(&self, binary_name: &str) -> Option<PathBuf> {
        let search_path = self.search_path.as_ref()?;

        std::env::split_paths(search_path)
            .filter(|dir| !dir.as_os_str().is_empty())
            .flat_map(|dir| Self::binary_names(binary_name).map(move |name| dir.join(name)))
            .find(|candidate| is_executable(candidate))
    }

    fn binary_names(binary_name: &str) -> impl Iterator<Item = String> {
        let exe = cfg!(windows).then(|| format!("{}.exe", binary_name));
        std::iter::once(binary_name.to_string()).chain(exe)
    }

    fn well_known_locations() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if cfg!(windows) {
            if let Some(local) = dirs::data_local_dir() {
                paths.push(local.join("yt-dlp").join("yt-dlp.exe"));
            }
            if let Some(roaming) = dirs::data_dir() {
                paths.push(roaming.join("yt-dlp").join("yt-dlp.exe"));
            }
            paths.push(PathBuf::from(r"C:\yt-dlp\yt-dlp.exe"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".local").join("bin").join(YTDLP_BINARY));
        }

        paths.extend(
            [
                "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
                "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac
                "/usr/bin/yt-dlp",          // System installation
            ]
            .into_iter()
            .map(PathBuf::from),
        );

        paths
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
