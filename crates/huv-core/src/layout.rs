use std::fs;
use std::path::{Path, PathBuf};

/// On-disk layout of a single virtual environment. Identity is the resolved
/// root path; all other locations derive from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenvLayout {
    root: PathBuf,
}

impl VenvLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("Scripts")
        } else {
            self.root.join("bin")
        }
    }

    pub fn python_path(&self) -> PathBuf {
        if cfg!(windows) {
            self.bin_dir().join("python.exe")
        } else {
            self.bin_dir().join("python")
        }
    }

    pub fn activate_path(&self) -> PathBuf {
        self.bin_dir().join("activate")
    }

    pub fn activate_bat_path(&self) -> PathBuf {
        self.bin_dir().join("activate.bat")
    }

    pub fn activate_this_path(&self) -> PathBuf {
        self.bin_dir().join("activate_this.py")
    }

    pub fn pyvenv_cfg_path(&self) -> PathBuf {
        self.root.join("pyvenv.cfg")
    }

    /// A directory counts as a virtual environment iff it carries a pyvenv.cfg.
    pub fn is_valid(&self) -> bool {
        self.pyvenv_cfg_path().is_file()
    }

    /// Existing site-packages directories of this environment, sorted.
    /// Covers both the POSIX `lib/pythonX.Y/site-packages` shape and the
    /// Windows `Lib/site-packages` shape.
    pub fn site_packages_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();

        let lib_dir = self.root.join("lib");
        if let Ok(entries) = fs::read_dir(&lib_dir) {
            for entry in entries.flatten() {
                let file_name = entry.file_name();
                let Some(name) = file_name.to_str() else {
                    continue;
                };
                if !name.starts_with("python") {
                    continue;
                }
                let candidate = entry.path().join("site-packages");
                if candidate.is_dir() {
                    dirs.push(candidate);
                }
            }
        }

        let windows_candidate = self.root.join("Lib").join("site-packages");
        if windows_candidate.is_dir() {
            dirs.push(windows_candidate);
        }

        dirs.sort();
        dirs
    }
}
