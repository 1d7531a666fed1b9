use std::path::{self, Path, PathBuf};

/// One test executable and the directory it runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub executable: PathBuf,
    pub working_dir: PathBuf,
}

impl Target {
    /// Target running in the directory that contains the executable.
    ///
    /// Paths are made absolute against the current directory. A path that
    /// cannot be resolved is kept as given, launching it will then fail and
    /// be reported like any other launch failure.
    pub fn new(executable: impl AsRef<Path>) -> Self {
        let executable = absolute(executable.as_ref());
        let working_dir = executable
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| executable.clone());
        Self {
            executable,
            working_dir,
        }
    }

    pub fn with_working_dir(self, working_dir: impl AsRef<Path>) -> Self {
        Self {
            working_dir: absolute(working_dir.as_ref()),
            ..self
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
