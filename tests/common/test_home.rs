use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};

/// Creates a test home directory under target/home with a random 8-character name
/// Returns the path to the created directory
/// The directory will be automatically cleaned up when the returned guard is dropped
pub struct TestHomeGuard {
    path: PathBuf,
}

impl TestHomeGuard {
    pub fn new() -> Self {
        // Generate random 8-character string with letters and numbers
        let random_name: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();

        // Create directory under target/home
        let path = PathBuf::from("target/home").join(random_name);
        fs::create_dir_all(&path).expect("Failed to create test home directory");

        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remote_lock_home(&self) -> PathBuf {
        self.path.join(".remote-lock")
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.remote_lock_home().join("locks")
    }

    pub fn write_config(&self, contents: &str) -> &Self {
        let home = self.remote_lock_home();
        fs::create_dir_all(&home).expect("Failed to create .remote-lock directory");
        fs::write(home.join("config.toml"), contents).expect("Failed to write config.toml");
        self
    }
}

impl Drop for TestHomeGuard {
    fn drop(&mut self) {
        if self.path.exists() {
            fs::remove_dir_all(&self.path).unwrap_or_else(|e| {
                eprintln!(
                    "Failed to cleanup test directory {}: {}",
                    self.path.display(),
                    e
                );
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_and_cleans_up_directory() {
        let test_path = {
            let guard = TestHomeGuard::new();
            let path = guard.path().to_path_buf();
            assert!(path.exists());
            assert!(path.starts_with("target/home"));
            path
        };
        // After guard is dropped, directory should be cleaned up
        assert!(!test_path.exists());
    }

    #[test]
    fn test_write_config() {
        let guard = TestHomeGuard::new();
        guard.write_config("prefix = \"t\"\n");
        assert!(guard.remote_lock_home().join("config.toml").exists());
    }
}
