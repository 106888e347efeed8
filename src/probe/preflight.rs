use std::path::{Path, PathBuf};

/// Result of checking that the service-account file is on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight {
    Found(PathBuf),
    /// `absolute` is where the file was looked for, resolved against the working directory.
    Missing { absolute: PathBuf },
}

impl Preflight {
    pub fn is_found(&self) -> bool {
        matches!(self, Preflight::Found(_))
    }
}

/// Checks that `path` exists. Only the filesystem is touched.
pub fn check_service_account(path: &Path) -> Preflight {
    if path.exists() {
        return Preflight::Found(path.to_path_buf());
    }

    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    Preflight::Missing { absolute }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_file_is_found() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(
            check_service_account(file.path()),
            Preflight::Found(file.path().to_path_buf())
        );
    }

    #[test]
    fn test_missing_relative_path_reports_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("credentials").join("serviceAccountKey.json");

        match check_service_account(&missing) {
            Preflight::Missing { absolute } => assert_eq!(absolute, missing),
            found => panic!("expected Missing, got {:?}", found),
        }

        match check_service_account(Path::new("config/serviceAccountKey.json")) {
            Preflight::Missing { absolute } => {
                assert!(absolute.is_absolute());
                assert!(absolute.ends_with("config/serviceAccountKey.json"));
            }
            found => panic!("expected Missing, got {:?}", found),
        }
    }
}
