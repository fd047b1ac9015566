use std::{
    fs::create_dir_all,
    io::{self, ErrorKind},
    path::PathBuf,
};

use xdg::BaseDirectories;

/// Returns the path to the Urban Eye configuration directory. If it doesn't exist when this
/// function is called, it will be created.
pub fn config_dir() -> io::Result<PathBuf> {
    ensure(xdg_prefix().get_config_home())
}

/// Returns the path to the Urban Eye data directory. Blob buckets live here by default. If it
/// doesn't exist when this function is called, it will be created.
pub fn data_dir() -> io::Result<PathBuf> {
    ensure(xdg_prefix().get_data_home())
}

/// Returns the path to the Urban Eye state directory, which holds the database. If it doesn't
/// exist when this function is called, it will be created.
pub fn state_dir() -> io::Result<PathBuf> {
    ensure(xdg_prefix().get_state_home())
}

fn ensure(path: Option<PathBuf>) -> io::Result<PathBuf> {
    let path = path.ok_or_else(|| io::Error::new(ErrorKind::NotFound, "$HOME is not set"))?;

    create_dir_all(&path)?;

    Ok(path)
}

fn xdg_prefix() -> BaseDirectories {
    xdg::BaseDirectories::with_prefix("urbaneye")
}

#[cfg(test)]
mod test {
    use std::io::ErrorKind;

    use tempfile::tempdir;

    use super::ensure;

    #[test]
    fn test_missing_home_is_an_error() {
        let err = ensure(None).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_creates_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b");

        assert_eq!(ensure(Some(path.clone())).unwrap(), path);
        assert!(path.is_dir());
    }
}
