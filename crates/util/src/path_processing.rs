use std::path::{Path, PathBuf};

use dirs_next::home_dir;

pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    if trimmed == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(trimmed)
}

/// Name components of a file reference as exposed to expressions.
///
/// `nameroot` and `nameext` split the basename at its last dot; a leading dot
/// (hidden files) is not treated as an extension separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameParts {
    /// Absolute form of the reference, without touching the filesystem.
    pub path: String,
    pub basename: String,
    pub dirname: String,
    pub nameroot: String,
    pub nameext: String,
}

impl FileNameParts {
    pub fn from_reference(reference: &str) -> Self {
        let reference_path = Path::new(reference);
        let absolute = std::path::absolute(reference_path).unwrap_or_else(|_| reference_path.to_path_buf());

        let basename = reference_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| reference.to_string());
        let dirname = match reference_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
            Some(_) => ".".to_string(),
            None => reference.to_string(),
        };
        let nameext = reference_path
            .extension()
            .map(|extension| extension.to_string_lossy())
            .filter(|extension| !extension.is_empty())
            .map(|extension| format!(".{extension}"))
            .unwrap_or_default();
        let nameroot = basename.strip_suffix(nameext.as_str()).unwrap_or(&basename).to_string();

        Self {
            path: absolute.to_string_lossy().into_owned(),
            basename,
            dirname,
            nameroot,
            nameext,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposes_relative_reference() {
        let parts = FileNameParts::from_reference("data/reads.fastq");
        assert_eq!(parts.basename, "reads.fastq");
        assert_eq!(parts.dirname, "data");
        assert_eq!(parts.nameroot, "reads");
        assert_eq!(parts.nameext, ".fastq");
        assert!(Path::new(&parts.path).is_absolute());
        assert!(parts.path.ends_with("data/reads.fastq"));
    }

    #[test]
    fn bare_name_has_current_directory() {
        let parts = FileNameParts::from_reference("notes.txt");
        assert_eq!(parts.dirname, ".");
        assert_eq!(parts.basename, "notes.txt");
    }

    #[test]
    fn only_last_extension_is_split() {
        let parts = FileNameParts::from_reference("/srv/archive.tar.gz");
        assert_eq!(parts.path, "/srv/archive.tar.gz");
        assert_eq!(parts.dirname, "/srv");
        assert_eq!(parts.nameroot, "archive.tar");
        assert_eq!(parts.nameext, ".gz");
    }

    #[test]
    fn hidden_files_have_no_extension() {
        let parts = FileNameParts::from_reference(".bashrc");
        assert_eq!(parts.nameroot, ".bashrc");
        assert_eq!(parts.nameext, "");
    }

    #[test]
    fn expands_home_prefix() {
        let home = tempfile::tempdir().expect("tempdir");
        temp_env::with_var("HOME", Some(home.path()), || {
            assert_eq!(expand_tilde("~/jobs/params.yml"), home.path().join("jobs/params.yml"));
            assert_eq!(expand_tilde(" /abs/path "), PathBuf::from("/abs/path"));
        });
    }
}
