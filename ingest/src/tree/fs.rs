use crate::tree::ResultsTree;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A results tree on the local filesystem.
///
/// Directories are listed sorted by name, so runs and attempts are imported in a stable order.
#[derive(Debug, Clone)]
pub struct FsTree {
    root: PathBuf,
}

impl FsTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResultsTree for FsTree {
    fn is_dir(&self, path: &Path) -> bool {
        self.root.join(path).is_dir()
    }

    fn list_dirs(&self, path: &Path) -> io::Result<Vec<String>> {
        let dir = self.root.join(path);
        if !std::fs::metadata(&dir)?.is_dir() {
            return Err(io::Error::other(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;

            // Follows symlinks, a linked run or attempt directory still counts
            if !entry.path().is_dir() {
                continue;
            }

            match entry.file_name().to_str() {
                Some(name) => names.push(name.to_string()),
                None => warn!(
                    "Skipping directory with a non UTF-8 name: {}",
                    entry.path().display()
                ),
            }
        }

        Ok(names)
    }

    fn open_file(&self, path: &Path) -> io::Result<Option<Box<dyn BufRead + '_>>> {
        match File::open(self.root.join(path)) {
            Ok(file) => Ok(Some(Box::new(BufReader::new(file)))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
