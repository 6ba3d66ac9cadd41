use crate::tree::ResultsTree;
use std::collections::BTreeMap;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

/// A results tree held in memory, for exercising the import stages without touching disk.
///
/// Children are listed in name order. Adding an entry creates any missing parent directories.
///
/// ```rust
/// use verdict_ingest::tree::{MemoryTree, ResultsTree};
/// use std::path::Path;
///
/// let tree = MemoryTree::new()
///     .with_dir("Results/Run_20230303_084230899/T1/1")
///     .with_file("Results/Run_20230303_084230899/T1/1/T1.script.log", "validate = { PASS:1, FAIL:0 }");
///
/// assert_eq!(tree.list_dirs(Path::new("Results")).unwrap(), vec!["Run_20230303_084230899"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    entries: BTreeMap<PathBuf, Node>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.add_parents(path);
        self.entries.insert(path.to_path_buf(), Node::Dir);
        self
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        let path = path.as_ref();
        self.add_parents(path);
        self.entries
            .insert(path.to_path_buf(), Node::File(contents.into()));
        self
    }

    fn add_parents(&mut self, path: &Path) {
        for parent in path.ancestors().skip(1) {
            if parent.as_os_str().is_empty() {
                break;
            }
            self.entries.insert(parent.to_path_buf(), Node::Dir);
        }
    }
}

impl ResultsTree for MemoryTree {
    fn is_dir(&self, path: &Path) -> bool {
        path.as_os_str().is_empty() || matches!(self.entries.get(path), Some(Node::Dir))
    }

    fn list_dirs(&self, path: &Path) -> io::Result<Vec<String>> {
        if !self.is_dir(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("No such directory: {}", path.display()),
            ));
        }

        Ok(self
            .entries
            .iter()
            .filter(|(entry, node)| matches!(node, Node::Dir) && entry.parent() == Some(path))
            .filter_map(|(entry, _)| entry.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect())
    }

    fn open_file(&self, path: &Path) -> io::Result<Option<Box<dyn BufRead + '_>>> {
        match self.entries.get(path) {
            Some(Node::File(contents)) => Ok(Some(Box::new(io::Cursor::new(contents.as_slice())))),
            Some(Node::Dir) => Err(io::Error::other(format!(
                "{} is a directory",
                path.display()
            ))),
            None => Ok(None),
        }
    }
}
