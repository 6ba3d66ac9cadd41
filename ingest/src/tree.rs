mod fs;
mod memory;

use std::io::{self, BufRead};
use std::path::Path;

pub use fs::FsTree;
pub use memory::MemoryTree;

/// Read-only access to a results tree.
///
/// Every path is relative to the tree root. The import stages only ever go through this trait,
/// so they can be run against a [MemoryTree] as well as the real filesystem.
pub trait ResultsTree {
    /// Whether `path` exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Names of the immediate subdirectories of `path`, in iteration order.
    ///
    /// Other entries are left out. Fails if `path` is not a readable directory.
    fn list_dirs(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Open the file at `path`, or `Ok(None)` if there is no such file.
    fn open_file(&self, path: &Path) -> io::Result<Option<Box<dyn BufRead + '_>>>;
}
