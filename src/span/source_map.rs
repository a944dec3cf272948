use std::{
    collections::{hash_map::Entry, HashMap},
    fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};

/// Identifies a file stored in a [`SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FileId(usize);

pub(crate) struct SourceFile {
    /// The name used in diagnostics and by `__FILE__`.
    pub(crate) name: String,
    /// The canonical path of the file, if it was read from disk.
    pub(crate) path: Option<PathBuf>,
    pub(crate) bytes: Rc<[u8]>,
}

/// Keeps track of all the source code being preprocessed. This not only includes files and text
/// provided by the user but also any source files included when processing `#include` directives.
#[derive(Default)]
pub(crate) struct SourceMap {
    files: Vec<SourceFile>,
    paths: HashMap<PathBuf, FileId>,
}

impl SourceMap {
    pub(crate) fn get(&self, id: FileId) -> &SourceFile {
        &self.files[id.0]
    }

    /// Read a file, store its contents in the [`SourceMap`] and return its [`FileId`].
    ///
    /// If the canonical path of the file has already been seen by this method, the file is not
    /// read again.
    pub(crate) fn read_file(&mut self, path: &Path) -> io::Result<FileId> {
        match self.paths.entry(fs::canonicalize(path)?) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let bytes = fs::read(entry.key())?;
                let id = FileId(self.files.len());
                self.files.push(SourceFile {
                    name: path.display().to_string(),
                    path: Some(entry.key().clone()),
                    bytes: bytes.into(),
                });
                entry.insert(id);
                Ok(id)
            }
        }
    }

    /// Store a sequence of bytes in the [`SourceMap`] and return its [`FileId`].
    ///
    /// The stored bytes are not associated to any file path.
    pub(crate) fn store_bytes(&mut self, name: &str, bytes: &[u8]) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile {
            name: name.to_string(),
            path: None,
            bytes: bytes.into(),
        });
        id
    }
}
