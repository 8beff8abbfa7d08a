//! # Virtual Filesystem
//!
//! An in-memory stand-in for the filesystem, for hosts with no disk access
//! (WASM in the browser). The PDF renderer reads fonts and data tables
//! through it by filename.
//!
//! Lookups are layered:
//! 1. the bound base table (base64 content, usually the bundled fonts),
//! 2. the built-in `data.trie` resource,
//! 3. files written at runtime, returned verbatim.
//!
//! Filenames are normalized first: the configured base directory prefix and
//! one leading `/` are stripped.

use std::collections::HashMap;

use crate::error::{HtmlDefError, Result};

/// Name of the built-in resource served when nothing else is bound under it.
pub const BUILTIN_RESOURCE_NAME: &str = "data.trie";

/// Base64 of the built-in `data.trie` resource.
const BUILTIN_RESOURCE: &str = "AAEQAAAAAAAAADGgAZUBav7t2CtPA0EUBeDZB00pin9AJZIEgyUEj0QhweDAgQOJxCBRBElQSBwSicLgkOAwnNKZ5GaY2c7uzj4o5yZfZrrbefbuIx2nSq3CGmzAWH/+K+UO7MIe7MMhHMMpnMMFXMIVXIt2t3CnP088iPqjqNN8e4Ij7Rle4LUH82rLm6i/92A+RERERERERERNmfz/89GDeRARERERzbN8ceps2Iwt9H0C9/AJ6yOlDkbTczcot5VSm8Pm1vcFWfb7+BKOLTuOd2UlTX4wGP85Eg953lWPFbnuN7PkjtLmalOWbNenkHOSa7T3KmR9MVTZ2zZkVj1kHa68MueVKH0R4zqQ44WEXLM8VjcWHP0PtKLfPzQnMtGn3W4QYf6qxFxceVI394r2xnV+1rih0fV1Vzf3fO1n3evL5J78ruvZ5ptX2Rwy92Tfb1wlEqut3U+sZ3HXOeJ7/zDrbyuP6+Zz0fqa6Nv3vhY7Yu1xWnGevmsvsUpTT/RYIe8waUH/rvHMWKFzLfN8L+rTfp645mfX7ftlnfDtYxN59w0=";

/// Key-value file store with a bound fallback table.
#[derive(Debug, Clone, Default)]
pub struct VirtualFileSystem {
    base_dir: String,
    files: HashMap<String, Vec<u8>>,
    base: HashMap<String, String>,
}

impl VirtualFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// A filesystem that strips `base_dir` from the front of every filename.
    pub fn with_base_dir(base_dir: impl Into<String>) -> Self {
        VirtualFileSystem {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    /// Read a file. `Ok(None)` when nothing is stored under the name.
    pub fn read_file(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        let name = self.normalize(filename);

        let encoded = match self.base.get(name) {
            Some(content) if !content.is_empty() => Some(content.as_str()),
            _ if name == BUILTIN_RESOURCE_NAME => {
                log::debug!("serving built-in resource '{}'", name);
                Some(BUILTIN_RESOURCE)
            }
            _ => None,
        };
        if let Some(encoded) = encoded {
            return base64_decode(encoded)
                .map(Some)
                .map_err(|reason| HtmlDefError::Asset {
                    name: name.to_string(),
                    reason,
                });
        }

        Ok(self.files.get(name).cloned())
    }

    /// Store `content` under `filename`, replacing any previous content.
    pub fn write_file(&mut self, filename: &str, content: impl Into<Vec<u8>>) {
        let name = self.normalize(filename).to_string();
        self.files.insert(name, content.into());
    }

    /// Install the base table, replacing any previously bound one. Values are
    /// base64-encoded file contents.
    pub fn bind_fs(&mut self, base: HashMap<String, String>) {
        self.base = base;
    }

    fn normalize<'a>(&self, filename: &'a str) -> &'a str {
        let name = filename.strip_prefix(self.base_dir.as_str()).unwrap_or(filename);
        name.strip_prefix('/').unwrap_or(name)
    }
}

fn base64_decode(input: &str) -> std::result::Result<Vec<u8>, String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input)
        .map_err(|e| format!("Base64 decode error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let mut fs = VirtualFileSystem::new();
        fs.write_file("out.pdf", b"%PDF".to_vec());
        assert_eq!(fs.read_file("out.pdf").unwrap(), Some(b"%PDF".to_vec()));
        assert_eq!(fs.read_file("missing").unwrap(), None);
    }

    #[test]
    fn test_leading_slash_is_stripped() {
        let mut fs = VirtualFileSystem::new();
        fs.write_file("/fonts/a.ttf", vec![1, 2, 3]);
        assert_eq!(fs.read_file("fonts/a.ttf").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(fs.read_file("/fonts/a.ttf").unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_base_dir_is_stripped() {
        let mut fs = VirtualFileSystem::with_base_dir("/app/build");
        fs.write_file("/app/build/fonts/a.ttf", vec![9]);
        assert_eq!(fs.read_file("fonts/a.ttf").unwrap(), Some(vec![9]));
        assert_eq!(fs.read_file("/fonts/a.ttf").unwrap(), Some(vec![9]));
    }

    #[test]
    fn test_bound_table_is_decoded_and_wins() {
        let mut fs = VirtualFileSystem::new();
        fs.write_file("Roboto.ttf", b"written".to_vec());
        let mut base = HashMap::new();
        base.insert("Roboto.ttf".to_string(), "Zm9udA==".to_string());
        fs.bind_fs(base);
        assert_eq!(fs.read_file("/Roboto.ttf").unwrap(), Some(b"font".to_vec()));
    }

    #[test]
    fn test_bind_replaces_previous_table() {
        let mut fs = VirtualFileSystem::new();
        let mut first = HashMap::new();
        first.insert("a".to_string(), "YQ==".to_string());
        fs.bind_fs(first);
        fs.bind_fs(HashMap::new());
        assert_eq!(fs.read_file("a").unwrap(), None);
    }

    #[test]
    fn test_builtin_resource() {
        let fs = VirtualFileSystem::new();
        let data = fs.read_file(BUILTIN_RESOURCE_NAME).unwrap().unwrap();
        assert_eq!(&data[..4], &[0x00, 0x01, 0x10, 0x00]);
        assert_eq!(fs.read_file("/data.trie").unwrap(), Some(data));
    }

    #[test]
    fn test_bound_table_overrides_builtin() {
        let mut fs = VirtualFileSystem::new();
        let mut base = HashMap::new();
        base.insert(BUILTIN_RESOURCE_NAME.to_string(), "eA==".to_string());
        fs.bind_fs(base);
        assert_eq!(fs.read_file(BUILTIN_RESOURCE_NAME).unwrap(), Some(b"x".to_vec()));
    }

    #[test]
    fn test_invalid_base64_is_an_asset_error() {
        let mut fs = VirtualFileSystem::new();
        let mut base = HashMap::new();
        base.insert("bad.ttf".to_string(), "not base64!".to_string());
        fs.bind_fs(base);
        let err = fs.read_file("bad.ttf").unwrap_err();
        assert!(matches!(err, HtmlDefError::Asset { ref name, .. } if name == "bad.ttf"));
    }
}
