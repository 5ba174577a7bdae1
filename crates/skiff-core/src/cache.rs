//! Content-addressed build cache.
//!
//! Lets transform plugins skip expensive work across runs. Entries are
//! keyed by `(bundle entry, input)` so the same file compiled under
//! different entries never collides, and materialized as nested
//! hex-digest paths under the cache dir. The engine only mutates the
//! in-memory map in [`Context::cache`]; writing the files to disk is the
//! caller's job.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::item::Source;
use skiff_util::hash;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Location of the cache entry for `(bundle_entry, input)`:
/// `<cacheDir>/<digest(bundle_entry)>/<digest(input)>`.
#[must_use]
pub fn cache_file_path(bundle_entry: &str, input: &str, context: &Context<'_>) -> PathBuf {
    context
        .cache_dir_path
        .join(hash::blake3_str(bundle_entry))
        .join(hash::blake3_str(input))
}

/// Whether a usable cache entry exists for `(bundle_entry, input)`: an
/// in-memory hit, or a cache file on disk newer than the input. Missing
/// files on either side mean "no"; other stat failures propagate.
pub fn has_cache(bundle_entry: &str, input: &str, context: &Context<'_>) -> Result<bool> {
    let key = cache_file_path(bundle_entry, input, context);
    if context.cache.contains_key(&key) {
        return Ok(true);
    }

    let cache_mtime = match skiff_util::fs::mtime(&key) {
        Ok(mtime) => mtime,
        Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(source) => return Err(Error::Stat { path: key, source }),
    };
    let input_path = Path::new(input);
    let input_mtime = match skiff_util::fs::mtime(input_path) {
        Ok(mtime) => mtime,
        Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(source) => {
            return Err(Error::Stat {
                path: input_path.to_path_buf(),
                source,
            })
        }
    };
    Ok(cache_mtime > input_mtime)
}

/// Record a transform output in the in-memory cache.
pub fn set_cache(bundle_entry: &str, input: &str, source: Source, context: &mut Context<'_>) {
    let key = cache_file_path(bundle_entry, input, context);
    context.cache.insert(key, source);
}

/// Fetch the cache entry for `(bundle_entry, input)`: the in-memory
/// value when present, otherwise a disk read of the cache file (which is
/// then memoized).
pub fn get_cache(bundle_entry: &str, input: &str, context: &mut Context<'_>) -> Result<Source> {
    let key = cache_file_path(bundle_entry, input, context);
    if let Some(source) = context.cache.get(&key) {
        return Ok(source.clone());
    }

    let bytes = fs::read(&key).map_err(|error| {
        if error.kind() == io::ErrorKind::NotFound {
            Error::FileNotFound(key.display().to_string())
        } else {
            Error::Io(error)
        }
    })?;
    let source = Source::Bytes(bytes);
    context.cache.insert(key, source.clone());
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::Bundler;
    use crate::context::BundleOptions;
    use tempfile::tempdir;

    #[test]
    fn test_key_is_nested_hex_digests() {
        let bundler = Bundler::new();
        let context = Context::new(&bundler, BundleOptions::default());
        let key = cache_file_path("src/index.html", "src/index.tsx", &context);

        let components: Vec<_> = key
            .strip_prefix(&context.cache_dir_path)
            .unwrap()
            .iter()
            .map(|c| c.to_str().unwrap().to_string())
            .collect();
        assert_eq!(components.len(), 2);
        assert!(components.iter().all(|c| c.len() == 64));
        assert!(components
            .iter()
            .all(|c| c.chars().all(|ch| ch.is_ascii_hexdigit())));
    }

    #[test]
    fn test_entry_partitions_do_not_collide() {
        let bundler = Bundler::new();
        let context = Context::new(&bundler, BundleOptions::default());
        let under_a = cache_file_path("a.html", "shared.ts", &context);
        let under_b = cache_file_path("b.html", "shared.ts", &context);
        assert_ne!(under_a, under_b);
        assert_eq!(under_a.file_name(), under_b.file_name());
    }

    #[test]
    fn test_set_then_get_never_touches_disk() {
        let bundler = Bundler::new();
        // Cache dir does not exist; a disk read would fail loudly.
        let options = BundleOptions {
            out_dir_path: PathBuf::from("/nonexistent/skiff-test"),
            ..Default::default()
        };
        let mut context = Context::new(&bundler, options);

        let stored = Source::Text("transformed".to_string());
        set_cache("entry.html", "mod.ts", stored.clone(), &mut context);

        assert!(has_cache("entry.html", "mod.ts", &context).unwrap());
        let fetched = get_cache("entry.html", "mod.ts", &mut context).unwrap();
        assert_eq!(fetched, stored);
    }

    #[test]
    fn test_has_cache_false_when_nothing_stored() {
        let dir = tempdir().unwrap();
        let bundler = Bundler::new();
        let options = BundleOptions {
            out_dir_path: dir.path().to_path_buf(),
            ..Default::default()
        };
        let context = Context::new(&bundler, options);

        assert!(!has_cache("entry.html", "mod.ts", &context).unwrap());
    }

    #[test]
    fn test_get_cache_reads_through_from_disk() {
        let dir = tempdir().unwrap();
        let bundler = Bundler::new();
        let options = BundleOptions {
            out_dir_path: dir.path().to_path_buf(),
            ..Default::default()
        };
        let mut context = Context::new(&bundler, options);

        let key = cache_file_path("entry.html", "mod.ts", &context);
        fs::create_dir_all(key.parent().unwrap()).unwrap();
        fs::write(&key, b"cached output").unwrap();

        let fetched = get_cache("entry.html", "mod.ts", &mut context).unwrap();
        assert_eq!(fetched.as_bytes(), b"cached output");
        // Now memoized.
        assert!(context.cache.contains_key(&key));
    }

    #[test]
    fn test_get_cache_missing_entry_is_file_not_found() {
        let dir = tempdir().unwrap();
        let bundler = Bundler::new();
        let options = BundleOptions {
            out_dir_path: dir.path().to_path_buf(),
            ..Default::default()
        };
        let mut context = Context::new(&bundler, options);

        let error = get_cache("entry.html", "mod.ts", &mut context).unwrap_err();
        assert!(matches!(error, Error::FileNotFound(_)));
    }
}
