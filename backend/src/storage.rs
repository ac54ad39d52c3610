//! Local bucket storage. Each bucket is a directory under the storage root and
//! objects are served back at `/uploads/{bucket}/{key}`.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

pub const PRODUCT_BUCKET: &str = "ispeak-products";
pub const MEDIA_BUCKET: &str = "media";
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct BucketStore {
    root: PathBuf,
    public_base_url: String,
}

/// Rejects keys that could leave their bucket.
fn checked_key(key: &str) -> ApiResult<&Path> {
    let path = Path::new(key);
    let only_normal = path
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if key.is_empty() || key.contains('\\') || !only_normal {
        return Err(ApiError::BadRequest("Invalid storage key".to_string()));
    }
    Ok(path)
}

/// Lower-cases a file name and keeps only characters safe in a URL path.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '-',
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '-' || c == '.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Eight random hex characters, used to keep object keys apart.
pub fn unique_tag() -> String {
    let mut tag = Uuid::new_v4().simple().to_string();
    tag.truncate(8);
    tag
}

impl BucketStore {
    pub fn new(root: PathBuf, public_base_url: &str) -> ApiResult<Self> {
        for bucket in [PRODUCT_BUCKET, MEDIA_BUCKET] {
            fs::create_dir_all(root.join(bucket))?;
        }
        info!("Bucket storage at {}", root.display());
        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> ApiResult<PathBuf> {
        checked_key(bucket)?;
        Ok(self.root.join(bucket).join(checked_key(key)?))
    }

    pub fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}{}/{}/{}", self.public_base_url, PUBLIC_PREFIX, bucket, key)
    }

    /// The key of an object in `bucket` given its public URL.
    pub fn key_from_url<'a>(&self, bucket: &str, url: &'a str) -> Option<&'a str> {
        let marker = format!("{}/{}/", PUBLIC_PREFIX, bucket);
        let start = url.find(&marker)? + marker.len();
        Some(&url[start..]).filter(|key| checked_key(key).is_ok())
    }

    /// Writes an object under a key that must not exist yet.
    pub fn put_new(&self, bucket: &str, key: &str, bytes: &[u8]) -> ApiResult<String> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ApiError::Conflict(format!("Object {}/{} already exists", bucket, key)));
            }
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = file.write_all(bytes) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }
        debug!("Stored new {}/{} ({} bytes)", bucket, key, bytes.len());
        Ok(self.public_url(bucket, key))
    }

    /// Stores a new object and hands its URL to `record`. If `record` fails
    /// the object is removed again, so no file outlives a failed insert.
    pub fn put_recorded<T>(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        record: impl FnOnce(String) -> ApiResult<T>,
    ) -> ApiResult<T> {
        let url = self.put_new(bucket, key, bytes)?;
        record(url).inspect_err(|err| {
            warn!("Removing {}/{} after failed insert: {}", bucket, key, err);
            if let Err(e) = self.remove(bucket, key) {
                warn!("Could not remove {}/{}: {}", bucket, key, e);
            }
        })
    }

    pub fn read(&self, bucket: &str, key: &str) -> ApiResult<Vec<u8>> {
        Ok(fs::read(self.object_path(bucket, key)?)?)
    }

    /// Removes an object. A missing object is only worth a warning.
    pub fn remove(&self, bucket: &str, key: &str) -> ApiResult<()> {
        let path = self.object_path(bucket, key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Object {}/{} was already gone", bucket, key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Every key in a bucket, sorted.
    pub fn list(&self, bucket: &str) -> ApiResult<Vec<String>> {
        checked_key(bucket)?;
        let base = self.root.join(bucket);
        let mut keys = Vec::new();
        let mut pending = vec![base.clone()];
        while let Some(dir) = pending.pop() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    pending.push(path);
                } else if let Ok(relative) = path.strip_prefix(&base) {
                    let key: Vec<String> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect();
                    keys.push(key.join("/"));
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (BucketStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = BucketStore::new(dir.path().to_path_buf(), "http://cdn.test/").unwrap();
        (store, dir)
    }

    #[test]
    fn put_read_and_remove() {
        let (store, _dir) = store();
        let url = store.put_new(PRODUCT_BUCKET, "products/tee-1.jpg", b"jpeg").unwrap();
        assert_eq!(url, "http://cdn.test/uploads/ispeak-products/products/tee-1.jpg");
        assert_eq!(store.read(PRODUCT_BUCKET, "products/tee-1.jpg").unwrap(), b"jpeg");
        assert_eq!(store.key_from_url(PRODUCT_BUCKET, &url), Some("products/tee-1.jpg"));
        assert_eq!(store.list(PRODUCT_BUCKET).unwrap(), vec!["products/tee-1.jpg"]);

        store.remove(PRODUCT_BUCKET, "products/tee-1.jpg").unwrap();
        store.remove(PRODUCT_BUCKET, "products/tee-1.jpg").unwrap();
        assert!(store.read(PRODUCT_BUCKET, "products/tee-1.jpg").is_err());
    }

    #[test]
    fn new_objects_never_replace_existing_ones() {
        let (store, _dir) = store();
        store.put_new(MEDIA_BUCKET, "uploads/a.jpg", b"first").unwrap();
        let err = store.put_new(MEDIA_BUCKET, "uploads/a.jpg", b"second").unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(store.read(MEDIA_BUCKET, "uploads/a.jpg").unwrap(), b"first");
    }

    #[test]
    fn failed_record_removes_the_object() {
        let (store, _dir) = store();
        let result: ApiResult<()> = store.put_recorded(MEDIA_BUCKET, "uploads/b.jpg", b"x", |url| {
            assert!(url.ends_with("/uploads/media/uploads/b.jpg"));
            Err(ApiError::Conflict("duplicate".to_string()))
        });
        assert!(result.is_err());
        assert!(store.list(MEDIA_BUCKET).unwrap().is_empty());

        let id = store
            .put_recorded(MEDIA_BUCKET, "uploads/c.jpg", b"y", |_| Ok(7))
            .unwrap();
        assert_eq!(id, 7);
        assert_eq!(store.list(MEDIA_BUCKET).unwrap(), vec!["uploads/c.jpg"]);
    }

    #[test]
    fn unique_tags_are_short_and_distinct() {
        let (a, b) = (unique_tag(), unique_tag());
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }

    #[test]
    fn traversal_is_rejected() {
        let (store, _dir) = store();
        for key in ["../escape.jpg", "/etc/passwd", "a/../../b", "", "a\\b"] {
            assert!(store.put_new(MEDIA_BUCKET, key, b"x").is_err(), "{}", key);
        }
        assert_eq!(store.key_from_url(MEDIA_BUCKET, "/uploads/media/../secret"), None);
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("My Photo (1).JPG"), "my-photo--1-.jpg");
        assert_eq!(sanitize_filename("..."), "file");
    }
}
