//! Shared fixtures for drive-services integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use drive_core::{ContentType, DriveConfig, InboundFile, OperationSpec, Profile};
use drive_services::{
    DestinationNamer, Drive, ProfileStore, RuleValidator, Storage, StorageError, StorageResult,
};
use drive_storage::LocalStorage;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde_json::json;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// A disk root plus a separate directory that plays the transport's upload area.
pub struct TestDisk {
    pub dir: TempDir,
}

impl TestDisk {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("disk")
    }

    pub fn uploads(&self) -> PathBuf {
        let path = self.dir.path().join("uploads");
        std::fs::create_dir_all(&path).expect("Failed to create uploads directory");
        path
    }

    /// Write `content` to the upload area and describe it as an inbound file.
    pub fn inbound(&self, name: &str, mime: &str, content: &[u8]) -> InboundFile {
        let path = self.uploads().join(uuid::Uuid::new_v4().to_string());
        std::fs::write(&path, content).expect("Failed to write upload");
        InboundFile::new(path, name, mime, content.len() as u64)
    }

    pub fn final_path(&self, path: &str) -> PathBuf {
        self.root().join("files").join(path)
    }

    /// Entries left in the scratch namespace
    pub fn scratch_entries(&self) -> usize {
        match std::fs::read_dir(self.root().join("temp")) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    pub fn config(&self) -> DriveConfig {
        let mut config = DriveConfig::local(self.root());
        config.profiles.insert("avatar".to_string(), avatar_profile());
        config
            .profiles
            .insert("raw".to_string(), Profile::new(ContentType::Image, Vec::new()));
        config
            .default_profiles
            .insert("image".to_string(), vec!["avatar".to_string()]);
        config
    }

    pub async fn drive(&self) -> Drive {
        Drive::from_config(self.config())
            .await
            .expect("Failed to build drive")
    }

    /// A drive over [`InstrumentedStorage`], configured like [`TestDisk::config`].
    pub async fn instrumented_drive(&self) -> (Drive, Arc<InstrumentedStorage>) {
        let config = self.config();
        let storage = InstrumentedStorage::new(&self.root()).await;
        let shared: Arc<dyn Storage> = storage.clone();
        let namer = DestinationNamer::new(
            shared.clone(),
            config.location.clone(),
            config.template().expect("Invalid template"),
        );
        let drive = Drive::new(
            shared,
            Arc::new(RuleValidator::default()),
            ProfileStore::from_config(&config),
            namer,
            config.temporary.clone(),
        );
        (drive, storage)
    }
}

impl Default for TestDisk {
    fn default() -> Self {
        Self::new()
    }
}

pub fn avatar_profile() -> Profile {
    Profile::new(
        ContentType::Image,
        vec![
            OperationSpec::new("crop", vec![json!(100), json!(100), json!(25), json!(25)]),
            OperationSpec::new("heighten", vec![json!(200)]),
        ],
    )
}

/// Horizontal gradient, so geometry changes are visible in the output bytes.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 255 / width) as u8, (y * 255 / height) as u8, 128, 255])
    }));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("Failed to encode test image");
    buf
}

pub fn dimensions(path: &Path) -> (u32, u32) {
    let img = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .expect("Failed to open committed image")
        .decode()
        .expect("Failed to decode committed image");
    (img.width(), img.height())
}

/// Local storage that counts directory deletes and can refuse commits.
pub struct InstrumentedStorage {
    inner: LocalStorage,
    pub delete_directory_calls: AtomicUsize,
    pub fail_commits: AtomicBool,
}

impl InstrumentedStorage {
    pub async fn new(root: &Path) -> Arc<Self> {
        Arc::new(Self {
            inner: LocalStorage::new(root).await.expect("Failed to create storage"),
            delete_directory_calls: AtomicUsize::new(0),
            fail_commits: AtomicBool::new(false),
        })
    }

    pub fn deletes(&self) -> usize {
        self.delete_directory_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for InstrumentedStorage {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    async fn rename(&self, from_key: &str, to_key: &str) -> StorageResult<()> {
        self.inner.rename(from_key, to_key).await
    }

    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<()> {
        if to_key.starts_with("files/") && self.fail_commits.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError("disk full".to_string()));
        }
        self.inner.copy(from_key, to_key).await
    }

    async fn make_directory(&self, key: &str) -> StorageResult<()> {
        self.inner.make_directory(key).await
    }

    async fn delete_directory(&self, key: &str) -> StorageResult<()> {
        self.delete_directory_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_directory(key).await
    }

    async fn import(&self, source: &Path, key: &str) -> StorageResult<()> {
        self.inner.import(source, key).await
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        self.inner.write(key, data).await
    }

    fn driver(&self) -> &'static str {
        "instrumented"
    }
}
