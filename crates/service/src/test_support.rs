#![cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use configs::DatabaseConfig;
use migration::MigratorTrait;
use models::db::connect_with_config;
use sea_orm::DatabaseConnection;

use crate::imaging::{ImageError, ImageHost};

/// Fresh in-memory SQLite database with migrations applied.
/// One pooled connection, so every query in a test sees the same memory database.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let cfg = DatabaseConfig {
        url: "sqlite::memory:".into(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let db = connect_with_config(&cfg).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Image host that keeps uploads in memory and hands out predictable URLs.
#[derive(Default)]
pub struct RecordingImageHost {
    pub fail: bool,
    counter: AtomicUsize,
    pub uploads: Mutex<Vec<Vec<u8>>>,
}

impl RecordingImageHost {
    pub fn failing() -> Self { Self { fail: true, ..Default::default() } }

    pub fn upload_count(&self) -> usize { self.uploads.lock().unwrap().len() }
}

#[async_trait]
impl ImageHost for RecordingImageHost {
    async fn upload(&self, jpeg: Vec<u8>) -> Result<String, ImageError> {
        if self.fail {
            return Err(ImageError::Upload("host unavailable".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.uploads.lock().unwrap().push(jpeg);
        Ok(format!("https://images.test/contacts/{n}.jpg"))
    }
}

/// Encode a solid-colour PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 90]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .expect("encode png");
    out.into_inner()
}
