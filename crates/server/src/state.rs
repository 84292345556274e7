use std::sync::Arc;

use sea_orm::DatabaseConnection;
use service::contact::{repo::seaorm::SeaOrmContactRepository, ContactService};
use service::imaging::{ImageHost, ImageOptions};

pub type Contacts = ContactService<SeaOrmContactRepository>;

/// Shared handler state: one contact service per process over one pool.
#[derive(Clone)]
pub struct AppState {
    pub contacts: Arc<Contacts>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, images: Arc<dyn ImageHost>, image_options: ImageOptions, export_path: &str) -> Self {
        let repo = Arc::new(SeaOrmContactRepository { db });
        let contacts = Arc::new(ContactService::new(repo, images, image_options, export_path));
        Self { contacts }
    }
}
