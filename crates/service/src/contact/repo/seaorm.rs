use sea_orm::DatabaseConnection;

use models::contact;

use crate::contact::domain::{ContactChanges, ContactWithPhones};
use crate::contact::repository::ContactRepository;
use crate::db::contact_store;
use crate::errors::ServiceError;

/// SeaORM-backed repository over a shared connection pool.
#[derive(Clone)]
pub struct SeaOrmContactRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl ContactRepository for SeaOrmContactRepository {
    async fn list(&self) -> Result<Vec<ContactWithPhones>, ServiceError> {
        contact_store::list_contacts(&self.db).await
    }

    async fn search(&self, query: &str) -> Result<Vec<ContactWithPhones>, ServiceError> {
        contact_store::search_contacts(&self.db, query).await
    }

    async fn get(&self, id: i32) -> Result<Option<ContactWithPhones>, ServiceError> {
        contact_store::get_contact(&self.db, id).await
    }

    async fn exists(&self, id: i32) -> Result<bool, ServiceError> {
        Ok(contact_store::find_contact(&self.db, id).await?.is_some())
    }

    async fn create(&self, name: &str, image: Option<String>, numbers: &[String]) -> Result<ContactWithPhones, ServiceError> {
        contact_store::create_contact(&self.db, name, image, numbers).await
    }

    async fn update(&self, id: i32, changes: ContactChanges) -> Result<contact::Model, ServiceError> {
        contact_store::update_contact(&self.db, id, changes).await
    }

    async fn delete(&self, id: i32) -> Result<Option<contact::Model>, ServiceError> {
        contact_store::delete_contact(&self.db, id).await
    }
}
