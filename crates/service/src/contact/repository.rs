use async_trait::async_trait;
use models::contact;

use super::domain::{ContactChanges, ContactWithPhones};
use crate::errors::ServiceError;

/// Repository abstraction for contact persistence.
///
/// `create`, `update` and `delete` are each atomic: either every row they
/// touch changes or none does.
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<ContactWithPhones>, ServiceError>;
    async fn search(&self, query: &str) -> Result<Vec<ContactWithPhones>, ServiceError>;
    async fn get(&self, id: i32) -> Result<Option<ContactWithPhones>, ServiceError>;
    async fn exists(&self, id: i32) -> Result<bool, ServiceError>;

    async fn create(&self, name: &str, image: Option<String>, numbers: &[String]) -> Result<ContactWithPhones, ServiceError>;
    async fn update(&self, id: i32, changes: ContactChanges) -> Result<contact::Model, ServiceError>;
    async fn delete(&self, id: i32) -> Result<Option<contact::Model>, ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use models::phone_number;
    use crate::db::contact_store::filter_matches;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockContactRepository {
        contacts: Mutex<Vec<ContactWithPhones>>, // ordered by id
        next_contact_id: Mutex<i32>,
        next_phone_id: Mutex<i32>,
    }

    impl MockContactRepository {
        fn phones(&self, contact_id: i32, numbers: &[String]) -> Vec<phone_number::Model> {
            let mut next = self.next_phone_id.lock().unwrap();
            numbers
                .iter()
                .map(|n| {
                    *next += 1;
                    phone_number::Model { id: *next, number: n.clone(), contact_id }
                })
                .collect()
        }
    }

    #[async_trait]
    impl ContactRepository for MockContactRepository {
        async fn list(&self) -> Result<Vec<ContactWithPhones>, ServiceError> {
            Ok(self.contacts.lock().unwrap().clone())
        }

        async fn search(&self, query: &str) -> Result<Vec<ContactWithPhones>, ServiceError> {
            let all = self.contacts.lock().unwrap().clone();
            Ok(filter_matches(all, query))
        }

        async fn get(&self, id: i32) -> Result<Option<ContactWithPhones>, ServiceError> {
            Ok(self.contacts.lock().unwrap().iter().find(|c| c.id() == id).cloned())
        }

        async fn exists(&self, id: i32) -> Result<bool, ServiceError> {
            Ok(self.contacts.lock().unwrap().iter().any(|c| c.id() == id))
        }

        async fn create(&self, name: &str, image: Option<String>, numbers: &[String]) -> Result<ContactWithPhones, ServiceError> {
            let id = {
                let mut next = self.next_contact_id.lock().unwrap();
                *next += 1;
                *next
            };
            let created = ContactWithPhones {
                contact: contact::Model { id, name: name.to_string(), image },
                phone_numbers: self.phones(id, numbers),
            };
            self.contacts.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update(&self, id: i32, changes: ContactChanges) -> Result<contact::Model, ServiceError> {
            let replacement = if changes.phone_numbers.is_empty() { None } else { Some(self.phones(id, &changes.phone_numbers)) };
            let mut contacts = self.contacts.lock().unwrap();
            let found = contacts.iter_mut().find(|c| c.id() == id).ok_or_else(|| ServiceError::not_found("contact"))?;
            if let Some(name) = changes.name {
                found.contact.name = name;
            }
            if let Some(image) = changes.image {
                found.contact.image = Some(image);
            }
            if let Some(phones) = replacement {
                found.phone_numbers = phones;
            }
            Ok(found.contact.clone())
        }

        async fn delete(&self, id: i32) -> Result<Option<contact::Model>, ServiceError> {
            let mut contacts = self.contacts.lock().unwrap();
            let pos = contacts.iter().position(|c| c.id() == id);
            Ok(pos.map(|i| contacts.remove(i).contact))
        }
    }
}
