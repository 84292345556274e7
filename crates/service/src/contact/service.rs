use std::path::PathBuf;
use std::sync::Arc;

use models::contact;
use tracing::{error, info, instrument};

use super::domain::{parse_phone_numbers, ContactChanges, ContactInput, ContactWithPhones, CsvExport, ImageUpload};
use super::repository::ContactRepository;
use crate::errors::ServiceError;
use crate::export;
use crate::imaging::{self, ImageError, ImageHost, ImageOptions};

/// Contact business service independent of web framework
pub struct ContactService<R: ContactRepository> {
    repo: Arc<R>,
    images: Arc<dyn ImageHost>,
    image_options: ImageOptions,
    export_path: PathBuf,
}

impl<R: ContactRepository> ContactService<R> {
    pub fn new(repo: Arc<R>, images: Arc<dyn ImageHost>, image_options: ImageOptions, export_path: impl Into<PathBuf>) -> Self {
        Self { repo, images, image_options, export_path: export_path.into() }
    }

    pub fn export_path(&self) -> &std::path::Path { &self.export_path }

    /// Create a contact with its phone numbers and optional photo.
    ///
    /// # Examples
    /// ```
    /// use service::contact::{domain::{ContactInput, PhoneNumbersField}, repository::mock::MockContactRepository, ContactService};
    /// use service::imaging::{DisabledImageHost, ImageOptions};
    /// use std::sync::Arc;
    /// let svc = ContactService::new(Arc::new(MockContactRepository::default()), Arc::new(DisabledImageHost), ImageOptions::default(), "contacts.csv");
    /// let input = ContactInput {
    ///     name: Some("John Doe".into()),
    ///     phone_numbers: Some(PhoneNumbersField::Encoded(r#"["1234567890","0987654321"]"#.into())),
    ///     image: None,
    /// };
    /// let created = tokio_test::block_on(svc.create(input)).unwrap();
    /// assert_eq!(created.contact.name, "John Doe");
    /// assert_eq!(created.phone_numbers.len(), 2);
    /// ```
    #[instrument(skip(self, input), fields(has_image = input.image.is_some()))]
    pub async fn create(&self, input: ContactInput) -> Result<ContactWithPhones, ServiceError> {
        let numbers = parse_phone_numbers(input.phone_numbers)?;
        let name = models::contact::validate_name(input.name.as_deref().unwrap_or_default())?;

        let image = match input.image {
            Some(upload) => Some(self.process_image(upload).await?),
            None => None,
        };

        let created = self.repo.create(&name, image, &numbers).await.map_err(|e| {
            error!(error = %e, "contact create failed");
            e
        })?;
        info!(contact_id = created.id(), phone_numbers = created.phone_numbers.len(), "contact_created");
        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<ContactWithPhones>, ServiceError> {
        self.repo.list().await
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<ContactWithPhones>, ServiceError> {
        let found = self.repo.search(query).await?;
        info!(count = found.len(), "contact_search");
        Ok(found)
    }

    pub async fn get(&self, id: i32) -> Result<Option<ContactWithPhones>, ServiceError> {
        self.repo.get(id).await
    }

    /// Update name, photo and/or numbers. Blank or missing fields keep their
    /// stored values; the returned row does not carry phone numbers.
    #[instrument(skip(self, input), fields(contact_id = id, has_image = input.image.is_some()))]
    pub async fn update(&self, id: i32, input: ContactInput) -> Result<contact::Model, ServiceError> {
        let numbers = parse_phone_numbers(input.phone_numbers)?;
        let name = match input.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => Some(models::contact::validate_name(n)?),
            None => None,
        };

        if !self.repo.exists(id).await? {
            return Err(ServiceError::not_found("contact"));
        }

        let image = match input.image {
            Some(upload) => Some(self.process_image(upload).await?),
            None => None,
        };

        let updated = self.repo.update(id, ContactChanges { name, image, phone_numbers: numbers }).await?;
        info!(contact_id = updated.id, "contact_updated");
        Ok(updated)
    }

    /// Delete a contact and its numbers; returns the removed row if it existed.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<Option<contact::Model>, ServiceError> {
        let deleted = self.repo.delete(id).await?;
        if let Some(c) = &deleted {
            info!(contact_id = c.id, name = %c.name, "contact_deleted");
        }
        Ok(deleted)
    }

    /// Write every contact to the export file and return its contents.
    #[instrument(skip(self), fields(path = %self.export_path.display()))]
    pub async fn export_csv(&self) -> Result<CsvExport, ServiceError> {
        let contacts = self.repo.list().await?;
        if contacts.is_empty() {
            return Err(ServiceError::Export(export::NO_CONTACTS.into()));
        }
        let rendered = export::render_csv(&contacts)?;
        let bytes = export::write_export_file(&self.export_path, &rendered).await?;
        info!(rows = contacts.len(), bytes = bytes.len(), "contacts_exported");
        Ok(CsvExport { rows: contacts.len(), bytes })
    }

    /// Resize + re-encode off the async runtime, then upload.
    async fn process_image(&self, upload: ImageUpload) -> Result<String, ServiceError> {
        upload.check_media_type()?;
        let opts = self.image_options;
        let original = upload.bytes.len();
        let file_name = upload.file_name.clone().unwrap_or_default();
        let jpeg = tokio::task::spawn_blocking(move || imaging::optimize(&upload.bytes, opts))
            .await
            .map_err(|e| ImageError::Encode(format!("image task failed: {e}")))??;
        info!(file = %file_name, original_bytes = original, optimized_bytes = jpeg.len(), "image optimized");
        let url = self.images.upload(jpeg).await.map_err(|e| {
            error!(error = %e, "image upload failed");
            e
        })?;
        Ok(url)
    }
}
