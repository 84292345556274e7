//! CSV export of the whole contact book.
//!
//! The file lives at one configured path and is rewritten on every export;
//! two exports running at once race on it.

use std::path::Path;

use tracing::debug;

use crate::contact::domain::ContactWithPhones;
use crate::errors::ServiceError;

pub const CSV_HEADER: [&str; 3] = ["ID", "Name", "Phone Numbers"];
pub const PHONE_SEPARATOR: &str = ", ";
pub const DOWNLOAD_NAME: &str = "contacts.csv";
/// Export failure message when the book is empty.
pub const NO_CONTACTS: &str = "No contacts found";

/// One row per contact; all of a contact's numbers share one cell.
pub fn render_csv(contacts: &[ContactWithPhones]) -> Result<Vec<u8>, ServiceError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER).map_err(|e| ServiceError::Export(e.to_string()))?;
    for c in contacts {
        let numbers = c.numbers().collect::<Vec<_>>().join(PHONE_SEPARATOR);
        wtr.write_record([c.contact.id.to_string(), c.contact.name.clone(), numbers])
            .map_err(|e| ServiceError::Export(e.to_string()))?;
    }
    wtr.into_inner().map_err(|e| ServiceError::Export(e.to_string()))
}

/// Replace whatever sits at `path` with `contents` and read it back.
pub async fn write_export_file(path: &Path, contents: &[u8]) -> Result<Vec<u8>, ServiceError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed previous export"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(ServiceError::Export(format!("cannot remove {}: {e}", path.display()))),
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| ServiceError::Export(format!("cannot write {}: {e}", path.display())))?;
    tokio::fs::read(path)
        .await
        .map_err(|e| ServiceError::Export(format!("cannot read {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{contact, phone_number};

    fn contact_with(id: i32, name: &str, numbers: &[&str]) -> ContactWithPhones {
        ContactWithPhones {
            contact: contact::Model { id, name: name.into(), image: None },
            phone_numbers: numbers
                .iter()
                .enumerate()
                .map(|(i, n)| phone_number::Model { id: i as i32 + 1, number: n.to_string(), contact_id: id })
                .collect(),
        }
    }

    #[test]
    fn renders_header_and_joined_numbers() {
        let out = render_csv(&[
            contact_with(1, "John Doe", &["1234567890", "0987654321"]),
            contact_with(2, "Solo", &["555"]),
            contact_with(3, "Nobody", &[]),
        ])
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID,Name,Phone Numbers");
        assert_eq!(lines[1], "1,John Doe,\"1234567890, 0987654321\"");
        assert_eq!(lines[2], "2,Solo,555");
        assert_eq!(lines[3], "3,Nobody,");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn quotes_names_with_commas() {
        let out = render_csv(&[contact_with(7, "Doe, John", &["1"])]).unwrap();
        let mut rdr = csv::Reader::from_reader(out.as_slice());
        let rows: Vec<csv::StringRecord> = rdr.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1], "Doe, John");
    }

    #[tokio::test]
    async fn export_file_is_overwritten() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("contact-export-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join("contacts.csv");

        write_export_file(&path, b"first,longer,content\n").await?;
        let second = write_export_file(&path, b"second\n").await?;
        assert_eq!(second, b"second\n");
        assert_eq!(tokio::fs::read(&path).await?, b"second\n");

        tokio::fs::remove_dir_all(&dir).await?;
        Ok(())
    }
}
