//! Certificate business logic - documents attached to land records.
//!
//! Metadata lives in the `certificates` table; the document itself goes through a
//! [`DocumentStore`]. A certificate is always addressed through its land record, and
//! one addressed through the wrong land is reported as not found.

use crate::{
    config::storage::get_certificate_storage_dir,
    entities::{Certificate, CertificateModel, Land, certificate},
    errors::{Error, FieldViolation, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

/// Maximum certificate number length, in characters.
pub const MAX_NUMBER_CHARS: usize = 255;
/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 1000;
/// Maximum document size in bytes (5 MiB).
pub const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;
/// Accepted document extensions.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "pdf"];

/// Storage for certificate documents, addressed by relative path.
#[allow(async_fn_in_trait)]
pub trait DocumentStore: Send + Sync {
    /// Writes `bytes` at `path`, replacing any existing document.
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Reads the document at `path`; `None` if there is none.
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Removes the document at `path`. Removing a missing document succeeds.
    async fn delete(&self, path: &str) -> Result<()>;
}

/// A [`DocumentStore`] on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    /// Stores documents under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Stores documents under `CERTIFICATE_STORAGE_DIR`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(get_certificate_storage_dir())
    }

    /// Directory documents are stored in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl DocumentStore for LocalDocumentStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.full_path(path)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        match tokio::fs::remove_file(self.full_path(path)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("Certificate document '{}' was already gone", path);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// An uploaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    /// File name as uploaded; only its extension is kept
    pub original_name: String,
    /// Content
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    /// Creates an upload from its client-side name and content.
    pub fn new(original_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            original_name: original_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Extension of the uploaded name, as given.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.original_name)
            .extension()
            .and_then(|ext| ext.to_str())
    }
}

/// Certificate metadata supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInput {
    /// Certificate number as printed on the document
    pub certificate_number: String,
    /// Optional description
    pub description: Option<String>,
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
#[must_use]
pub fn sanitize_file_stem(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn mime_type(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "pdf" => "application/pdf",
        _ => "image/jpeg",
    }
}

fn validate_input(input: &CertificateInput, violations: &mut Vec<FieldViolation>) {
    let number = input.certificate_number.trim();
    if number.is_empty() {
        violations.push(FieldViolation::new("certificate_number", "is required"));
    } else if number.chars().count() > MAX_NUMBER_CHARS {
        violations.push(FieldViolation::new(
            "certificate_number",
            format!("may not be longer than {MAX_NUMBER_CHARS} characters"),
        ));
    }
    if input
        .description
        .as_deref()
        .is_some_and(|text| text.chars().count() > MAX_DESCRIPTION_CHARS)
    {
        violations.push(FieldViolation::new(
            "description",
            format!("may not be longer than {MAX_DESCRIPTION_CHARS} characters"),
        ));
    }
}

fn validate_document(document: &UploadedDocument, violations: &mut Vec<FieldViolation>) {
    let allowed = document.extension().is_some_and(|ext| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed))
    });
    if !allowed {
        violations.push(FieldViolation::new(
            "file",
            format!("must be a file of type: {}", ALLOWED_EXTENSIONS.join(", ")),
        ));
    }
    if document.bytes.len() > MAX_DOCUMENT_BYTES {
        violations.push(FieldViolation::new("file", "may not be larger than 5 MiB"));
    }
}

fn check(input: &CertificateInput, document: Option<&UploadedDocument>) -> Result<()> {
    let mut violations = Vec::new();
    validate_input(input, &mut violations);
    if let Some(document) = document {
        validate_document(document, &mut violations);
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation { violations })
    }
}

/// Display name for a document: the sanitized certificate number plus the upload's
/// extension.
fn stored_file_name(input: &CertificateInput, document: &UploadedDocument) -> String {
    let stem = sanitize_file_stem(input.certificate_number.trim());
    match document.extension() {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

fn description(input: &CertificateInput) -> Option<String> {
    input
        .description
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Store path of a document, unique per certificate: `{land_id}/{certificate_id}-{file_name}`.
fn document_path(land_id: i64, certificate_id: i64, file_name: &str) -> String {
    format!("{land_id}/{certificate_id}-{file_name}")
}

async fn write_document<S: DocumentStore>(
    store: &S,
    land_id: i64,
    certificate_id: i64,
    file_name: &str,
    document: &UploadedDocument,
) -> Result<String> {
    let path = document_path(land_id, certificate_id, file_name);
    store.put(&path, &document.bytes).await?;
    Ok(path)
}

fn document_metadata(document: &UploadedDocument) -> Result<(String, i64)> {
    let size = i64::try_from(document.bytes.len())?;
    let file_type = mime_type(document.extension().unwrap_or_default()).to_string();
    Ok((file_type, size))
}

/// Certificates of a land record, newest first.
pub async fn list_certificates(
    db: &DatabaseConnection,
    land_id: i64,
) -> Result<Vec<CertificateModel>> {
    Certificate::find()
        .filter(certificate::Column::LandId.eq(land_id))
        .order_by_desc(certificate::Column::CreatedAt)
        .order_by_desc(certificate::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a certificate through its land record.
///
/// # Errors
/// Returns `CertificateNotFound` if the id does not exist or belongs to another land.
pub async fn get_certificate(
    db: &DatabaseConnection,
    land_id: i64,
    certificate_id: i64,
) -> Result<CertificateModel> {
    Certificate::find_by_id(certificate_id)
        .one(db)
        .await?
        .filter(|found| found.land_id == land_id)
        .ok_or(Error::CertificateNotFound { id: certificate_id })
}

/// Validates and stores a certificate with its document.
///
/// # Errors
/// Returns `LandNotFound`, `Validation` (every failing input at once) or a storage
/// error.
pub async fn create_certificate<S: DocumentStore>(
    db: &DatabaseConnection,
    store: &S,
    land_id: i64,
    input: CertificateInput,
    document: UploadedDocument,
) -> Result<CertificateModel> {
    if Land::find_by_id(land_id).one(db).await?.is_none() {
        return Err(Error::LandNotFound { id: land_id });
    }
    check(&input, Some(&document))?;

    let file_name = stored_file_name(&input, &document);
    let (file_type, file_size) = document_metadata(&document)?;
    let now = chrono::Utc::now();
    let model = certificate::ActiveModel {
        land_id: Set(land_id),
        certificate_number: Set(input.certificate_number.trim().to_string()),
        description: Set(description(&input)),
        file_path: Set(file_name.clone()),
        file_name: Set(file_name.clone()),
        file_type: Set(file_type),
        file_size: Set(file_size),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    // The store path needs the row id; the row is rolled back if the write fails.
    let txn = db.begin().await?;
    let inserted = model.insert(&txn).await?;
    let path = write_document(store, land_id, inserted.id, &file_name, &document).await?;
    let mut stored: certificate::ActiveModel = inserted.into();
    stored.file_path = Set(path);
    let created = stored.update(&txn).await?;
    txn.commit().await?;
    info!(
        "Created certificate {} for land {} ({} bytes)",
        created.id, land_id, created.file_size
    );
    Ok(created)
}

/// Updates a certificate's metadata, replacing its document when a new one is given.
/// The previous document is removed before the new one is written.
///
/// # Errors
/// Returns `CertificateNotFound`, `Validation` or a storage error.
pub async fn update_certificate<S: DocumentStore>(
    db: &DatabaseConnection,
    store: &S,
    land_id: i64,
    certificate_id: i64,
    input: CertificateInput,
    document: Option<UploadedDocument>,
) -> Result<CertificateModel> {
    let existing = get_certificate(db, land_id, certificate_id).await?;
    check(&input, document.as_ref())?;

    let old_path = existing.file_path.clone();
    let mut model: certificate::ActiveModel = existing.into();
    model.certificate_number = Set(input.certificate_number.trim().to_string());
    model.description = Set(description(&input));

    if let Some(document) = document {
        store.delete(&old_path).await?;
        let file_name = stored_file_name(&input, &document);
        let (file_type, file_size) = document_metadata(&document)?;
        let path = write_document(store, land_id, certificate_id, &file_name, &document).await?;
        model.file_path = Set(path);
        model.file_name = Set(file_name);
        model.file_type = Set(file_type);
        model.file_size = Set(file_size);
    }
    model.updated_at = Set(chrono::Utc::now());

    let updated = model.update(db).await?;
    info!("Updated certificate {}", updated.id);
    Ok(updated)
}

/// Deletes a certificate and its stored document.
///
/// # Errors
/// Returns `CertificateNotFound` or a storage error.
pub async fn delete_certificate<S: DocumentStore>(
    db: &DatabaseConnection,
    store: &S,
    land_id: i64,
    certificate_id: i64,
) -> Result<()> {
    let existing = get_certificate(db, land_id, certificate_id).await?;
    Certificate::delete_by_id(existing.id).exec(db).await?;
    store.delete(&existing.file_path).await?;
    info!("Deleted certificate {}", certificate_id);
    Ok(())
}

/// Loads a certificate together with its document content.
///
/// # Errors
/// Returns `CertificateNotFound` if the certificate or its document is missing.
pub async fn read_certificate_document<S: DocumentStore>(
    db: &DatabaseConnection,
    store: &S,
    land_id: i64,
    certificate_id: i64,
) -> Result<(CertificateModel, Vec<u8>)> {
    let found = get_certificate(db, land_id, certificate_id).await?;
    match store.get(&found.file_path).await? {
        Some(bytes) => Ok((found, bytes)),
        None => {
            warn!(
                "Document '{}' of certificate {} is missing",
                found.file_path, certificate_id
            );
            Err(Error::CertificateNotFound { id: certificate_id })
        }
    }
}
