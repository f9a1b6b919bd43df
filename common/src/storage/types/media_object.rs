use std::path::Path;

use bytes::Bytes;
use mime_guess::from_path;
use sha2::{Digest, Sha256};

use crate::stored_object;

stored_object!(MediaObject, "media", {
    file_name: String,
    mime_type: String,
    sha256: String,
    size_bytes: u64
});

impl MediaObject {
    /// Build the record for an accepted upload. The record id is the
    /// content id the blob is stored under, so one lookup resolves both.
    pub fn from_upload(content_id: &str, file_name: Option<String>, data: &Bytes) -> Self {
        let file_name = file_name.unwrap_or_else(|| content_id.to_string());

        let mut hasher = Sha256::new();
        hasher.update(data);
        let digest = hasher.finalize();

        let now = Utc::now();
        Self {
            id: content_id.to_string(),
            created_at: now,
            updated_at: now,
            mime_type: Self::guess_mime_type(Path::new(&file_name)),
            file_name,
            sha256: format!("{digest:x}"),
            size_bytes: data.len() as u64,
        }
    }

    /// Guesses the MIME type based on the file extension.
    fn guess_mime_type(path: &Path) -> String {
        from_path(path)
            .first_or(mime::APPLICATION_OCTET_STREAM)
            .to_string()
    }
}
