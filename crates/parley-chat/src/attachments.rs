use std::path::{Path, PathBuf};

use parley_types::{Attachment, ParleyError, Result};

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Guess a media type from content, then from the file extension.
pub fn guess_media_type(bytes: Option<&[u8]>, path: &Path) -> String {
    if let Some(kind) = bytes.and_then(infer::get) {
        return kind.mime_type().to_string();
    }
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MEDIA_TYPE)
        .to_string()
}

/// One file waiting on the tray. Only metadata is held until send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayEntry {
    pub id: u32,
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub media_type: String,
}

/// Files dropped onto the input area, pending the next send.
#[derive(Debug, Default)]
pub struct AttachmentTray {
    next_id: u32,
    entries: Vec<TrayEntry>,
}

impl AttachmentTray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dropped file. Directories and missing paths are rejected.
    pub async fn add(&mut self, path: impl AsRef<Path>) -> Result<&TrayEntry> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| attachment_error(path, e))?;
        if !metadata.is_file() {
            return Err(ParleyError::AttachmentError {
                path: path.display().to_string(),
                message: "not a regular file".into(),
            });
        }

        self.next_id += 1;
        let entry = TrayEntry {
            id: self.next_id,
            path: path.to_path_buf(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            size: metadata.len(),
            media_type: guess_media_type(None, path),
        };
        tracing::debug!(id = entry.id, path = %entry.path.display(), "attachment added");
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Remove an entry before sending. Returns `false` for unknown ids.
    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Read every entry fully, in tray order.
    pub async fn read_all(&self) -> Result<Vec<Attachment>> {
        let mut attachments = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let data = tokio::fs::read(&entry.path)
                .await
                .map_err(|e| attachment_error(&entry.path, e))?;
            let media_type = guess_media_type(Some(data.as_slice()), &entry.path);
            attachments.push(Attachment::new(entry.name.clone(), media_type, data));
        }
        Ok(attachments)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[TrayEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn attachment_error(path: &Path, e: std::io::Error) -> ParleyError {
    ParleyError::AttachmentError {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
