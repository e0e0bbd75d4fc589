use crate::data_dir::{ensure_dir, persistent_dir};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

const PAYMENT_REQUEST_FILE: &str = "payment_request.json";

/// A generated address together with what the payer was asked for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentRequestRecord {
    pub address: String,
    pub amount: String,
    pub label: String,
    pub msg: String,
}

/// On-disk shape: `{"data": [record, ...]}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PaymentRequestDocument {
    #[serde(default)]
    data: Vec<PaymentRequestRecord>,
}

/// Append-only list of payment requests backed by one JSON document.
///
/// Every append reads the whole document and rewrites it through a temp file
/// and rename, so readers never see a partially written file.
pub struct PaymentRequestStore {
    path: PathBuf,
}

impl PaymentRequestStore {
    /// Store at `<data_dir>/persistent/payment_request.json`. Nothing is
    /// touched on disk until the first append.
    pub fn open(data_dir: &Path) -> Self {
        Self {
            path: persistent_dir(data_dir).join(PAYMENT_REQUEST_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records. A missing or empty document is an empty list.
    pub fn load(&self) -> Result<Vec<PaymentRequestRecord>> {
        Ok(self.read_document()?.data)
    }

    /// Append `record` and persist. Returns the number of stored records.
    pub fn append(&self, record: PaymentRequestRecord) -> Result<usize> {
        let mut doc = self.read_document()?;
        doc.data.push(record);
        self.write_document(&doc)?;
        tracing::debug!(path = %self.path.display(), count = doc.data.len(), "payment request stored");
        Ok(doc.data.len())
    }

    fn read_document(&self) -> Result<PaymentRequestDocument> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PaymentRequestDocument::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read {}", self.path.display()));
            }
        };
        if contents.trim().is_empty() {
            return Ok(PaymentRequestDocument::default());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("invalid {}", self.path.display()))
    }

    fn write_document(&self, doc: &PaymentRequestDocument) -> Result<()> {
        let dir = self
            .path
            .parent()
            .context("payment request path has no parent directory")?;
        ensure_dir(dir)?;

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        doc.serialize(&mut ser)?;
        buf.push(b'\n');

        // Write to a sibling temp file first, then atomically rename.
        let mut staging = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
        staging
            .write_all(&buf)
            .context("failed to write payment requests")?;
        staging
            .as_file()
            .sync_all()
            .context("failed to sync payment requests")?;
        staging
            .persist(&self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
