//! Multipart upload parsing shared by the asset endpoints.

use std::collections::HashMap;

use axum::extract::Multipart;
use explainer_pipeline::PipelineResult;

use crate::error::{ApiError, ApiResult};

/// The single `file` part of an upload.
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Text fields plus the uploaded file.
pub struct UploadForm {
    fields: HashMap<String, String>,
    pub file: UploadedFile,
}

impl UploadForm {
    /// Read every part. The file name is checked with `validate_name` before
    /// the file body is read.
    pub async fn read(
        mut multipart: Multipart,
        validate_name: fn(&str) -> PipelineResult<String>,
    ) -> ApiResult<Self> {
        let mut fields = HashMap::new();
        let mut file = None;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                let filename = field.file_name().unwrap_or("").to_string();
                validate_name(&filename)?;
                let bytes = field.bytes().await?;
                file = Some(UploadedFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            } else if !name.is_empty() {
                fields.insert(name, field.text().await?);
            }
        }

        let file = file.ok_or_else(|| ApiError::bad_request("Missing required 'file' field"))?;
        Ok(Self { fields, file })
    }

    /// A non-blank text field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, name: &str) -> ApiResult<&str> {
        self.field(name)
            .ok_or_else(|| ApiError::bad_request(format!("Missing required '{name}' field")))
    }

    /// Optional field parsed with `FromStr`; a present but invalid value is an error.
    pub fn parsed<T>(&self, name: &str) -> ApiResult<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.field(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| ApiError::bad_request(format!("Invalid '{name}': {e}")))
            })
            .transpose()
    }
}
