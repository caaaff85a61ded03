use axum::extract::Multipart;
use std::collections::HashMap;

use super::UploadError;
use crate::error::ApiError;

/// Constraints for one multipart file field
#[derive(Debug, Clone, Copy)]
pub struct FileField {
    pub name: &'static str,
    pub accept: &'static [&'static str],
    pub max_count: usize,
    pub max_bytes: usize,
}

/// File fields a form may carry; text fields are always accepted
#[derive(Debug, Clone, Copy)]
pub struct FormSpec {
    pub files: &'static [FileField],
}

impl FormSpec {
    fn file_field(&self, name: &str) -> Option<&FileField> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Upper bound for the whole request body
    pub fn body_limit(&self) -> usize {
        const TEXT_FIELDS_SLACK: usize = 1024 * 1024;
        self.files
            .iter()
            .map(|f| f.max_bytes * f.max_count)
            .sum::<usize>()
            + TEXT_FIELDS_SLACK
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
}

impl FormData {
    /// Trimmed text value; blank counts as absent
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn take_files(&mut self, field: &str) -> Vec<UploadedFile> {
        let (taken, rest) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.field == field);
        self.files = rest;
        taken
    }

    pub fn has_files(&self, field: &str) -> bool {
        self.files.iter().any(|f| f.field == field)
    }
}

/// Drain a multipart body, enforcing type, count and size limits per file field.
pub async fn read_form(mut multipart: Multipart, spec: &FormSpec) -> Result<FormData, ApiError> {
    let mut form = FormData::default();
    let mut counts: HashMap<&'static str, usize> = HashMap::new();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(rule) = spec.file_field(&name) else {
            if field.file_name().is_some() {
                return Err(UploadError::UnexpectedField(name).into());
            }
            let value = field.text().await?;
            form.fields.insert(name, value);
            continue;
        };

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if data.len() + chunk.len() > rule.max_bytes {
                return Err(UploadError::TooLarge {
                    file_name,
                    limit_bytes: rule.max_bytes,
                }
                .into());
            }
            data.extend_from_slice(&chunk);
        }

        // Browsers post an empty part for an untouched file input
        if data.is_empty() && file_name.is_empty() {
            continue;
        }

        if !rule.accept.contains(&content_type.as_str()) {
            return Err(UploadError::UnsupportedType {
                field: name,
                content_type,
            }
            .into());
        }

        let count = counts.entry(rule.name).or_default();
        *count += 1;
        if *count > rule.max_count {
            return Err(UploadError::TooManyFiles {
                field: name,
                max: rule.max_count,
            }
            .into());
        }

        tracing::debug!("Received file '{}' ({} bytes) in field '{}'", file_name, data.len(), name);
        form.files.push(UploadedFile {
            field: name,
            file_name,
            content_type,
            data,
        });
    }

    Ok(form)
}
