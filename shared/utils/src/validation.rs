use crate::error::{FinRiskError, FinRiskResult};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

pub fn validate_model<T: Validate>(model: &T) -> FinRiskResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(FinRiskError::validation("model", error_messages))
        }
    }
}

/// Flattens validation errors, including nested structs and struct-level
/// checks, into one message. Custom messages win over generic ones.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages("", errors, &mut messages);
    messages.sort();
    messages.join(", ")
}

fn collect_messages(prefix: &str, errors: &ValidationErrors, messages: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = match (prefix.is_empty(), *field) {
            (_, "__all__") => prefix.to_string(),
            (true, _) => field.to_string(),
            (false, _) => format!("{}.{}", prefix, field),
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = match (&error.message, &*error.code) {
                        (Some(message), _) => message.to_string(),
                        (None, "length") => {
                            format!("Length validation failed for field '{}'", path)
                        }
                        (None, "range") => format!("Value out of range for field '{}'", path),
                        (None, "required") => format!("Field '{}' is required", path),
                        (None, code) => {
                            format!("Validation failed for field '{}': {}", path, code)
                        }
                    };
                    messages.push(message);
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(&path, nested, messages),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_messages(&format!("{}[{}]", path, index), nested, messages);
                }
            }
        }
    }
}

pub fn validate_file_type(file_name: &str, allowed_types: &[&str]) -> FinRiskResult<()> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if !allowed_types.contains(&extension.to_lowercase().as_str()) {
        return Err(FinRiskError::validation(
            "file_type",
            format!(
                "File type '{}' not allowed. Allowed types: {}",
                extension,
                allowed_types.join(", ")
            ),
        ));
    }

    Ok(())
}

pub fn validate_file_size(file_size: u64, max_size: u64) -> FinRiskResult<()> {
    if file_size == 0 {
        return Err(FinRiskError::validation("file_size", "File is empty"));
    }
    if file_size > max_size {
        return Err(FinRiskError::validation(
            "file_size",
            format!(
                "File size {} bytes exceeds maximum allowed size {} bytes",
                file_size, max_size
            ),
        ));
    }

    Ok(())
}

/// Upload rules enforced by the workflow that hands documents to the
/// pipeline. The pipeline itself accepts any byte buffer.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub allowed_extensions: Vec<String>,
    pub max_size_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["pdf".to_string()],
            max_size_bytes: 20 * 1024 * 1024, // 20MB
        }
    }
}

impl UploadPolicy {
    pub fn check(&self, file_name: &str, size_bytes: u64) -> FinRiskResult<()> {
        let allowed: Vec<&str> = self.allowed_extensions.iter().map(String::as_str).collect();
        validate_file_type(file_name, &allowed)?;
        validate_file_size(size_bytes, self.max_size_bytes)
    }
}
