// SPDX-License-Identifier: GPL-3.0-only
//! Input validation for Lexfix protocol messages
//!
//! Every request reaching the daemon passes through here before any
//! scoring work is done, so oversized or malformed input is refused early.

use serde_json::Value;

/// Maximum allowed sizes for the data types carried by the protocol
pub mod limits {
    /// Maximum length of a transcript or target phrase (bytes)
    pub const MAX_UTTERANCE_LENGTH: usize = 1024;

    /// Maximum string length for text fields like `client_id`
    pub const MAX_STRING_LENGTH: usize = 1024;

    /// Maximum length for command names
    pub const MAX_NAME_LENGTH: usize = 256;

    /// Highest pass threshold a client may set
    pub const MAX_PASS_THRESHOLD: u64 = 100;

    /// Maximum JSON value depth to prevent stack overflow
    pub const MAX_JSON_DEPTH: usize = 10;

    /// Maximum size of JSON data fields (bytes)
    pub const MAX_JSON_SIZE: usize = 64 * 1024; // 64KB
}

/// Fallback socket location when the runtime directory is unusable
pub const FALLBACK_SOCKET_PATH: &str = "/tmp/lexfix/lexfix.sock";

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("String too long: {len} > {max} bytes")]
    StringTooLong { len: usize, max: usize },

    #[error("Invalid confidence: {value} (must be within 0-1)")]
    InvalidConfidence { value: f64 },

    #[error("Invalid pass threshold: {value} (must be 0-{max})")]
    InvalidPassThreshold { value: u64, max: u64 },

    #[error("JSON data too large: {size} > {max} bytes")]
    JsonTooLarge { size: usize, max: usize },

    #[error("JSON nesting too deep: {depth} > {max}")]
    JsonTooDeep { depth: usize, max: usize },

    #[error("Empty required field: {field}")]
    EmptyField { field: String },

    #[error("Invalid character in field '{field}': contains control characters")]
    InvalidCharacters { field: String },
}

/// Trait for validating protocol message components
pub trait Validate {
    /// Validate the component and return a detailed error if invalid
    ///
    /// # Errors
    /// Returns a [`ValidationError`] variant describing the specific
    /// validation failure when the input is not acceptable.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Validate string fields with length and character restrictions
///
/// # Errors
/// Returns [`ValidationError::StringTooLong`] when `value` exceeds `max_length`,
/// or [`ValidationError::InvalidCharacters`] when control characters are found.
pub fn validate_string(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> Result<(), ValidationError> {
    if value.len() > max_length {
        return Err(ValidationError::StringTooLong {
            len: value.len(),
            max: max_length,
        });
    }

    if value
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(ValidationError::InvalidCharacters {
            field: field_name.to_string(),
        });
    }

    Ok(())
}

/// Validate optional string fields
///
/// # Errors
/// Propagates errors from [`validate_string`] when `value` is `Some` and
/// validation fails.
pub fn validate_optional_string(
    value: &Option<String>,
    field_name: &str,
    max_length: usize,
) -> Result<(), ValidationError> {
    if let Some(s) = value {
        validate_string(s, field_name, max_length)?;
    }
    Ok(())
}

/// Validate a recognizer confidence
///
/// # Errors
/// Returns [`ValidationError::InvalidConfidence`] if `confidence` is NaN or
/// outside `[0, 1]`.
pub fn validate_confidence(confidence: f64) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ValidationError::InvalidConfidence { value: confidence });
    }
    Ok(())
}

/// Validate a pass threshold sent by a client
///
/// # Errors
/// Returns [`ValidationError::InvalidPassThreshold`] if `threshold` is above
/// [`limits::MAX_PASS_THRESHOLD`].
pub fn validate_pass_threshold(threshold: u64) -> Result<(), ValidationError> {
    if threshold > limits::MAX_PASS_THRESHOLD {
        return Err(ValidationError::InvalidPassThreshold {
            value: threshold,
            max: limits::MAX_PASS_THRESHOLD,
        });
    }
    Ok(())
}

/// Validate JSON data size and complexity
///
/// # Errors
/// Returns:
/// - [`ValidationError::JsonTooLarge`] if the serialized size exceeds
///   [`limits::MAX_JSON_SIZE`].
/// - [`ValidationError::JsonTooDeep`] if the nesting depth exceeds
///   [`limits::MAX_JSON_DEPTH`].
pub fn validate_json_value(value: &Value) -> Result<(), ValidationError> {
    let serialized = serde_json::to_vec(value).map_err(|_| ValidationError::JsonTooLarge {
        size: 0,
        max: limits::MAX_JSON_SIZE,
    })?;

    if serialized.len() > limits::MAX_JSON_SIZE {
        return Err(ValidationError::JsonTooLarge {
            size: serialized.len(),
            max: limits::MAX_JSON_SIZE,
        });
    }

    check_depth(value, 0, limits::MAX_JSON_DEPTH)?;

    Ok(())
}

/// Validate command strings to prevent injection
///
/// # Errors
/// Returns [`ValidationError::InvalidCharacters`] if the command contains
/// disallowed characters, or any error returned by [`validate_string`].
pub fn validate_command(command: &str) -> Result<(), ValidationError> {
    validate_string(command, "command", limits::MAX_NAME_LENGTH)?;

    if command.is_empty() {
        return Err(ValidationError::EmptyField {
            field: "command".to_string(),
        });
    }

    // Only allow alphanumeric characters, underscores, and hyphens
    if !command
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::InvalidCharacters {
            field: "command".to_string(),
        });
    }

    Ok(())
}

/// Generate a unique client ID
///
/// Format: `{component}-{pid}-{timestamp}-{uuid}`
#[must_use]
pub fn generate_secure_client_id(component: &str) -> String {
    let pid = std::process::id();
    let uuid = uuid::Uuid::new_v4();
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or(std::time::Duration::ZERO)
        .as_nanos();
    format!("{component}-{pid}-{timestamp}-{uuid}")
}

/// Get the daemon socket path under `XDG_RUNTIME_DIR`
///
/// Falls back to [`FALLBACK_SOCKET_PATH`] when the runtime directory is
/// empty, too long, contains traversal segments or null bytes, or lies
/// outside `/run/user/` and `/tmp/`.
#[must_use]
pub fn get_secure_socket_path() -> std::path::PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .unwrap_or_else(|_| format!("/run/user/{}", unsafe { libc::getuid() }));
    socket_path_in(&runtime_dir)
}

fn socket_path_in(runtime_dir: &str) -> std::path::PathBuf {
    let fallback = || std::path::PathBuf::from(FALLBACK_SOCKET_PATH);

    if runtime_dir.is_empty() || runtime_dir.len() > 256 {
        log::warn!("Invalid XDG_RUNTIME_DIR length, using fallback");
        return fallback();
    }

    if runtime_dir.contains("..") || runtime_dir.contains('\0') {
        log::warn!("Potential path traversal in XDG_RUNTIME_DIR, using fallback");
        return fallback();
    }

    if !runtime_dir.starts_with("/run/user/") && !runtime_dir.starts_with("/tmp/") {
        log::warn!("XDG_RUNTIME_DIR outside allowed directories: {runtime_dir}, using fallback");
        return fallback();
    }

    let path = std::path::PathBuf::from(runtime_dir)
        .join("lexfix")
        .join("lexfix.sock");

    if let Ok(canonical) = path.canonicalize() {
        if !canonical.starts_with("/run/user/") && !canonical.starts_with("/tmp/") {
            log::warn!("Canonical socket path outside allowed directories, using fallback");
            return fallback();
        }
        canonical
    } else {
        // Not created yet
        path
    }
}

fn check_depth(
    value: &Value,
    current_depth: usize,
    max_depth: usize,
) -> Result<(), ValidationError> {
    if current_depth > max_depth {
        return Err(ValidationError::JsonTooDeep {
            depth: current_depth,
            max: max_depth,
        });
    }

    match value {
        Value::Object(obj) => {
            for v in obj.values() {
                check_depth(v, current_depth + 1, max_depth)?;
            }
        }
        Value::Array(arr) => {
            for v in arr {
                check_depth(v, current_depth + 1, max_depth)?;
            }
        }
        _ => {}
    }

    Ok(())
}
