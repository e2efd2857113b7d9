//! Token storage implementation
//!
//! The token is created once with owner-only permissions and read back on
//! every client construction. It is never rotated automatically.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use uuid::Uuid;

use crate::errors::{AuthError, AuthResult};

/// File permissions for the token file (Unix only) - owner read/write only
#[cfg(unix)]
const TOKEN_FILE_PERMISSIONS: u32 = 0o600;

/// Generate a fresh token
pub fn generate_token() -> String {
    Uuid::new_v4().to_string()
}

/// Read the token at `path`, creating it on first run
pub fn load_or_create_token(path: &Path) -> AuthResult<String> {
    let storage_error = |source| AuthError::TokenStorage {
        path: path.to_path_buf(),
        source,
    };

    if path.exists() {
        let token = fs::read_to_string(path).map_err(storage_error)?;
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::EmptyToken {
                path: path.to_path_buf(),
            });
        }
        tracing::debug!("Loaded auth token from {}", path.display());
        return Ok(token.to_string());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(storage_error)?;
    }

    let token = generate_token();
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(storage_error)?;
    file.write_all(token.as_bytes()).map_err(storage_error)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file.metadata().map_err(storage_error)?.permissions();
        perms.set_mode(TOKEN_FILE_PERMISSIONS);
        file.set_permissions(perms).map_err(storage_error)?;
    }

    tracing::info!("Generated new auth token at {}", path.display());
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_token_created_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("token.key");

        let first = load_or_create_token(&path).unwrap();
        assert!(path.exists());
        assert!(Uuid::parse_str(&first).is_ok());

        let second = load_or_create_token(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_token_is_trimmed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token.key");
        fs::write(&path, "abc-123\n").unwrap();

        assert_eq!(load_or_create_token(&path).unwrap(), "abc-123");
    }

    #[test]
    fn test_empty_token_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token.key");
        fs::write(&path, "  \n").unwrap();

        assert!(matches!(
            load_or_create_token(&path),
            Err(AuthError::EmptyToken { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_token_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token.key");
        load_or_create_token(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, TOKEN_FILE_PERMISSIONS);
    }

    #[test]
    fn test_generated_tokens_differ() {
        assert_ne!(generate_token(), generate_token());
    }
}
