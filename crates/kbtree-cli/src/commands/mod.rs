//! CLI commands

pub mod abundance;
pub mod query;
pub mod tree;

use std::collections::HashMap;
use std::io::Read;

use kbtree_sdk::{AuthToken, HttpIdentityProvider, TreeClient};

use crate::{config::Config, CliError};

/// Credentials gathered from flags and the environment
#[derive(Default)]
pub struct Credentials {
    pub token: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Build a client from config and credentials
///
/// A token wins over a user login; with neither the client is anonymous.
pub async fn connect(config: &Config, credentials: &Credentials) -> Result<TreeClient, CliError> {
    let client = match (&credentials.token, &credentials.user) {
        (Some(token), _) => TreeClient::with_token(&config.url, AuthToken::new(token.as_str()))?,
        (None, Some(user)) => {
            let password = credentials.password.as_deref().ok_or_else(|| {
                CliError::InvalidInput("KB_PASSWORD must be set when logging in with --user".to_string())
            })?;
            let provider = HttpIdentityProvider::new(&config.auth_url);
            TreeClient::with_credentials_via(&config.url, user, password, &provider).await?
        }
        (None, None) => TreeClient::new(&config.url)?,
    };

    client.set_read_timeout(config.read_timeout_ms);
    client.set_auth_allowed_for_http(config.auth_allowed_for_http);
    tracing::debug!(url = %config.url, "client ready");
    Ok(client)
}

/// Resolve a tree argument: `@path` reads a file, `-` reads stdin,
/// anything else is the newick string itself
pub fn read_tree(arg: &str) -> Result<String, CliError> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf.trim_end().to_string());
    }
    match arg.strip_prefix('@') {
        Some(path) => Ok(std::fs::read_to_string(path)?.trim_end().to_string()),
        None => Ok(arg.to_string()),
    }
}

/// Parse repeated `key=value` arguments into a map
pub fn parse_pairs(pairs: &[String]) -> Result<HashMap<String, String>, CliError> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| CliError::InvalidInput(format!("expected key=value, got '{}'", pair)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let map = parse_pairs(&["A=alpha".to_string(), "B=x=y".to_string()]).unwrap();
        assert_eq!(map["A"], "alpha");
        assert_eq!(map["B"], "x=y");
    }

    #[test]
    fn test_parse_pairs_rejects_bare_key() {
        let err = parse_pairs(&["A".to_string()]).unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }

    #[test]
    fn test_read_tree_literal_and_file() {
        assert_eq!(read_tree("(A,B);").unwrap(), "(A,B);");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.nwk");
        std::fs::write(&path, "((A,B),C);\n").unwrap();
        let arg = format!("@{}", path.display());
        assert_eq!(read_tree(&arg).unwrap(), "((A,B),C);");
    }

    #[test]
    fn test_read_tree_missing_file() {
        assert!(matches!(read_tree("@/nonexistent/tree.nwk"), Err(CliError::Io(_))));
    }

    #[test]
    fn test_credentials_debug_redacts() {
        let creds = Credentials {
            token: Some("secret-token".to_string()),
            user: Some("alice".to_string()),
            password: Some("hunter2".to_string()),
        };
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("secret-token"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("alice"));
    }
}
