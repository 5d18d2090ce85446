use std::path::{Path, PathBuf};

use crate::{Res, types::Token};

/// Reads and writes the persisted token file.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored token. A missing file yields an empty token; a file
    /// that exists but can't be read or parsed is an error.
    pub async fn load(&self) -> Res<Token> {
        if !self.path.exists() {
            return Ok(Token::default());
        }

        let content = async_fs::read_to_string(&self.path).await?;
        let token: Token = toml::from_str(&content)?;
        Ok(token)
    }

    /// Writes `token`, creating parent directories as needed.
    pub async fn persist(&self, token: &Token) -> Res<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string(token)?;
        async_fs::write(&self.path, content).await?;
        Ok(())
    }
}
