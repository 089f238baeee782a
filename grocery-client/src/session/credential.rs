// grocery-client/src/session/credential.rs
// 会话缓存 - JSON 文件存储

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default file name of the session cache inside the cache directory
pub const SESSION_FILE: &str = "session.json";

/// Durable part of a session. The access token is never written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub device_id: String,
    pub refresh_token: String,
}

impl Credential {
    pub fn new(device_id: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// 凭证存储
#[derive(Debug, Clone)]
pub struct CredentialStorage {
    path: PathBuf,
}

impl CredentialStorage {
    /// 创建凭证存储
    pub fn new(base_path: impl Into<PathBuf>, filename: &str) -> Self {
        let path = base_path.into().join(filename);
        Self { path }
    }

    /// 确保目录存在
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Save the credential. Written to a sibling file then renamed, so a
    /// reader sees either the old record or the new one.
    pub fn save(&self, credential: &Credential) -> std::io::Result<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(credential)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)
    }

    /// 加载凭证. Unreadable or corrupt records count as absent.
    pub fn load(&self) -> Option<Credential> {
        if !self.path.exists() {
            return None;
        }
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Session cache unreadable");
                return None;
            }
        };
        match serde_json::from_str::<Credential>(&json) {
            Ok(credential) if !credential.refresh_token.is_empty() => Some(credential),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Session cache corrupt");
                None
            }
        }
    }

    /// 检查凭证是否存在
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// 删除凭证
    pub fn delete(&self) -> std::io::Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    /// 获取路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}
