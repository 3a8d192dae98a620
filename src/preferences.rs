//! 界面偏好（主题）持久化模块
//!
//! # 设计思路
//!
//! 只保存一项偏好：浅色 / 深色主题。存储是尽力而为的，
//! 读写失败仅记录日志，不影响压缩流程。
//!
//! # 实现思路
//!
//! - 以 JSON 文件保存 `{"theme": "dark"}`。
//! - `load` 在文件缺失或内容无效时返回 `None`，由界面回退到默认主题。
//! - `save` 自动创建父目录，失败返回 `AppError`；`save_best_effort` 只记录警告。

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 界面主题。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// 切换到另一种主题。
    pub fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(AppError::Storage(format!("未知主题: {}", other))),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PreferencesFile {
    theme: Theme,
}

/// 主题偏好存储。
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取已保存的主题；缺失或无效时返回 `None`。
    pub fn load(&self) -> Option<Theme> {
        if !self.path.exists() {
            return None;
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("⚠️ 读取主题偏好失败 '{}': {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<PreferencesFile>(&content) {
            Ok(prefs) => Some(prefs.theme),
            Err(e) => {
                log::warn!("⚠️ 解析主题偏好失败 '{}': {}", self.path.display(), e);
                None
            }
        }
    }

    /// 读取主题，没有保存过时使用默认主题。
    pub fn load_or_default(&self) -> Theme {
        self.load().unwrap_or_default()
    }

    /// 保存主题。
    pub fn save(&self, theme: Theme) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    AppError::Storage(format!("创建偏好目录 '{}' 失败: {}", parent.display(), e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(&PreferencesFile { theme })
            .map_err(|e| AppError::Storage(format!("序列化偏好失败: {}", e)))?;

        fs::write(&self.path, content)?;
        log::debug!("🎨 主题偏好已保存: {}", theme);
        Ok(())
    }

    /// 保存主题，失败只记录警告。
    pub fn save_best_effort(&self, theme: Theme) {
        if let Err(e) = self.save(theme) {
            log::warn!("⚠️ 保存主题偏好失败: {}", e);
        }
    }

    /// 切换并保存主题，返回切换后的主题。
    pub fn toggle(&self) -> Theme {
        let next = self.load_or_default().toggle();
        self.save_best_effort(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_parsing_and_toggle() {
        assert_eq!("Dark".parse::<Theme>().expect("parse failed"), Theme::Dark);
        assert!("blue".parse::<Theme>().is_err());
        assert_eq!(Theme::Light.toggle(), Theme::Dark);
        assert_eq!(Theme::Dark.toggle().toggle(), Theme::Dark);
    }

    #[test]
    fn missing_file_loads_none() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let store = ThemeStore::new(dir.path().join("prefs.json"));
        assert_eq!(store.load(), None);
        assert_eq!(store.load_or_default(), Theme::Light);
    }

    #[test]
    fn save_then_load_and_toggle() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let store = ThemeStore::new(dir.path().join("nested").join("prefs.json"));

        store.save(Theme::Dark).expect("save failed");
        assert_eq!(store.load(), Some(Theme::Dark));

        assert_eq!(store.toggle(), Theme::Light);
        assert_eq!(store.load(), Some(Theme::Light));
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{ not json").expect("write failed");

        let store = ThemeStore::new(&path);
        assert_eq!(store.load(), None);
        assert_eq!(store.toggle(), Theme::Dark);
    }

    #[test]
    fn unwritable_location_is_best_effort() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").expect("write failed");

        // 父路径是普通文件，无法创建目录
        let store = ThemeStore::new(blocker.join("prefs.json"));
        assert!(store.save(Theme::Dark).is_err());
        store.save_best_effort(Theme::Dark);
        assert_eq!(store.load(), None);
    }
}
