//! Which filesystem the disk usage fields report on.

use std::path::{Path, PathBuf};

/// Picks the filesystem root the sampler reports usage for.
pub trait RootPathPolicy: Send + Sync {
    fn root_path(&self) -> PathBuf;
}

/// Always the configured path.
#[derive(Debug, Clone)]
pub struct FixedRoot(pub PathBuf);

impl RootPathPolicy for FixedRoot {
    fn root_path(&self) -> PathBuf {
        self.0.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// The volume the running executable lives on (Windows), `/` elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct ExecutableVolume {
    platform: Platform,
}

impl ExecutableVolume {
    pub fn for_platform(platform: Platform) -> Self {
        Self { platform }
    }
}

impl RootPathPolicy for ExecutableVolume {
    fn root_path(&self) -> PathBuf {
        let exe = std::env::current_exe()
            .and_then(std::path::absolute)
            .ok();
        volume_root(self.platform, exe.as_deref())
    }
}

/// Root of the volume holding `exe`.
///
/// On Windows this is the upper-cased drive (`d:\bin\x.exe` → `D:\`), with
/// `C:\` when the path is unknown or has no drive prefix.
pub fn volume_root(platform: Platform, exe: Option<&Path>) -> PathBuf {
    match platform {
        Platform::Unix => PathBuf::from("/"),
        Platform::Windows => {
            let drive = exe.and_then(|p| {
                let s = p.to_string_lossy();
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(letter), Some(':')) if letter.is_ascii_alphabetic() => {
                        Some(letter.to_ascii_uppercase())
                    }
                    _ => None,
                }
            });
            PathBuf::from(format!("{}:\\", drive.unwrap_or('C')))
        }
    }
}

/// Startup selection: a configured path wins, else the platform default.
pub fn root_policy(configured: Option<&Path>) -> Box<dyn RootPathPolicy> {
    match configured {
        Some(path) => Box::new(FixedRoot(path.to_path_buf())),
        None => Box::new(ExecutableVolume::for_platform(Platform::current())),
    }
}
