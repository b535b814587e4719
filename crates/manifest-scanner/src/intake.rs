//! 입력 수집 정책 -- 파일 크기와 확장자 검사 후 매니페스트 텍스트 읽기
//!
//! 파싱은 순수 함수이므로 파일 시스템 접근은 모두 이 모듈에서 끝납니다.

use std::path::Path;

use tracing::debug;

use crate::config::ManifestScannerConfig;
use crate::error::ManifestScannerError;

const UTF8_BOM: char = '\u{feff}';

/// 입력 파일 수집 정책
#[derive(Debug, Clone)]
pub struct IntakePolicy {
    /// 최대 파일 크기 (바이트)
    pub max_file_size: usize,
    /// 허용 확장자 (소문자, 점 없이)
    pub allowed_extensions: Vec<String>,
}

impl IntakePolicy {
    /// 스캐너 설정에서 정책을 생성합니다.
    pub fn from_config(config: &ManifestScannerConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// 확장자가 허용 목록에 있는지 검사합니다 (대소문자 무시).
    pub fn check_extension(&self, path: &Path) -> Result<(), ManifestScannerError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if self.allowed_extensions.iter().any(|a| *a == ext) {
            Ok(())
        } else {
            Err(ManifestScannerError::UnsupportedExtension {
                path: path.display().to_string(),
                allowed: self.allowed_extensions.join(", "),
            })
        }
    }

    /// 파일 크기가 상한 이하인지 검사합니다.
    pub fn check_size(&self, path: &Path, size: u64) -> Result<(), ManifestScannerError> {
        let within = usize::try_from(size).is_ok_and(|s| s <= self.max_file_size);
        if within {
            Ok(())
        } else {
            Err(ManifestScannerError::FileTooBig {
                path: path.display().to_string(),
                size,
                max: self.max_file_size,
            })
        }
    }

    /// 정책을 검사한 뒤 매니페스트 텍스트를 읽습니다.
    ///
    /// 잘못된 UTF-8 바이트는 대체 문자로 바뀌고, 선행 BOM은 제거됩니다.
    pub async fn read_manifest(&self, path: &Path) -> Result<String, ManifestScannerError> {
        self.check_extension(path)?;

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| ManifestScannerError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
        self.check_size(path, metadata.len())?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ManifestScannerError::Io {
                path: path.display().to_string(),
                source: e,
            })?;

        debug!(path = %path.display(), size = bytes.len(), "read manifest");

        let text = String::from_utf8_lossy(&bytes);
        Ok(text
            .strip_prefix(UTF8_BOM)
            .unwrap_or(&*text)
            .to_owned())
    }
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self::from_config(&ManifestScannerConfig::default())
    }
}
