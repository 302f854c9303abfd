//! Whisper model registry and on-disk path resolution.
//!
//! [`WHISPER_MODELS`] lists the multilingual GGML builds the settings may name
//! in `stt.model`.  [`ModelPaths`] maps one to its file under
//! [`AppPaths::models_dir`].

use std::path::PathBuf;

use crate::config::AppPaths;

/// A GGML model the settings can select.
#[derive(Debug)]
pub struct ModelInfo {
    /// Identifier used in `SttConfig::model` (e.g. `"whisper-base"`).
    pub id: &'static str,
    /// File name under the models directory (e.g. `"ggml-base.bin"`).
    pub file_name: &'static str,
}

pub const WHISPER_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "whisper-tiny",
        file_name: "ggml-tiny.bin",
    },
    ModelInfo {
        id: "whisper-base",
        file_name: "ggml-base.bin",
    },
    ModelInfo {
        id: "whisper-small",
        file_name: "ggml-small.bin",
    },
    ModelInfo {
        id: "whisper-medium",
        file_name: "ggml-medium.bin",
    },
];

/// Find a [`ModelInfo`] by its `id` string.
pub fn find_model_by_id(id: &str) -> Option<&'static ModelInfo> {
    WHISPER_MODELS.iter().find(|m| m.id == id)
}

/// Resolves the on-disk location of model files.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub models_dir: PathBuf,
}

impl ModelPaths {
    pub fn from_app_paths(app_paths: &AppPaths) -> Self {
        Self {
            models_dir: app_paths.models_dir.clone(),
        }
    }

    pub fn model_path(&self, model: &ModelInfo) -> PathBuf {
        self.models_dir.join(model.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_and_files_are_unique() {
        let mut ids: Vec<_> = WHISPER_MODELS.iter().map(|m| m.id).collect();
        let mut files: Vec<_> = WHISPER_MODELS.iter().map(|m| m.file_name).collect();
        ids.sort_unstable();
        ids.dedup();
        files.sort_unstable();
        files.dedup();
        assert_eq!(ids.len(), WHISPER_MODELS.len());
        assert_eq!(files.len(), WHISPER_MODELS.len());
    }

    #[test]
    fn default_model_resolves_under_models_dir() {
        let default_id = crate::config::SttConfig::default().model;
        let model = find_model_by_id(&default_id).expect("default model must exist");

        let paths = ModelPaths {
            models_dir: PathBuf::from("/data/models"),
        };
        assert_eq!(
            paths.model_path(model),
            PathBuf::from("/data/models/ggml-base.bin")
        );
    }

    #[test]
    fn unknown_id_is_none() {
        assert!(find_model_by_id("whisper-large-v9").is_none());
    }
}
