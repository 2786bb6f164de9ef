use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::classify::{InputSpec, Preprocessor, Scaling, TensorLayout};
use crate::frame::{ChannelOrder, Color};
use crate::ingest::SourceConfig;
use crate::labels::{DisplayTable, LabelSet, StatusCategory, DEFAULT_LABELS};
use crate::overlay::OverlayStyle;

const DEFAULT_SOURCE_URI: &str = "0";
const DEFAULT_SOURCE_WIDTH: u32 = 1280;
const DEFAULT_SOURCE_HEIGHT: u32 = 720;
const DEFAULT_SOURCE_FPS: u32 = 30;
const DEFAULT_INPUT_SIZE: u32 = 224;
const DEFAULT_SCREENSHOT_EXTENSION: &str = "jpg";
const DEFAULT_WINDOW_TITLE: &str = "Fruit Ripeness Classifier";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AppConfigFile {
    source: Option<SourceConfigFile>,
    model: Option<ModelConfigFile>,
    labels: Option<Vec<LabelConfigFile>>,
    fallback: Option<FallbackConfigFile>,
    overlay: Option<OverlayConfigFile>,
    screenshots: Option<ScreenshotConfigFile>,
    display: Option<DisplayConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    uri: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<PathBuf>,
    input_width: Option<u32>,
    input_height: Option<u32>,
    channel_order: Option<ChannelOrder>,
    layout: Option<TensorLayout>,
    rescales_internally: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct LabelConfigFile {
    id: String,
    text: Option<String>,
    color: Option<Color>,
}

#[derive(Debug, Deserialize, Default)]
struct FallbackConfigFile {
    text: Option<String>,
    color: Option<Color>,
}

#[derive(Debug, Deserialize, Default)]
struct OverlayConfigFile {
    header_opacity: Option<f32>,
    breakdown_opacity: Option<f32>,
    mirror: Option<bool>,
    watermark: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ScreenshotConfigFile {
    dir: Option<PathBuf>,
    extension: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct DisplayConfigFile {
    title: Option<String>,
    show_probabilities: Option<bool>,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub model: ModelSettings,
    pub labels: Vec<LabelSettings>,
    pub fallback: LabelSettings,
    pub overlay: OverlayStyle,
    /// Flip frames horizontally before classification, so the preview acts like a mirror.
    pub mirror: bool,
    pub screenshots: ScreenshotSettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub path: Option<PathBuf>,
    pub input_width: u32,
    pub input_height: u32,
    pub channel_order: ChannelOrder,
    pub layout: TensorLayout,
    /// The model carries its own rescaling layer and wants raw 0..=255 values.
    pub rescales_internally: bool,
}

impl ModelSettings {
    pub fn scaling(&self) -> Scaling {
        Scaling::from_rescales_internally(self.rescales_internally)
    }

    pub fn preprocessor(&self) -> Result<Preprocessor> {
        Preprocessor::new(
            self.input_width,
            self.input_height,
            self.channel_order,
            self.layout,
            self.scaling(),
        )
    }

    /// Input contract for backends built from this configuration.
    pub fn input_spec(&self) -> InputSpec {
        InputSpec {
            width: self.input_width,
            height: self.input_height,
            channel_order: self.channel_order,
            layout: self.layout,
            scaling: Some(self.scaling()),
            num_classes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSettings {
    pub id: String,
    pub text: String,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotSettings {
    pub dir: PathBuf,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    pub title: String,
    pub show_probabilities: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_file(AppConfigFile::default())
    }
}

impl AppConfig {
    /// Load from `path`, or from `RIPENESS_CONFIG` when no path is given, then apply
    /// environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("RIPENESS_CONFIG")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let config_path = path.map(Path::to_path_buf).or(env_path);
        let file_cfg = match config_path.as_deref() {
            Some(path) => {
                log::debug!("reading config from {}", path.display());
                Some(read_config_file(path)?)
            }
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse configuration text. TOML when `is_toml`, JSON otherwise. No environment
    /// overrides are applied.
    pub fn parse(raw: &str, is_toml: bool) -> Result<Self> {
        let file = parse_config(raw, is_toml)?;
        let cfg = Self::from_file(file);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AppConfigFile) -> Self {
        let source_file = file.source.unwrap_or_default();
        let source = SourceConfig {
            uri: source_file
                .uri
                .unwrap_or_else(|| DEFAULT_SOURCE_URI.to_string()),
            width: source_file.width.unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: source_file.height.unwrap_or(DEFAULT_SOURCE_HEIGHT),
            target_fps: source_file.target_fps.unwrap_or(DEFAULT_SOURCE_FPS),
        };

        let model_file = file.model.unwrap_or_default();
        let model = ModelSettings {
            path: model_file.path,
            input_width: model_file.input_width.unwrap_or(DEFAULT_INPUT_SIZE),
            input_height: model_file.input_height.unwrap_or(DEFAULT_INPUT_SIZE),
            channel_order: model_file.channel_order.unwrap_or_default(),
            layout: model_file.layout.unwrap_or_default(),
            rescales_internally: model_file.rescales_internally.unwrap_or(true),
        };

        let labels = match file.labels {
            Some(entries) => entries
                .into_iter()
                .map(|entry| {
                    let status = StatusCategory::from_label(&entry.id);
                    LabelSettings {
                        text: entry.text.unwrap_or_else(|| humanize_label(&entry.id)),
                        color: entry.color.unwrap_or_else(|| status.status_color()),
                        id: entry.id,
                    }
                })
                .collect(),
            None => default_labels(),
        };

        let fallback_file = file.fallback.unwrap_or_default();
        let fallback = LabelSettings {
            id: String::new(),
            text: fallback_file.text.unwrap_or_default(),
            color: fallback_file.color.unwrap_or(Color::WHITE),
        };

        let overlay_file = file.overlay.unwrap_or_default();
        let defaults = OverlayStyle::default();
        let overlay = OverlayStyle {
            header_opacity: overlay_file
                .header_opacity
                .unwrap_or(defaults.header_opacity),
            breakdown_opacity: overlay_file
                .breakdown_opacity
                .unwrap_or(defaults.breakdown_opacity),
            watermark: overlay_file.watermark.filter(|w| !w.trim().is_empty()),
        };
        let mirror = overlay_file.mirror.unwrap_or(true);

        let screenshot_file = file.screenshots.unwrap_or_default();
        let screenshots = ScreenshotSettings {
            dir: screenshot_file.dir.unwrap_or_else(|| PathBuf::from(".")),
            extension: screenshot_file
                .extension
                .unwrap_or_else(|| DEFAULT_SCREENSHOT_EXTENSION.to_string()),
        };

        let display_file = file.display.unwrap_or_default();
        let display = DisplaySettings {
            title: display_file
                .title
                .unwrap_or_else(|| DEFAULT_WINDOW_TITLE.to_string()),
            show_probabilities: display_file.show_probabilities.unwrap_or(true),
        };

        Self {
            source,
            model,
            labels,
            fallback,
            overlay,
            mirror,
            screenshots,
            display,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(uri) = std::env::var("RIPENESS_SOURCE") {
            if !uri.trim().is_empty() {
                self.source.uri = uri;
            }
        }
        if let Ok(path) = std::env::var("RIPENESS_MODEL") {
            if !path.trim().is_empty() {
                self.model.path = Some(PathBuf::from(path));
            }
        }
        if let Ok(dir) = std::env::var("RIPENESS_SCREENSHOT_DIR") {
            if !dir.trim().is_empty() {
                self.screenshots.dir = PathBuf::from(dir);
            }
        }
        if let Ok(show) = std::env::var("RIPENESS_SHOW_PROBABILITIES") {
            self.display.show_probabilities = parse_bool(&show).ok_or_else(|| {
                anyhow!("RIPENESS_SHOW_PROBABILITIES must be true/false/1/0, got '{}'", show)
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.uri.trim().is_empty() {
            return Err(anyhow!("source uri must not be empty"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source resolution must be non-zero"));
        }
        if self.model.input_width == 0 || self.model.input_height == 0 {
            return Err(anyhow!("model input size must be non-zero"));
        }
        for (name, value) in [
            ("header_opacity", self.overlay.header_opacity),
            ("breakdown_opacity", self.overlay.breakdown_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("overlay.{} must be within [0, 1], got {}", name, value));
            }
        }
        let ext = self.screenshots.extension.trim_start_matches('.');
        if !matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png") {
            return Err(anyhow!(
                "screenshots.extension must be jpg or png, got '{}'",
                self.screenshots.extension
            ));
        }
        let labels = self.label_set()?;
        self.display_table(&labels)?;
        Ok(())
    }

    pub fn label_set(&self) -> Result<LabelSet> {
        LabelSet::new(self.labels.iter().map(|label| label.id.clone()))
    }

    pub fn display_table(&self, labels: &LabelSet) -> Result<DisplayTable> {
        let entries = self
            .labels
            .iter()
            .map(|label| (label.id.clone(), label.text.clone(), label.color))
            .collect();
        DisplayTable::new(
            labels,
            entries,
            self.fallback.text.clone(),
            self.fallback.color,
        )
    }
}

fn read_config_file(path: &Path) -> Result<AppConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);
    parse_config(&raw, is_toml).with_context(|| format!("invalid config file {}", path.display()))
}

fn parse_config(raw: &str, is_toml: bool) -> Result<AppConfigFile> {
    if is_toml {
        toml::from_str(raw).map_err(|e| anyhow!("{}", e))
    } else {
        serde_json::from_str(raw).map_err(|e| anyhow!("{}", e))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `ripe_apple` -> `Ripe Apple`.
fn humanize_label(id: &str) -> String {
    id.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn default_labels() -> Vec<LabelSettings> {
    DEFAULT_LABELS
        .iter()
        .map(|id| LabelSettings {
            id: id.to_string(),
            text: humanize_label(id),
            color: StatusCategory::from_label(id).status_color(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_setup() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.source.uri, "0");
        assert_eq!((cfg.source.width, cfg.source.height), (1280, 720));
        assert_eq!((cfg.model.input_width, cfg.model.input_height), (224, 224));
        assert_eq!(cfg.model.scaling(), Scaling::Raw);
        assert_eq!(cfg.labels.len(), 6);
        assert_eq!(cfg.labels[0].text, "Overripe Apple");
        assert_eq!(cfg.labels[0].color, Color::RED);
        assert!(cfg.mirror);
        assert!(cfg.display.show_probabilities);
        cfg.validate().unwrap();
    }

    #[test]
    fn humanizes_ids() {
        assert_eq!(humanize_label("unripe_banana"), "Unripe Banana");
        assert_eq!(humanize_label("kiwi"), "Kiwi");
        assert_eq!(humanize_label("ripe--mango"), "Ripe Mango");
    }

    #[test]
    fn parses_toml_sections() -> Result<()> {
        let cfg = AppConfig::parse(
            r#"
[model]
input_width = 160
input_height = 120
layout = "nchw"
rescales_internally = false

[[labels]]
id = "ripe_pear"
text = "Pear"
color = [1, 2, 3]

[[labels]]
id = "overripe_pear"

[screenshots]
extension = "png"
"#,
            true,
        )?;
        assert_eq!(cfg.model.layout, TensorLayout::Nchw);
        assert_eq!(cfg.model.scaling(), Scaling::UnitRange);
        assert_eq!(cfg.model.preprocessor()?.output_shape(), [1, 3, 120, 160]);
        assert_eq!(cfg.labels[0].color, Color::new(1, 2, 3));
        assert_eq!(cfg.labels[1].text, "Overripe Pear");
        assert_eq!(cfg.labels[1].color, Color::RED);
        Ok(())
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AppConfig::parse(r#"{"labels": []}"#, false).is_err());
        assert!(AppConfig::parse(r#"{"overlay": {"header_opacity": 1.5}}"#, false).is_err());
        assert!(AppConfig::parse(r#"{"screenshots": {"extension": "bmp"}}"#, false).is_err());
        assert!(AppConfig::parse(r#"{"model": {"input_width": 0}}"#, false).is_err());
        assert!(AppConfig::parse(r#"{"unknown": 1}"#, false).is_err());
    }

    #[test]
    fn bool_parsing() {
        assert_eq!(parse_bool(" TRUE "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
