use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::error::Error;
use crate::fit::{FitOptions, Offsets};
use crate::surface::{ContainerId, PlatformCapabilities, SurfaceMetrics};

/// One entry of the slide sequence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "SlideEntry")]
pub struct Slide {
    pub source: String,
    pub caption: Option<String>,
    pub offset_x: Option<f64>,
    pub offset_y: Option<f64>,
}

impl Slide {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            caption: None,
            offset_x: None,
            offset_y: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_offsets(mut self, x: Option<f64>, y: Option<f64>) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    pub fn offsets(&self) -> Offsets {
        Offsets {
            x: self.offset_x,
            y: self.offset_y,
        }
    }

    fn validate(&self, index: usize) -> Result<(), Error> {
        if self.source.trim().is_empty() {
            return Err(Error::InvalidOptions(format!(
                "slide {index} has an empty source"
            )));
        }
        check_fraction(&format!("slides[{index}].offset-x"), self.offset_x)?;
        check_fraction(&format!("slides[{index}].offset-y"), self.offset_y)
    }
}

impl From<&str> for Slide {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for Slide {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

/// Slides may be written as a bare source or as a map with per-slide settings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SlideEntry {
    Bare(String),
    #[serde(rename_all = "kebab-case")]
    Detailed {
        #[serde(alias = "src")]
        source: String,
        #[serde(default)]
        caption: Option<String>,
        #[serde(default)]
        offset_x: Option<f64>,
        #[serde(default)]
        offset_y: Option<f64>,
    },
}

impl From<SlideEntry> for Slide {
    fn from(entry: SlideEntry) -> Self {
        match entry {
            SlideEntry::Bare(source) => Slide::new(source),
            SlideEntry::Detailed {
                source,
                caption,
                offset_x,
                offset_y,
            } => Slide {
                source,
                caption,
                offset_x,
                offset_y,
            },
        }
    }
}

/// Behavior of one attached slideshow.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SlideshowOptions {
    /// Center the image horizontally when it overflows the surface width.
    pub centered_x: bool,
    /// Center the image vertically when it overflows the surface height.
    pub centered_y: bool,
    /// Global horizontal offset; slides may override it.
    pub offset_x: Option<f64>,
    /// Global vertical offset; slides may override it.
    pub offset_y: Option<f64>,
    /// Time between slides while cycling.
    pub duration_ms: u64,
    /// Fade-in time of each new slide. Captions cross-fade in half of it each way.
    pub fade_ms: u64,
    pub paused: bool,
    /// Preload only the starting slide instead of the whole sequence.
    pub lazy_load: bool,
    /// First slide to show; clamped into the sequence.
    pub start: i64,
    pub caption_mount: String,
    pub caption_attribute: String,
    pub caption_index_separator: String,
    pub caption_hidden_class: String,
}

impl Default for SlideshowOptions {
    fn default() -> Self {
        Self {
            centered_x: true,
            centered_y: true,
            offset_x: None,
            offset_y: None,
            duration_ms: 5000,
            fade_ms: 0,
            paused: false,
            lazy_load: false,
            start: 0,
            caption_mount: "body".to_string(),
            caption_attribute: "bootstrap-image".to_string(),
            caption_index_separator: "_".to_string(),
            caption_hidden_class: "hide".to_string(),
        }
    }
}

impl SlideshowOptions {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    /// Fit settings for `slide`; its own offsets override the global ones.
    pub fn fit_for(&self, slide: &Slide) -> FitOptions {
        FitOptions {
            centered_x: self.centered_x,
            centered_y: self.centered_y,
            offsets: slide.offsets().or(Offsets {
                x: self.offset_x,
                y: self.offset_y,
            }),
        }
    }

    /// Overlay every field set in `patch` onto these options.
    pub fn merged(mut self, patch: OptionsPatch) -> Self {
        macro_rules! overlay {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field { self.$field = value; })*
            };
        }
        overlay!(
            centered_x,
            centered_y,
            duration_ms,
            fade_ms,
            paused,
            lazy_load,
            start,
            caption_mount,
            caption_attribute,
            caption_index_separator,
            caption_hidden_class,
        );
        if patch.offset_x.is_some() {
            self.offset_x = patch.offset_x;
        }
        if patch.offset_y.is_some() {
            self.offset_y = patch.offset_y;
        }
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.duration_ms == 0 {
            return Err(Error::InvalidOptions(
                "duration-ms must be greater than zero".into(),
            ));
        }
        if self.caption_index_separator.is_empty() {
            return Err(Error::InvalidOptions(
                "caption-index-separator must not be empty".into(),
            ));
        }
        if self.caption_attribute.trim().is_empty() {
            return Err(Error::InvalidOptions(
                "caption-attribute must not be empty".into(),
            ));
        }
        check_fraction("offset-x", self.offset_x)?;
        check_fraction("offset-y", self.offset_y)
    }
}

/// Validate a slide sequence before a controller is built from it.
pub fn validate_slides(slides: &[Slide]) -> Result<(), Error> {
    if slides.is_empty() {
        return Err(Error::NoImages);
    }
    slides
        .iter()
        .enumerate()
        .try_for_each(|(index, slide)| slide.validate(index))
}

fn check_fraction(name: &str, value: Option<f64>) -> Result<(), Error> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(Error::InvalidOptions(format!(
            "{name} must be within [0, 1], got {v}"
        ))),
        _ => Ok(()),
    }
}

/// Partial options; unset fields keep their previous value when merged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OptionsPatch {
    pub centered_x: Option<bool>,
    pub centered_y: Option<bool>,
    pub offset_x: Option<f64>,
    pub offset_y: Option<f64>,
    pub duration_ms: Option<u64>,
    pub fade_ms: Option<u64>,
    pub paused: Option<bool>,
    pub lazy_load: Option<bool>,
    pub start: Option<i64>,
    pub caption_mount: Option<String>,
    pub caption_attribute: Option<String>,
    pub caption_index_separator: Option<String>,
    pub caption_hidden_class: Option<String>,
}

impl From<SlideshowOptions> for OptionsPatch {
    fn from(o: SlideshowOptions) -> Self {
        Self {
            centered_x: Some(o.centered_x),
            centered_y: Some(o.centered_y),
            offset_x: o.offset_x,
            offset_y: o.offset_y,
            duration_ms: Some(o.duration_ms),
            fade_ms: Some(o.fade_ms),
            paused: Some(o.paused),
            lazy_load: Some(o.lazy_load),
            start: Some(o.start),
            caption_mount: Some(o.caption_mount),
            caption_attribute: Some(o.caption_attribute),
            caption_index_separator: Some(o.caption_index_separator),
            caption_hidden_class: Some(o.caption_hidden_class),
        }
    }
}

/// Top-level YAML document used by the `backdrop` binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    /// Container to attach to; the document body when omitted.
    #[serde(default)]
    pub container: Option<String>,
    pub slides: Vec<Slide>,
    #[serde(default)]
    pub options: SlideshowOptions,
    /// Surface size the headless host reports.
    #[serde(default)]
    pub surface: SurfaceMetrics,
    #[serde(default)]
    pub capabilities: PlatformCapabilities,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        validate_slides(&self.slides).context("invalid slides")?;
        self.options.validate().context("invalid options")?;
        ensure!(
            self.surface.inner.width > 0.0 && self.surface.inner.height > 0.0,
            "surface.inner must have a positive width and height"
        );
        ensure!(
            self.surface.screen.width > 0.0 && self.surface.screen.height > 0.0,
            "surface.screen must have a positive width and height"
        );
        Ok(self)
    }

    pub fn container_id(&self) -> ContainerId {
        ContainerId::from(self.container.clone())
    }
}
