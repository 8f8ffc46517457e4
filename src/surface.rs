use std::fmt;

use serde::Deserialize;

use crate::fit::Viewport;

/// Stacking order of the wrap when it lives directly under the document body.
pub const BODY_WRAP_Z_INDEX: i32 = -999_999;
/// Stacking order of the wrap inside an element container; one above the image layer.
pub const ELEMENT_WRAP_Z_INDEX: i32 = -999_998;
/// Stacking order of every image element.
pub const IMAGE_Z_INDEX: i32 = -999_999;

/// Identity of the node a slideshow is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerId {
    /// The document root; used when no container is named.
    Body,
    Element(String),
}

impl ContainerId {
    pub fn element(name: impl Into<String>) -> Self {
        Self::Element(name.into())
    }

    pub fn is_body(&self) -> bool {
        matches!(self, Self::Body)
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::Body
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body => f.write_str("body"),
            Self::Element(name) => f.write_str(name),
        }
    }
}

impl From<Option<String>> for ContainerId {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Body, Self::Element)
    }
}

/// Facts about the host platform, determined once per session by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformCapabilities {
    #[serde(default = "PlatformCapabilities::default_supports_fixed_position")]
    pub supports_fixed_position: bool,
    #[serde(default)]
    pub is_mobile: bool,
}

impl PlatformCapabilities {
    const fn default_supports_fixed_position() -> bool {
        true
    }
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self {
            supports_fixed_position: Self::default_supports_fixed_position(),
            is_mobile: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Raw measurements reported by the host on every resize or orientation change.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SurfaceMetrics {
    /// Inner size of the container (or of the window for the body).
    pub inner: Size,
    /// Physical screen size as reported in portrait orientation.
    pub screen: Size,
}

impl SurfaceMetrics {
    pub const fn uniform(width: f64, height: f64) -> Self {
        Self {
            inner: Size::new(width, height),
            screen: Size::new(width, height),
        }
    }

    fn is_landscape(&self) -> bool {
        let inner = (self.inner.width / self.inner.height).ceil();
        let screen = (self.screen.width / self.screen.height).ceil();
        inner.is_finite() && screen.is_finite() && inner > screen
    }
}

impl Default for SurfaceMetrics {
    fn default() -> Self {
        Self::uniform(1920.0, 1080.0)
    }
}

/// Size of the surface the background must cover.
///
/// Mobile browsers report an unreliable inner height for the body while toolbars collapse,
/// so the screen size is used there, swapped when the device is held in landscape.
pub fn measure_viewport(
    container: &ContainerId,
    caps: &PlatformCapabilities,
    metrics: &SurfaceMetrics,
) -> Viewport {
    if container.is_body() && caps.is_mobile {
        let screen = metrics.screen;
        return if metrics.is_landscape() {
            Viewport::new(screen.height, screen.width)
        } else {
            Viewport::new(screen.width, screen.height)
        };
    }
    Viewport::new(metrics.inner.width, metrics.inner.height)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapPosition {
    Fixed,
    Absolute,
}

/// How the host should prepare the wrap element that clips the background images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSetup {
    pub position: WrapPosition,
    pub z_index: i32,
    /// Element containers must become a positioned stacking context
    /// (`relative` when static, `z-index: 0` when auto) and drop their own background.
    pub adjust_container: bool,
}

impl SurfaceSetup {
    pub fn for_container(container: &ContainerId, caps: &PlatformCapabilities) -> Self {
        if container.is_body() {
            Self {
                position: if caps.supports_fixed_position {
                    WrapPosition::Fixed
                } else {
                    WrapPosition::Absolute
                },
                z_index: BODY_WRAP_Z_INDEX,
                adjust_container: false,
            }
        } else {
            Self {
                position: WrapPosition::Absolute,
                z_index: ELEMENT_WRAP_Z_INDEX,
                adjust_container: true,
            }
        }
    }
}
