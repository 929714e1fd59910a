//! Template registry: caller-facing template identifiers and the render
//! compositions they resolve to.
//!
//! The set of templates is closed. Unknown identifiers are rejected here,
//! before any rendering work is scheduled; there is no silent fallback to
//! the default template.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ReelError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Frame rate shared by every composition.
pub const FPS: u32 = 30;

/// Frames in a single scene (4 seconds at 30 fps).
pub const FRAMES_PER_SCENE: u32 = 120;

/// Scenes in a reel.
pub const SCENE_COUNT: u32 = 4;

/// Vertical 9:16 frame.
pub const FRAME_WIDTH: u32 = 1080;
pub const FRAME_HEIGHT: u32 = 1920;

/// Photo slots consumed by every composition; extra photos are never
/// forwarded to the engine.
pub const PHOTO_SLOTS: usize = 5;

/// Template used when a request does not name one.
pub const DEFAULT_TEMPLATE: TemplateKind = TemplateKind::Default;

// ---------------------------------------------------------------------------
// Template kinds
// ---------------------------------------------------------------------------

/// A visual style a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// Full-screen photos, cropped to fill the frame.
    Default,
    /// Landscape photos over a blurred copy of themselves.
    Blur,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 2] = [TemplateKind::Default, TemplateKind::Blur];

    /// Identifier as it appears in requests.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Blur => "blur",
        }
    }

    /// Short description shown on the service info page.
    pub fn description(self) -> &'static str {
        match self {
            Self::Default => "Full-screen photos (cropped to fill)",
            Self::Blur => "Landscape photos over an aesthetic blurred background",
        }
    }

    /// Resolve this template to its composition.
    pub fn composition(self) -> CompositionDescriptor {
        let id = match self {
            Self::Default => "ReelImmobilier",
            Self::Blur => "ReelImmobilierBlur",
        };
        CompositionDescriptor {
            id,
            fps: FPS,
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            scene_count: SCENE_COUNT,
            frames_per_scene: FRAMES_PER_SCENE,
            photo_slots: PHOTO_SLOTS,
        }
    }

    /// Comma-separated list of valid identifiers, used in error messages.
    pub fn valid_list() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "blur" => Ok(Self::Blur),
            other => Err(ReelError::InvalidTemplate {
                given: other.to_string(),
                valid: Self::valid_list(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Composition descriptor
// ---------------------------------------------------------------------------

/// A composition known to the render engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompositionDescriptor {
    /// Name the render engine registers the composition under.
    pub id: &'static str,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub scene_count: u32,
    pub frames_per_scene: u32,
    /// Number of photos the composition places, one per fixed slot.
    pub photo_slots: usize,
}

impl CompositionDescriptor {
    pub fn duration_in_frames(&self) -> u32 {
        self.frames_per_scene * self.scene_count
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.duration_in_frames()) * 1000 / u64::from(self.fps))
    }
}

/// Resolve a raw template identifier to its composition.
pub fn resolve(template_id: &str) -> Result<CompositionDescriptor, ReelError> {
    template_id.parse::<TemplateKind>().map(TemplateKind::composition)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
