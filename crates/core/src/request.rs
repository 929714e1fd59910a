//! Inbound reel requests, validation, and the property set forwarded to
//! the render engine.

use serde::{Deserialize, Serialize};

use crate::error::ReelError;
use crate::template::{TemplateKind, DEFAULT_TEMPLATE, PHOTO_SLOTS};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum number of photos a request must carry.
pub const MIN_PHOTOS: usize = PHOTO_SLOTS;

/// Default upper bound on photos accepted in one request.
pub const DEFAULT_MAX_PHOTOS: usize = 20;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A reel generation request as received from the caller.
///
/// `template` stays a raw string so an unknown identifier is reported as
/// [`ReelError::InvalidTemplate`] instead of a deserialization failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Photo URLs. Order matters: index `i` feeds scene slot `i`.
    #[serde(default)]
    pub photos: Vec<String>,
    /// Asking price. Optional; the compositions render without it.
    #[serde(default)]
    pub prix: Option<f64>,
    /// Living surface in square metres.
    #[serde(default)]
    pub surface: Option<f64>,
    #[serde(default)]
    pub region: String,
    #[serde(rename = "type", default)]
    pub property_type: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telephone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl RenderRequest {
    /// Check photo count and template, returning the selected template.
    ///
    /// Photo count is checked first, so a request that is wrong on both
    /// counts reports [`ReelError::InsufficientPhotos`].
    pub fn validate(&self, max_photos: usize) -> Result<TemplateKind, ReelError> {
        let count = self.photos.len();
        if count < MIN_PHOTOS {
            return Err(ReelError::InsufficientPhotos {
                count,
                required: MIN_PHOTOS,
            });
        }
        if count > max_photos {
            return Err(ReelError::TooManyPhotos {
                count,
                max: max_photos,
            });
        }

        match self.template.as_deref() {
            None => Ok(DEFAULT_TEMPLATE),
            Some(id) => id.parse(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine input properties
// ---------------------------------------------------------------------------

/// Properties handed to a composition.
///
/// Field names match what the compositions read, so this serializes
/// directly into the engine's `--props` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputProps {
    pub photos: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prix: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface: Option<f64>,
    pub region: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub email: String,
    pub telephone: String,
}

impl InputProps {
    /// Build the engine properties for a request, keeping only the photos
    /// that have a slot in the composition.
    pub fn from_request(request: &RenderRequest, photo_slots: usize) -> Self {
        Self {
            photos: request.photos.iter().take(photo_slots).cloned().collect(),
            prix: request.prix,
            surface: request.surface,
            region: request.region.clone(),
            property_type: request.property_type.clone(),
            email: request.email.clone(),
            telephone: request.telephone.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
