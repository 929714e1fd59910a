//! Service metadata for `GET /`.

use axum::Json;
use reels_core::template::TemplateKind;
use serde_json::{json, Map, Value};

/// GET /
///
/// Describes the service, its endpoints, the available templates and an
/// example request body. Purely informational.
pub async fn service_info() -> Json<Value> {
    let templates: Map<String, Value> = TemplateKind::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), Value::from(t.description())))
        .collect();

    Json(json!({
        "name": "NOYER Reels Generator",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /generate-reel": "Génère un reel immobilier",
            "GET /health": "Vérifie l'état du service",
        },
        "templates": templates,
        "example": {
            "photos": ["url1", "url2", "url3", "url4", "url5"],
            "prix": 450000,
            "surface": 120,
            "region": "Provence",
            "type": "Appartement",
            "email": "contact@agence.fr",
            "telephone": "04 00 00 00 00",
            "template": "blur",
        },
    }))
}
