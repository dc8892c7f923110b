use std::sync::Arc;

use axum::{extract::State, Json};
use contact_discovery::form_detect::{
    contact_field_groups, detect_form, extract_contact_signals, find_google_forms,
    find_valid_google_form, is_valid_contact_form_with, FormDetection,
};
use contact_discovery::text_utils::{looks_garbled, parse_target_url};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::app_state::AppState;

#[derive(Deserialize)]
pub struct DetectReq {
    url: String,
}

#[derive(Serialize, Default)]
pub struct DetectResp {
    url: String,
    status: u16,
    final_url: Option<String>,
    content_type: Option<String>,
    size: usize,
    is_html: bool,
    detection: Option<FormDetection>,
    valid_contact_form: bool,
    field_groups: Vec<&'static str>,
    google_forms: Vec<String>,
    valid_google_form: Option<String>,
    signals: Vec<&'static str>,
    note: Option<String>,
}

/// Form detector diagnostics for a single page.
#[instrument(name = "detect_form", skip(state, req), fields(url = %req.url))]
pub async fn detect_form_url(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DetectReq>,
) -> Json<DetectResp> {
    let Some(url) = parse_target_url(&req.url) else {
        return Json(DetectResp {
            url: req.url,
            note: Some("invalid url".into()),
            ..Default::default()
        });
    };

    let cfg = state.discoverer.config();
    let res = match state.fetcher.get(&url, cfg.homepage_timeout()).await {
        Ok(r) => r,
        Err(e) => {
            return Json(DetectResp {
                url: req.url,
                note: Some(format!("fetch error ({}): {e}", e.kind)),
                ..Default::default()
            });
        }
    };

    let base = DetectResp {
        url: req.url,
        status: res.status,
        final_url: Some(res.final_url.to_string()),
        content_type: res.content_type.clone(),
        size: res.body.len(),
        is_html: res.is_html_like(),
        ..Default::default()
    };
    if !base.is_html {
        return Json(DetectResp {
            note: Some("content-type is not HTML".into()),
            ..base
        });
    }

    let html = res.text();
    let note = looks_garbled(&html).then(|| "body does not decode cleanly as UTF-8".to_string());
    let detection = detect_form(&html);
    debug!(found = detection.found, kind = ?detection.kind, "detected");

    Json(DetectResp {
        detection: Some(detection),
        valid_contact_form: is_valid_contact_form_with(&html, cfg.min_contact_fields),
        field_groups: contact_field_groups(&html),
        google_forms: find_google_forms(&html).into_iter().map(|m| m.url).collect(),
        valid_google_form: find_valid_google_form(&html).map(|m| m.url),
        signals: extract_contact_signals(&html),
        note,
        ..base
    })
}
