use crate::environment::{HttpRenderEnvironment, ResponseHead};
use crate::error::{Result, ServiceError};
use crate::location::{github_raw_url, normalize_render_url};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, StatusCode, header, response::Builder},
    response::Response,
};
use schsvg_core::traits::{CancelOnDrop, CancellationSource};
use schsvg_core::{LengthUnit, RenderSettings, render};
use serde::Deserialize;
use std::convert::Infallible;

const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// Per-request overrides of the configured render settings.
#[derive(Debug, Default, Deserialize)]
pub struct RenderOptions {
    pub unit: Option<LengthUnit>,
    pub components: Option<bool>,
    pub hidden_pins: Option<bool>,
}

impl RenderOptions {
    fn apply(&self, mut settings: RenderSettings) -> RenderSettings {
        if let Some(unit) = self.unit {
            settings.unit = unit;
        }
        if let Some(components) = self.components {
            settings.render_components = components;
        }
        if let Some(hidden_pins) = self.hidden_pins {
            settings.show_hidden_pins = hidden_pins;
        }
        settings
    }
}

#[derive(Debug, Deserialize)]
pub struct DocumentUrl {
    pub url: String,
}

/// `GET /render?url=...`
pub async fn render_url(
    State(state): State<AppState>,
    Query(document): Query<DocumentUrl>,
    Query(options): Query<RenderOptions>,
    headers: HeaderMap,
) -> Result<Response> {
    let location = normalize_render_url(&document.url)?;
    stream_render(state, location, &options, &headers).await
}

/// `GET /github/<owner>/<repo>/blob/<ref>/<path>.sch`
pub async fn render_github(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(raw_query): RawQuery,
    Query(options): Query<RenderOptions>,
    headers: HeaderMap,
) -> Result<Response> {
    let location = github_raw_url(&path, raw_query.as_deref())?;
    stream_render(state, location, &options, &headers).await
}

/// Starts the render on its own task and answers once it has decided on a
/// response head. Dropping the response body cancels the render.
async fn stream_render(
    state: AppState,
    location: String,
    options: &RenderOptions,
    headers: &HeaderMap,
) -> Result<Response> {
    tracing::info!("Render request for '{}'", location);

    let permit = state
        .render_slots
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ServiceError::ServiceOverloaded)?;

    let settings = options.apply(state.config.defaults.clone());
    let request_validator = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let (environment, channels) = HttpRenderEnvironment::new(
        state.provider.clone(),
        location,
        settings,
        request_validator,
        state.config.render.buffered_chunks,
    );

    let source = CancellationSource::new();
    let cancel = source.token();
    let guard = CancelOnDrop(source);

    tokio::spawn(async move {
        let _permit = permit;
        let result = render(&environment, cancel).await;
        match &result {
            Ok(outcome) => tracing::debug!("'{}': {:?}", environment.location(), outcome),
            Err(failure) => tracing::warn!("'{}': {}", environment.location(), failure),
        }
        environment.finish(&result);
    });

    let head = channels
        .head
        .await
        .map_err(|_| ServiceError::Internal("render ended without a response".to_string()))?;

    let max_age = state.config.render.cache_max_age_secs;
    let response = match head {
        ResponseHead::Streaming { validator } => {
            let body = futures::stream::unfold(
                (channels.body, guard),
                |(mut body, guard)| async move {
                    let chunk = body.recv().await?;
                    Some((Ok::<_, Infallible>(chunk), (body, guard)))
                },
            );
            cache_headers(Response::builder(), validator.as_deref(), max_age)
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, SVG_CONTENT_TYPE)
                .body(Body::from_stream(body))
        }
        ResponseHead::NotModified { validator } => {
            cache_headers(Response::builder(), validator.as_deref(), max_age)
                .status(StatusCode::NOT_MODIFIED)
                .body(Body::empty())
        }
        ResponseHead::Failed { status, message } => Response::builder()
            .status(StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Body::from(message)),
    };
    response.map_err(|e| ServiceError::Internal(e.to_string()))
}

/// An upstream validator switches caching from a fixed max-age to
/// revalidation.
fn cache_headers(builder: Builder, validator: Option<&str>, max_age: u64) -> Builder {
    match validator {
        Some(validator) => builder
            .header(header::ETAG, validator)
            .header(header::CACHE_CONTROL, "no-cache"),
        None => builder.header(header::CACHE_CONTROL, format!("max-age={max_age}")),
    }
}
