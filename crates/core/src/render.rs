//! The render pipeline: source to tokens to constructs to SVG.

use crate::environment::{FailureOutput, RenderEnvironment, RenderOutcome};
use crate::error::{RenderError, RenderFailure};
use crate::header::render_header;
use crate::registry::{ConstructRegistry, normalize_keyword};
use crate::session::RenderSession;
use crate::settings::RenderSettings;
use log::{debug, info, warn};
use schsvg_lexer::{GrammarMode, TokenKind, Tokenizer};
use schsvg_svg::{SVG_NAMESPACE, SvgWriter};
use schsvg_traits::Cancellation;
use std::time::Instant;

const END_KEYWORD: &str = "$endschematc";

/// Renders the environment's schematic with the built-in constructs.
pub async fn render(
    environment: &dyn RenderEnvironment,
    cancel: Cancellation,
) -> Result<RenderOutcome, RenderFailure> {
    render_with_registry(environment, &ConstructRegistry::default(), cancel).await
}

/// Renders the environment's schematic, dispatching constructs through
/// `registry`.
///
/// On failure the environment's [`handle_error`](RenderEnvironment::handle_error)
/// has already run when this returns.
pub async fn render_with_registry(
    environment: &dyn RenderEnvironment,
    registry: &ConstructRegistry,
    cancel: Cancellation,
) -> Result<RenderOutcome, RenderFailure> {
    let started = Instant::now();
    let settings = environment.render_settings();

    let source = match environment.create_source(&cancel).await {
        Ok(source) => source,
        Err(_) if cancel.is_cancelled() => {
            return Err(fail(environment, RenderError::Cancelled, None, &settings).await);
        }
        Err(err) => return Err(fail(environment, err.into(), None, &settings).await),
    };
    let name = source.name.clone();
    info!("rendering {name}");

    if let Some(validator) = source.validator.as_deref() {
        environment.set_response_validator(validator);
        if environment.request_validator().as_deref() == Some(validator)
            && environment.handle_matching_validators()
        {
            info!("{name} not modified");
            return Ok(RenderOutcome::NotModified);
        }
    }

    let sink = match environment.create_sink(&cancel).await {
        Ok(sink) => sink,
        Err(err) => return Err(fail(environment, err, None, &settings).await),
    };
    let writer = SvgWriter::document(sink, cancel.clone());
    let tokenizer = Tokenizer::new(source, GrammarMode::Schematic, cancel.clone());
    let mut session = RenderSession::new(environment, tokenizer, writer, settings.clone(), cancel);

    match render_document(&mut session, registry).await {
        Ok(()) => {
            let bytes_written = session.base_writer().bytes_written();
            info!(
                "rendered {name}: {bytes_written} bytes in {:?}",
                started.elapsed()
            );
            Ok(RenderOutcome::Rendered { bytes_written })
        }
        Err(err) => {
            let writer = session.base_writer();
            Err(fail(environment, err, Some(writer), &settings).await)
        }
    }
}

async fn fail(
    environment: &dyn RenderEnvironment,
    error: RenderError,
    writer: Option<&mut SvgWriter>,
    settings: &RenderSettings,
) -> RenderFailure {
    if error.is_cancelled() {
        info!("render cancelled");
    } else {
        warn!("render failed: {error}");
    }
    let mut output = FailureOutput::new(writer, settings.error_font_size);
    let reported = environment.handle_error(&error, &mut output).await;
    RenderFailure { error, reported }
}

/// Writes the whole document: root element, header, constructs.
pub async fn render_document(
    session: &mut RenderSession<'_>,
    registry: &ConstructRegistry,
) -> Result<(), RenderError> {
    start_root(session)?;
    render_header(session).await?;

    loop {
        session.check_cancelled()?;
        let token = session.tokenizer().read().await?;
        match token.kind() {
            TokenKind::LineBreak => continue,
            TokenKind::Atom => {}
            TokenKind::EndOfFile => {
                return Err(token
                    .error("Expected \"$EndSCHEMATC\", got EndOfFile")
                    .into());
            }
            _ => {
                return Err(token
                    .error(format!("Unexpected {}", token.describe()))
                    .into());
            }
        }

        let keyword = normalize_keyword(token.value()?);
        if keyword == END_KEYWORD {
            break;
        }
        let renderer = registry.get(&keyword).ok_or_else(|| {
            token.error(format!("Unknown schematic item {}", token.describe()))
        })?;
        debug!("{} at {}", token.raw(), token.location());
        renderer.render(session, &token).await?;
        session.writer().flush_if_full().await?;
    }

    let writer = session.writer();
    writer.end_all()?;
    writer.flush().await?;
    Ok(())
}

fn start_root(session: &mut RenderSession<'_>) -> Result<(), RenderError> {
    let font_family = session.settings().font_family.clone();
    let writer = session.writer();
    writer.start_element("svg")?;
    writer.write_non_inherited_attribute("xmlns", SVG_NAMESPACE)?;
    writer.write_inherited_attribute("font-family", &font_family)?;
    writer.write_inherited_attribute("stroke-linecap", "round")?;
    Ok(())
}
