//! Everything before the first drawable construct: the signature line, the
//! preamble and the `$Descr` page description.

use crate::error::RenderError;
use crate::session::RenderSession;
use log::debug;
use schsvg_lexer::TokenKind;

/// Reads the signature and preamble, up to and including `$EndDescr`.
pub async fn render_header(session: &mut RenderSession<'_>) -> Result<(), RenderError> {
    let tz = session.tokenizer();
    let signature = tz.read().await?;
    if !signature.is("EESchema") {
        return Err(signature
            .error(format!(
                "Expected \"EESchema\", got {}",
                signature.describe()
            ))
            .into());
    }
    tz.skip_to_next_line().await?;

    loop {
        let tz = session.tokenizer();
        let token = tz.read().await?;
        match token.kind() {
            TokenKind::LineBreak => continue,
            TokenKind::Atom => {}
            _ => {
                return Err(token
                    .error(format!("Expected \"$Descr\", got {}", token.describe()))
                    .into());
            }
        }
        let value = token.value()?;
        if let Some(first) = value.strip_prefix("LIBS:") {
            let rest = tz.read_text_until(&[TokenKind::LineBreak]).await?;
            tz.read_kind(TokenKind::LineBreak).await?;
            let name = format!("{first}{rest}").trim().to_string();
            session.declare_library(name);
        } else if value == "EELAYER" {
            tz.skip_to_next_line().await?;
        } else if value == "$Descr" {
            return render_description(session).await;
        } else {
            return Err(token
                .error(format!("Expected \"$Descr\", got {}", token.describe()))
                .into());
        }
    }
}

/// `$Descr <paper> <width> <height> [portrait]` through `$EndDescr`.
///
/// Sets the root element's physical size and its `viewBox`, which is in
/// mils.
pub async fn render_description(session: &mut RenderSession<'_>) -> Result<(), RenderError> {
    let tz = session.tokenizer();
    let paper = tz.read_atom().await?;
    let width = tz.read_int().await?;
    let height = tz.read_int().await?;
    let next = tz.read().await?;
    if next.is("portrait") {
        tz.read_kind(TokenKind::LineBreak).await?;
    } else if next.kind() != TokenKind::LineBreak {
        return Err(next
            .error(format!("Expected LineBreak, got {}", next.describe()))
            .into());
    }
    debug!("page {} {width}x{height} mils", paper.raw());

    loop {
        let token = tz.read().await?;
        match token.kind() {
            TokenKind::LineBreak => continue,
            TokenKind::EndOfFile => {
                return Err(token
                    .error("Expected \"$EndDescr\", got EndOfFile")
                    .into());
            }
            _ if token.is("$EndDescr") => {
                tz.read_kind(TokenKind::LineBreak).await?;
                break;
            }
            _ => tz.skip_to_next_line().await?,
        }
    }

    let unit = session.settings().unit;
    let writer = session.writer();
    writer.write_inherited_attribute("width", &unit.format_mils(width))?;
    writer.write_inherited_attribute("height", &unit.format_mils(height))?;
    writer.write_non_inherited_attribute("viewBox", &format!("0 0 {width} {height}"))?;
    Ok(())
}
