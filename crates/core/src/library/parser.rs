use super::symbol::{Fill, PinDirection, Symbol, SymbolItem, SymbolLibrary, UnitScope};
use crate::error::RenderError;
use crate::fields::{LineFields, read_line, skip_block};
use log::trace;
use schsvg_lexer::{FormatError, TokenKind, Tokenizer};

/// Reads a whole `.lib` document.
///
/// Only the parts needed to draw symbol bodies are kept; fields, footprint
/// filters and text items are skipped.
pub async fn parse_library(tz: &mut Tokenizer, name: &str) -> Result<SymbolLibrary, RenderError> {
    let signature = tz.read().await?;
    if !signature.is("EESchema-LIBRARY") {
        return Err(signature
            .error(format!(
                "Expected \"EESchema-LIBRARY\", got {}",
                signature.describe()
            ))
            .into());
    }
    tz.skip_to_next_line().await?;

    let mut library = SymbolLibrary::new(name);
    loop {
        let token = tz.read().await?;
        match token.kind() {
            TokenKind::EndOfFile => break,
            TokenKind::LineBreak => continue,
            TokenKind::Atom if token.is("DEF") => {
                let symbol = parse_definition(tz).await?;
                trace!("{name}: symbol {}", symbol.name);
                library.insert(symbol);
            }
            TokenKind::Atom => tz.skip_to_next_line().await?,
            _ => {
                return Err(token
                    .error(format!("Expected \"DEF\", got {}", token.describe()))
                    .into());
            }
        }
    }
    Ok(library)
}

async fn parse_definition(tz: &mut Tokenizer) -> Result<Symbol, RenderError> {
    let name = tz.read_atom().await?;
    let mut symbol = Symbol {
        name: name.value()?.trim_start_matches('~').to_string(),
        ..Symbol::default()
    };
    tz.skip_to_next_line().await?;

    loop {
        let token = tz.read().await?;
        match token.kind() {
            TokenKind::LineBreak => continue,
            TokenKind::Atom => {}
            _ => {
                return Err(token
                    .error(format!("Expected \"ENDDEF\", got {}", token.describe()))
                    .into());
            }
        }
        match token.value()? {
            "ENDDEF" => {
                read_line(tz).await?;
                return Ok(symbol);
            }
            "ALIAS" => {
                for alias in read_line(tz).await?.tokens {
                    symbol.aliases.push(alias.value()?.to_string());
                }
            }
            "$FPLIST" => skip_block(tz, "$ENDFPLIST").await?,
            "DRAW" => {
                tz.skip_to_next_line().await?;
                parse_draw(tz, &mut symbol).await?;
            }
            _ => tz.skip_to_next_line().await?,
        }
    }
}

async fn parse_draw(tz: &mut Tokenizer, symbol: &mut Symbol) -> Result<(), RenderError> {
    loop {
        let token = tz.read().await?;
        match token.kind() {
            TokenKind::LineBreak => continue,
            TokenKind::Atom => {}
            _ => {
                return Err(token
                    .error(format!("Expected \"ENDDRAW\", got {}", token.describe()))
                    .into());
            }
        }
        if token.is("ENDDRAW") {
            read_line(tz).await?;
            return Ok(());
        }
        let mut fields = read_line(tz).await?;
        let item = match token.value()? {
            "S" => Some(parse_rectangle(&mut fields)?),
            "C" => Some(parse_circle(&mut fields)?),
            "P" => Some(parse_polyline(&mut fields)?),
            "A" => Some(parse_arc(&mut fields)?),
            "X" => Some(parse_pin(&mut fields)?),
            _ => None,
        };
        symbol.items.extend(item);
    }
}

fn fill(fields: &mut LineFields) -> Result<Fill, FormatError> {
    match fields.optional() {
        Some(token) => token.to_enum(),
        None => Ok(Fill::None),
    }
}

fn scope(fields: &mut LineFields) -> Result<UnitScope, FormatError> {
    Ok(UnitScope {
        unit: fields.int()?,
        convert: fields.int()?,
    })
}

fn parse_rectangle(fields: &mut LineFields) -> Result<SymbolItem, FormatError> {
    let start = fields.point()?;
    let end = fields.point()?;
    let scope = scope(fields)?;
    Ok(SymbolItem::Rectangle {
        scope,
        start,
        end,
        thickness: fields.int()?,
        fill: fill(fields)?,
    })
}

fn parse_circle(fields: &mut LineFields) -> Result<SymbolItem, FormatError> {
    let center = fields.point()?;
    let radius = fields.int()?;
    let scope = scope(fields)?;
    Ok(SymbolItem::Circle {
        scope,
        center,
        radius,
        thickness: fields.int()?,
        fill: fill(fields)?,
    })
}

fn parse_polyline(fields: &mut LineFields) -> Result<SymbolItem, FormatError> {
    let count = fields.int()?;
    let scope = scope(fields)?;
    let thickness = fields.int()?;
    let points = (0..count.max(0))
        .map(|_| fields.point())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SymbolItem::Polyline {
        scope,
        points,
        thickness,
        fill: fill(fields)?,
    })
}

fn parse_arc(fields: &mut LineFields) -> Result<SymbolItem, FormatError> {
    let center = fields.point()?;
    let radius = fields.int()?;
    let angles = fields.point()?;
    let scope = scope(fields)?;
    let thickness = fields.int()?;
    let fill = fill(fields)?;
    let (start, end) = if fields.remaining() >= 4 {
        (fields.point()?, fields.point()?)
    } else {
        (
            point_on_circle(center, radius, angles.0),
            point_on_circle(center, radius, angles.1),
        )
    };
    Ok(SymbolItem::Arc {
        scope,
        radius,
        angles,
        start,
        end,
        thickness,
        fill,
    })
}

fn point_on_circle(center: (i32, i32), radius: i32, tenths: i32) -> (i32, i32) {
    let angle = f64::from(tenths).to_radians() / 10.0;
    let r = f64::from(radius);
    // `as` saturates, so endpoints past the coordinate range clamp to it
    (
        (f64::from(center.0) + r * angle.cos()).round() as i32,
        (f64::from(center.1) + r * angle.sin()).round() as i32,
    )
}

fn parse_pin(fields: &mut LineFields) -> Result<SymbolItem, FormatError> {
    let name = fields.text("a pin name")?;
    let number = fields.text("a pin number")?;
    let position = fields.point()?;
    let length = fields.int()?;
    let direction = fields.enumerant::<PinDirection>()?;
    let _name_size = fields.int()?;
    let _number_size = fields.int()?;
    let scope = scope(fields)?;
    let _electrical_type = fields.next_token("an electrical type")?;
    let visible = fields
        .optional()
        .is_none_or(|shape| !shape.raw().starts_with('N'));
    Ok(SymbolItem::Pin {
        scope,
        name,
        number,
        position,
        length,
        direction,
        visible,
    })
}
