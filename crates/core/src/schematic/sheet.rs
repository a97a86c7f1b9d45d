use super::{FIELD_COLOR, SHEET_COLOR, SHEET_FILE_COLOR};
use crate::error::RenderError;
use crate::fields::read_line;
use crate::registry::ConstructRenderer;
use crate::session::RenderSession;
use async_trait::async_trait;
use schsvg_lexer::{Token, TokenKind};
use schsvg_svg::{SvgWriter, WriterError};

#[derive(Debug, Default)]
struct Sheet {
    origin: (i32, i32),
    size: (i32, i32),
    name: Option<(String, i32)>,
    file: Option<(String, i32)>,
    pins: Vec<SheetPin>,
}

#[derive(Debug)]
struct SheetPin {
    name: String,
    right_side: bool,
    position: (i32, i32),
    size: i32,
}

/// A hierarchical sheet box: `$Sheet` through `$EndSheet`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SheetRenderer;

impl SheetRenderer {
    async fn parse(session: &mut RenderSession<'_>) -> Result<Sheet, RenderError> {
        let tz = session.tokenizer();
        tz.read_kind(TokenKind::LineBreak).await?;
        let mut sheet = Sheet::default();

        loop {
            let token = tz.read().await?;
            match token.kind() {
                TokenKind::LineBreak => continue,
                TokenKind::Atom => {}
                _ => {
                    return Err(token
                        .error(format!("Expected \"$EndSheet\", got {}", token.describe()))
                        .into());
                }
            }
            let keyword = token.value()?;
            if keyword == "$EndSheet" {
                tz.read_kind(TokenKind::LineBreak).await?;
                return Ok(sheet);
            }
            let mut fields = read_line(tz).await?;
            match keyword {
                "S" => {
                    sheet.origin = fields.point()?;
                    sheet.size = fields.point()?;
                }
                "F0" => sheet.name = Some((fields.text("the sheet name")?, fields.int()?)),
                "F1" => sheet.file = Some((fields.text("the sheet file name")?, fields.int()?)),
                field if field.starts_with('F') => {
                    let name = fields.text("a sheet pin name")?;
                    let _shape = fields.next_token("a sheet pin shape")?;
                    let side = fields.next_token("a sheet pin side")?;
                    let right_side = side.is("R");
                    let position = fields.point()?;
                    let size = fields.int()?;
                    sheet.pins.push(SheetPin {
                        name,
                        right_side,
                        position,
                        size,
                    });
                }
                _ => {}
            }
        }
    }
}

#[async_trait]
impl ConstructRenderer for SheetRenderer {
    async fn render(
        &self,
        session: &mut RenderSession<'_>,
        _keyword: &Token,
    ) -> Result<(), RenderError> {
        let sheet = Self::parse(session).await?;
        let (x, y) = (i64::from(sheet.origin.0), i64::from(sheet.origin.1));
        let (width, height) = sheet.size;

        let writer = session.writer();
        writer.start_element("g")?;
        writer.write_non_inherited_attribute("class", "sheet")?;
        writer.start_element("rect")?;
        writer.write_non_inherited_attribute("x", &x.to_string())?;
        writer.write_non_inherited_attribute("y", &y.to_string())?;
        writer.write_non_inherited_attribute("width", &width.to_string())?;
        writer.write_non_inherited_attribute("height", &height.to_string())?;
        writer.write_inherited_attribute("stroke", SHEET_COLOR)?;
        writer.write_inherited_attribute("stroke-width", "6")?;
        writer.write_inherited_attribute("fill", "none")?;
        writer.end_element()?;

        if let Some((name, size)) = &sheet.name {
            write_label(writer, "sheet-name", name, (x, y - 20), *size, FIELD_COLOR, "start")?;
        }
        if let Some((file, size)) = &sheet.file {
            let below = (x, y + i64::from(height) + i64::from(*size) + 20);
            write_label(writer, "sheet-file", file, below, *size, SHEET_FILE_COLOR, "start")?;
        }
        for pin in &sheet.pins {
            let (anchor, inset) = if pin.right_side {
                ("end", -30)
            } else {
                ("start", 30)
            };
            let position = (
                i64::from(pin.position.0) + inset,
                i64::from(pin.position.1),
            );
            write_label(writer, "sheet-pin", &pin.name, position, pin.size, SHEET_COLOR, anchor)?;
        }
        writer.end_element()?;
        Ok(())
    }
}

fn write_label(
    writer: &mut SvgWriter,
    class: &str,
    text: &str,
    (x, y): (i64, i64),
    size: i32,
    color: &str,
    anchor: &str,
) -> Result<(), WriterError> {
    writer.start_element("text")?;
    writer.write_non_inherited_attribute("class", class)?;
    writer.write_non_inherited_attribute("x", &x.to_string())?;
    writer.write_non_inherited_attribute("y", &y.to_string())?;
    writer.write_inherited_attribute("text-anchor", anchor)?;
    writer.write_inherited_attribute("font-size", &size.to_string())?;
    writer.write_inherited_attribute("fill", color)?;
    writer.write_inherited_attribute("stroke", "none")?;
    writer.write_text(text)?;
    writer.end_element()
}
