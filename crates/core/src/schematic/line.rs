use super::{BUS_COLOR, WIRE_COLOR};
use crate::error::RenderError;
use crate::registry::ConstructRenderer;
use crate::session::RenderSession;
use async_trait::async_trait;
use schsvg_lexer::{Token, TokenKind, token_enum};

const NOTES_DASH: &str = "13.685,15.8425";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Wire,
    Bus,
    Notes,
}

token_enum!(LineStyle {
    LineStyle::Wire => ["Wire"],
    LineStyle::Bus => ["Bus"],
    LineStyle::Notes => ["Notes"],
});

impl LineStyle {
    fn stroke(self) -> &'static str {
        match self {
            LineStyle::Wire => WIRE_COLOR,
            LineStyle::Bus | LineStyle::Notes => BUS_COLOR,
        }
    }

    fn width(self) -> &'static str {
        match self {
            LineStyle::Bus => "12",
            LineStyle::Wire | LineStyle::Notes => "6",
        }
    }

    fn class(self, entry: bool) -> &'static str {
        match (entry, self) {
            (true, LineStyle::Bus) => "entry bus",
            (true, _) => "entry wire",
            (false, LineStyle::Wire) => "wire",
            (false, LineStyle::Bus) => "bus",
            (false, LineStyle::Notes) => "notes",
        }
    }
}

/// `Wire` and `Entry` segments.
///
/// ```text
/// Wire Wire Line
///     4500 3000 5000 3000
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LineRenderer;

#[async_trait]
impl ConstructRenderer for LineRenderer {
    async fn render(
        &self,
        session: &mut RenderSession<'_>,
        keyword: &Token,
    ) -> Result<(), RenderError> {
        let entry = keyword.value()?.eq_ignore_ascii_case("entry");
        let tz = session.tokenizer();

        let style_token = tz.read().await?;
        let style: LineStyle = style_token.to_enum()?;
        if entry && style == LineStyle::Notes {
            return Err(style_token
                .error("Bus entries cannot use the Notes style")
                .into());
        }
        let literals: &[&str] = if entry && style == LineStyle::Bus {
            &["Line", "Bus"]
        } else {
            &["Line"]
        };
        tz.read_literal(literals).await?;
        tz.read_kind(TokenKind::LineBreak).await?;

        let x1 = tz.read_int().await?;
        let y1 = tz.read_int().await?;
        let x2 = tz.read_int().await?;
        let y2 = tz.read_int().await?;
        tz.read_kind(TokenKind::LineBreak).await?;

        let writer = session.writer();
        writer.start_element("line")?;
        writer.write_non_inherited_attribute("class", style.class(entry))?;
        writer.write_non_inherited_attribute("x1", &x1.to_string())?;
        writer.write_non_inherited_attribute("y1", &y1.to_string())?;
        writer.write_non_inherited_attribute("x2", &x2.to_string())?;
        writer.write_non_inherited_attribute("y2", &y2.to_string())?;
        writer.write_inherited_attribute("stroke", style.stroke())?;
        writer.write_inherited_attribute("stroke-width", style.width())?;
        if style == LineStyle::Notes {
            writer.write_inherited_attribute("stroke-dasharray", NOTES_DASH)?;
        }
        writer.end_element()?;
        Ok(())
    }
}
