use super::{BODY_COLOR, BUS_COLOR, write_text_lines};
use crate::error::RenderError;
use crate::fields::read_line;
use crate::registry::ConstructRenderer;
use crate::session::RenderSession;
use crate::transform::rotate_about;
use async_trait::async_trait;
use schsvg_lexer::{Token, TokenKind, token_enum};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Notes,
    Label,
    GlobalLabel,
    HierarchicalLabel,
}

token_enum!(TextKind {
    TextKind::Notes => ["Notes"],
    TextKind::Label => ["Label"],
    TextKind::GlobalLabel => ["GLabel"],
    TextKind::HierarchicalLabel => ["HLabel"],
});

impl TextKind {
    fn class(self) -> &'static str {
        match self {
            TextKind::Notes => "notes",
            TextKind::Label => "label",
            TextKind::GlobalLabel => "glabel",
            TextKind::HierarchicalLabel => "hlabel",
        }
    }

    fn color(self) -> &'static str {
        match self {
            TextKind::Notes => BUS_COLOR,
            TextKind::Label => "rgb(0,0,0)",
            TextKind::GlobalLabel => BODY_COLOR,
            TextKind::HierarchicalLabel => "rgb(132,132,0)",
        }
    }

    fn has_shape(self) -> bool {
        matches!(self, TextKind::GlobalLabel | TextKind::HierarchicalLabel)
    }
}

/// `Text <kind> x y orientation size ...` followed by a line of text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

#[async_trait]
impl ConstructRenderer for TextRenderer {
    async fn render(
        &self,
        session: &mut RenderSession<'_>,
        _keyword: &Token,
    ) -> Result<(), RenderError> {
        let tz = session.tokenizer();
        let kind: TextKind = tz.read_enum().await?;
        let x = tz.read_int().await?;
        let y = tz.read_int().await?;
        let orientation_token = tz.read_atom().await?;
        let orientation = orientation_token.to_int()?;
        if !(0..=3).contains(&orientation) {
            return Err(orientation_token
                .error(format!(
                    "Expected an orientation from 0 to 3, got {}",
                    orientation_token.describe()
                ))
                .into());
        }
        let size = tz.read_int().await?;

        let mut fields = read_line(tz).await?;
        if kind.has_shape() {
            fields.next_token("a label shape")?;
        }
        let italic = fields.optional().is_some_and(|flag| flag.is("Italic"));

        let text = tz.read_text_until(&[TokenKind::LineBreak]).await?;
        let end = tz.read().await?;
        if !matches!(end.kind(), TokenKind::LineBreak | TokenKind::EndOfFile) {
            return Err(end
                .error(format!("Expected LineBreak, got {}", end.describe()))
                .into());
        }

        let writer = session.writer();
        writer.start_element("text")?;
        writer.write_non_inherited_attribute("class", kind.class())?;
        writer.write_non_inherited_attribute("x", &x.to_string())?;
        writer.write_non_inherited_attribute("y", &y.to_string())?;
        if orientation % 2 == 1 {
            writer.write_non_inherited_attribute("transform", &rotate_about(-90.0, x, y))?;
        }
        let anchor = if orientation >= 2 { "end" } else { "start" };
        writer.write_inherited_attribute("text-anchor", anchor)?;
        writer.write_inherited_attribute("font-size", &size.to_string())?;
        writer.write_inherited_attribute("fill", kind.color())?;
        writer.write_inherited_attribute("stroke", "none")?;
        if italic {
            writer.write_inherited_attribute("font-style", "italic")?;
        }
        write_text_lines(writer, x, &text)?;
        writer.end_element()?;
        Ok(())
    }
}
