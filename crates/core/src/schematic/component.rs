use super::{BODY_BACKGROUND, BODY_COLOR, FIELD_COLOR, stroke_width};
use crate::error::RenderError;
use crate::fields::{LineFields, read_line};
use crate::library::{Fill, Symbol, SymbolItem};
use crate::registry::ConstructRenderer;
use crate::session::RenderSession;
use crate::transform::{Placement, rotate_about};
use async_trait::async_trait;
use itertools::Itertools;
use log::{debug, trace};
use schsvg_lexer::{FormatError, Token, TokenKind};
use schsvg_svg::{SvgWriter, WriterError, format_number};
use std::sync::Arc;

/// One `F` line of a placed component.
#[derive(Debug, Clone, PartialEq)]
struct Field {
    number: i32,
    text: String,
    vertical: bool,
    position: (i32, i32),
    size: i32,
    visible: bool,
    anchor: &'static str,
    italic: bool,
    bold: bool,
}

impl Field {
    fn parse(fields: &mut LineFields) -> Result<Self, FormatError> {
        let number = fields.int()?;
        let text = fields.text("the field text")?;
        let orientation = fields.next_token("\"H\" or \"V\"")?;
        let vertical = match orientation.value()? {
            "H" => false,
            "V" => true,
            _ => {
                return Err(orientation.error(format!(
                    "Expected \"H\" or \"V\", got {}",
                    orientation.describe()
                )));
            }
        };
        let position = fields.point()?;
        let size = fields.int()?;
        let visible = fields
            .optional()
            .is_none_or(|flags| !flags.raw().ends_with('1'));
        let anchor = match fields.optional().map(Token::raw) {
            Some("L") => "start",
            Some("R") => "end",
            _ => "middle",
        };
        let style = fields.optional().map(|t| t.raw().to_string()).unwrap_or_default();
        let mut style = style.chars().skip(1);
        Ok(Self {
            number,
            text,
            vertical,
            position,
            size,
            visible,
            anchor,
            italic: style.next() == Some('I'),
            bold: style.next() == Some('B'),
        })
    }

    fn is_shown(&self) -> bool {
        self.visible && self.number <= 1 && !self.text.is_empty() && self.text != "~"
    }
}

/// Everything between `$Comp` and `$EndComp`.
#[derive(Debug, Default)]
struct Component {
    symbol: Option<String>,
    reference: Option<String>,
    unit: i32,
    convert: i32,
    position: Option<(i32, i32)>,
    matrix: Option<(i32, i32, i32, i32)>,
    fields: Vec<Field>,
}

impl Component {
    fn placement(&self) -> Placement {
        let (x, y) = self.position.unwrap_or_default();
        match self.matrix {
            Some((a, b, c, d)) => Placement { a, b, c, d, x, y },
            None => Placement::at(x, y),
        }
    }
}

/// A placed symbol: `$Comp` through `$EndComp`.
///
/// ```text
/// $Comp
/// L Device:R R1
/// U 1 1 5A0B1C2D
/// P 4500 3000
/// F 0 "R1" H 4570 3046 50  0000 L CNN
///     1    4500 3000
///     1    0    0    -1
/// $EndComp
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentRenderer;

impl ComponentRenderer {
    async fn parse(session: &mut RenderSession<'_>) -> Result<Component, RenderError> {
        let tz = session.tokenizer();
        tz.read_kind(TokenKind::LineBreak).await?;
        let mut component = Component {
            unit: 1,
            convert: 1,
            ..Component::default()
        };

        loop {
            let token = tz.read().await?;
            match token.kind() {
                TokenKind::LineBreak => continue,
                TokenKind::Atom => {}
                _ => {
                    return Err(token
                        .error(format!("Expected \"$EndComp\", got {}", token.describe()))
                        .into());
                }
            }
            match token.value()? {
                "$EndComp" => {
                    tz.read_kind(TokenKind::LineBreak).await?;
                    return Ok(component);
                }
                "L" => {
                    let mut fields = read_line(tz).await?;
                    component.symbol = Some(fields.text("a symbol name")?);
                    component.reference = Some(fields.text("a reference")?);
                }
                "U" => {
                    let mut fields = read_line(tz).await?;
                    component.unit = fields.int()?;
                    component.convert = fields.int()?;
                }
                "P" => {
                    let mut fields = read_line(tz).await?;
                    component.position = Some(fields.point()?);
                }
                "F" => {
                    let mut fields = read_line(tz).await?;
                    component.fields.push(Field::parse(&mut fields)?);
                }
                "AR" => tz.skip_to_next_line().await?,
                _ if token.to_int().is_ok() => {
                    let mut fields = read_line(tz).await?;
                    let position = fields.point()?;
                    component.position.get_or_insert(position);
                    let mut matrix = read_line(tz).await?;
                    component.matrix = Some((
                        matrix.int()?,
                        matrix.int()?,
                        matrix.int()?,
                        matrix.int()?,
                    ));
                }
                other => {
                    debug!("skipping component line '{other}' at {}", token.location());
                    tz.skip_to_next_line().await?;
                }
            }
        }
    }
}

#[async_trait]
impl ConstructRenderer for ComponentRenderer {
    async fn render(
        &self,
        session: &mut RenderSession<'_>,
        _keyword: &Token,
    ) -> Result<(), RenderError> {
        let component = Self::parse(session).await?;
        let placement = component.placement();
        trace!(
            "component {} ({}) at {:?}",
            component.reference.as_deref().unwrap_or("?"),
            component.symbol.as_deref().unwrap_or("?"),
            component.position
        );

        let render_components = session.settings().render_components;
        let show_hidden_pins = session.settings().show_hidden_pins;
        let symbol = match &component.symbol {
            Some(name) if render_components => session.find_symbol(name).await?,
            _ => None,
        };

        let writer = session.writer();
        writer.start_element("g")?;
        writer.write_non_inherited_attribute("class", "component")?;
        if let Some(symbol) = symbol {
            write_body(
                writer,
                &symbol,
                &component,
                &placement,
                show_hidden_pins,
            )?;
        }
        let rotated = placement.a == 0;
        for field in component.fields.iter().filter(|f| f.is_shown()) {
            write_field(writer, field, rotated)?;
        }
        writer.end_element()?;
        Ok(())
    }
}

fn write_body(
    writer: &mut SvgWriter,
    symbol: &Arc<Symbol>,
    component: &Component,
    placement: &Placement,
    show_hidden_pins: bool,
) -> Result<(), WriterError> {
    writer.start_element("g")?;
    writer.write_non_inherited_attribute("class", "symbol")?;
    writer.write_non_inherited_attribute("transform", &placement.to_svg())?;
    writer.write_inherited_attribute("stroke", BODY_COLOR)?;
    writer.write_inherited_attribute("fill", "none")?;
    for item in symbol.items_for(component.unit, component.convert) {
        write_item(writer, item, show_hidden_pins)?;
    }
    writer.end_element()
}

fn fill_color(fill: Fill) -> &'static str {
    match fill {
        Fill::Foreground => BODY_COLOR,
        Fill::Background => BODY_BACKGROUND,
        Fill::None => "none",
    }
}

fn write_item(writer: &mut SvgWriter, item: &SymbolItem, show_hidden_pins: bool) -> Result<(), WriterError> {
    match item {
        SymbolItem::Rectangle {
            start,
            end,
            thickness,
            fill,
            ..
        } => {
            writer.start_element("rect")?;
            writer.write_non_inherited_attribute("x", &start.0.min(end.0).to_string())?;
            writer.write_non_inherited_attribute("y", &start.1.min(end.1).to_string())?;
            let width = (i64::from(start.0) - i64::from(end.0)).abs();
            let height = (i64::from(start.1) - i64::from(end.1)).abs();
            writer.write_non_inherited_attribute("width", &width.to_string())?;
            writer.write_non_inherited_attribute("height", &height.to_string())?;
            writer.write_inherited_attribute("stroke-width", &stroke_width(*thickness))?;
            writer.write_inherited_attribute("fill", fill_color(*fill))?;
        }
        SymbolItem::Circle {
            center,
            radius,
            thickness,
            fill,
            ..
        } => {
            writer.start_element("circle")?;
            writer.write_non_inherited_attribute("cx", &center.0.to_string())?;
            writer.write_non_inherited_attribute("cy", &center.1.to_string())?;
            writer.write_non_inherited_attribute("r", &radius.to_string())?;
            writer.write_inherited_attribute("stroke-width", &stroke_width(*thickness))?;
            writer.write_inherited_attribute("fill", fill_color(*fill))?;
        }
        SymbolItem::Polyline {
            points,
            thickness,
            fill,
            ..
        } => {
            let points = points.iter().map(|(x, y)| format!("{x},{y}")).join(" ");
            writer.start_element("polyline")?;
            writer.write_non_inherited_attribute("points", &points)?;
            writer.write_inherited_attribute("stroke-width", &stroke_width(*thickness))?;
            writer.write_inherited_attribute("fill", fill_color(*fill))?;
        }
        SymbolItem::Arc {
            radius,
            angles,
            start,
            end,
            thickness,
            fill,
            ..
        } => {
            let (large_arc, sweep) = arc_flags(*angles);
            let path = format!(
                "M{} {}A{radius} {radius} 0 {large_arc} {sweep} {} {}",
                start.0, start.1, end.0, end.1
            );
            writer.start_element("path")?;
            writer.write_non_inherited_attribute("d", &path)?;
            writer.write_inherited_attribute("stroke-width", &stroke_width(*thickness))?;
            writer.write_inherited_attribute("fill", fill_color(*fill))?;
        }
        SymbolItem::Pin {
            number,
            position,
            length,
            direction,
            visible,
            ..
        } => {
            if !visible && !show_hidden_pins {
                return Ok(());
            }
            let (dx, dy) = direction.delta();
            let length = i64::from(*length);
            let x2 = i64::from(position.0) + i64::from(dx) * length;
            let y2 = i64::from(position.1) + i64::from(dy) * length;
            writer.start_element("line")?;
            writer.write_non_inherited_attribute("class", "pin")?;
            writer.write_non_inherited_attribute("data-pin", number)?;
            writer.write_non_inherited_attribute("x1", &position.0.to_string())?;
            writer.write_non_inherited_attribute("y1", &position.1.to_string())?;
            writer.write_non_inherited_attribute("x2", &x2.to_string())?;
            writer.write_non_inherited_attribute("y2", &y2.to_string())?;
            writer.write_inherited_attribute("stroke-width", &stroke_width(0))?;
        }
    }
    writer.end_element()
}

/// SVG arc flags for an arc running from angle `t1` to `t2` (tenths of a
/// degree) the short way round.
fn arc_flags((t1, t2): (i32, i32)) -> (u8, u8) {
    let mut span = (i64::from(t2) - i64::from(t1)) % 3600;
    if span > 1800 {
        span -= 3600;
    } else if span < -1800 {
        span += 3600;
    }
    (0, u8::from(span > 0))
}

fn write_field(writer: &mut SvgWriter, field: &Field, rotated: bool) -> Result<(), WriterError> {
    let (x, y) = field.position;
    writer.start_element("text")?;
    writer.write_non_inherited_attribute("class", if field.number == 0 { "reference" } else { "value" })?;
    writer.write_non_inherited_attribute("x", &x.to_string())?;
    writer.write_non_inherited_attribute("y", &y.to_string())?;
    if field.vertical != rotated {
        writer.write_non_inherited_attribute("transform", &rotate_about(-90.0, x, y))?;
    }
    writer.write_inherited_attribute("text-anchor", field.anchor)?;
    writer.write_inherited_attribute("dominant-baseline", "central")?;
    writer.write_inherited_attribute("font-size", &format_number(f64::from(field.size)))?;
    writer.write_inherited_attribute("fill", FIELD_COLOR)?;
    writer.write_inherited_attribute("stroke", "none")?;
    if field.italic {
        writer.write_inherited_attribute("font-style", "italic")?;
    }
    if field.bold {
        writer.write_inherited_attribute("font-weight", "bold")?;
    }
    writer.write_text(&field.text)?;
    writer.end_element()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEnvironment;
    use crate::schematic::testing::render_construct_in;
    use crate::settings::RenderSettings;

    const DEVICE_LIB: &str = "EESchema-LIBRARY Version 2.3\n\
#encoding utf-8\n\
DEF R R 0 0 N Y 1 F N\n\
F0 \"R\" 80 0 50 V V C CNN\n\
DRAW\n\
S -40 -100 40 100 0 1 10 f\n\
X ~ 1 0 150 50 D 50 50 1 1 P\n\
X ~ 2 0 -150 50 U 50 50 1 1 P N\n\
ENDDRAW\n\
ENDDEF\n\
#End Library\n";

    const RESISTOR: &str = "\n\
L Device:R R1\n\
U 1 1 5A0B1C2D\n\
P 4500 3000\n\
F 0 \"R1\" V 4580 3000 50  0000 C CNN\n\
F 1 \"10k\" V 4500 3000 50  0000 L CIB\n\
F 2 \"\" V 4430 3000 50  0001 C CNN\n\
\t1    4500 3000\n\
\t1    0    0    -1  \n\
$EndComp\n";

    fn environment() -> InMemoryEnvironment {
        InMemoryEnvironment::new("").with_library("device.lib", DEVICE_LIB)
    }

    async fn render(environment: &InMemoryEnvironment, text: &str) -> Result<String, RenderError> {
        render_construct_in(environment, &["device"], &ComponentRenderer, "$Comp", text).await
    }

    #[tokio::test]
    async fn test_component_draws_body_and_fields() {
        let svg = render(&environment(), RESISTOR).await.unwrap();
        let doc = roxmltree::Document::parse(&svg).unwrap();
        let group = doc.root_element().first_element_child().unwrap();
        assert_eq!(group.attribute("class"), Some("component"));

        let body = group.first_element_child().unwrap();
        assert_eq!(body.attribute("class"), Some("symbol"));
        assert_eq!(body.attribute("transform"), Some("matrix(1 0 0 -1 4500 3000)"));
        let rect = body.first_element_child().unwrap();
        assert_eq!(rect.tag_name().name(), "rect");
        assert_eq!(rect.attribute("x"), Some("-40"));
        assert_eq!(rect.attribute("height"), Some("200"));
        assert_eq!(rect.attribute("stroke-width"), Some("10"));
        assert_eq!(rect.attribute("fill"), Some(BODY_BACKGROUND));

        let pins: Vec<_> = body
            .children()
            .filter(|n| n.attribute("class") == Some("pin"))
            .collect();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].attribute("y2"), Some("100"));

        let texts: Vec<_> = group
            .children()
            .filter(|n| n.has_tag_name("text"))
            .collect();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].text(), Some("R1"));
        assert_eq!(texts[0].attribute("transform"), Some("rotate(-90 4580 3000)"));
        assert_eq!(texts[1].text(), Some("10k"));
        assert_eq!(texts[1].attribute("text-anchor"), Some("start"));
        assert_eq!(texts[1].attribute("font-style"), Some("italic"));
        assert_eq!(texts[1].attribute("font-weight"), Some("bold"));
    }

    #[tokio::test]
    async fn test_hidden_pins_can_be_shown() {
        let environment = environment().with_settings(RenderSettings {
            show_hidden_pins: true,
            ..RenderSettings::default()
        });
        let svg = render(&environment, RESISTOR).await.unwrap();
        assert_eq!(svg.matches("class=\"pin\"").count(), 2);
    }

    #[tokio::test]
    async fn test_components_can_be_disabled() {
        let environment = environment().with_settings(RenderSettings {
            render_components: false,
            ..RenderSettings::default()
        });
        let svg = render(&environment, RESISTOR).await.unwrap();
        assert!(!svg.contains("class=\"symbol\""));
        assert!(svg.contains(">R1<"));
    }

    #[tokio::test]
    async fn test_unknown_symbol_keeps_fields() {
        let text = RESISTOR.replace("Device:R R1", "Device:Q_NPN Q1");
        let svg = render(&environment(), &text).await.unwrap();
        assert!(!svg.contains("class=\"symbol\""));
        assert!(svg.contains(">R1<"));
    }

    #[tokio::test]
    async fn test_missing_library_is_skipped() {
        let svg = render(&InMemoryEnvironment::new(""), RESISTOR).await.unwrap();
        assert!(!svg.contains("class=\"symbol\""));
    }

    #[tokio::test]
    async fn test_unterminated_component() {
        let err = render(&environment(), "\nL Device:R R1\nP 0 0\n")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("$EndComp"), "{err}");
    }

    #[tokio::test]
    async fn test_bad_field_orientation() {
        let err = render(&environment(), "\nF 0 \"R1\" X 0 0 50 0000 C CNN\n$EndComp\n")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("\"H\" or \"V\""), "{err}");
    }

    #[test]
    fn test_arc_flags_take_the_short_way() {
        assert_eq!(arc_flags((0, 900)), (0, 1));
        assert_eq!(arc_flags((900, 0)), (0, 0));
        assert_eq!(arc_flags((-1799, 1799)), (0, 0));
        assert_eq!(arc_flags((3500, 100)), (0, 1));
        assert_eq!(arc_flags((i32::MIN, i32::MAX)), (0, 0));
        assert_eq!(arc_flags((i32::MAX, i32::MIN)), (0, 1));
    }

    #[tokio::test]
    async fn test_body_at_coordinate_limits() {
        let library = "EESchema-LIBRARY Version 2.3\n\
DEF BIG U 0 0 Y Y 1 F N\n\
DRAW\n\
S -2147483648 -2147483648 2147483647 2147483647 0 1 0 N\n\
X ~ 1 2147483647 -2147483648 2147483647 R 50 50 1 1 P\n\
X ~ 2 -2147483648 2147483647 2147483647 L 50 50 1 1 P\n\
ENDDRAW\n\
ENDDEF\n";
        let environment = InMemoryEnvironment::new("").with_library("device.lib", library);
        let text = "\nL BIG U1\nU 1 1 5A0B1C2D\nP 2147483647 -2147483648\n\t1    2147483647 -2147483648\n\t1    0    0    -1  \n$EndComp\n";
        let svg = render(&environment, text).await.unwrap();
        let doc = roxmltree::Document::parse(&svg).unwrap();
        let body = doc
            .descendants()
            .find(|n| n.attribute("class") == Some("symbol"))
            .unwrap();
        assert_eq!(
            body.attribute("transform"),
            Some("matrix(1 0 0 -1 2147483647 -2147483648)")
        );
        let rect = body.first_element_child().unwrap();
        assert_eq!(rect.attribute("width"), Some("4294967295"));
        assert_eq!(rect.attribute("height"), Some("4294967295"));

        let pins: Vec<_> = body
            .children()
            .filter(|n| n.attribute("class") == Some("pin"))
            .map(|n| (n.attribute("x2").unwrap(), n.attribute("y2").unwrap()))
            .collect();
        assert_eq!(
            pins,
            [("4294967294", "-2147483648"), ("-4294967295", "2147483647")]
        );
    }
}
