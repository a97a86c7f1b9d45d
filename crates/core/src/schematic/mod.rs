//! Renderers for the top-level constructs of a schematic body.
//!
//! Each renderer is entered with the keyword already consumed and returns
//! with the construct's final line break consumed.

mod component;
mod line;
mod marker;
mod sheet;
mod skip;
mod text;

pub use component::ComponentRenderer;
pub use line::{LineRenderer, LineStyle};
pub use marker::{JunctionRenderer, NoConnectRenderer};
pub use sheet::SheetRenderer;
pub use skip::{SkipBlockRenderer, SkipLineRenderer};
pub use text::{TextKind, TextRenderer};

use schsvg_svg::{SvgWriter, WriterError, format_number};

pub(crate) const WIRE_COLOR: &str = "rgb(0,132,0)";
pub(crate) const BUS_COLOR: &str = "rgb(0,0,132)";
pub(crate) const BODY_COLOR: &str = "rgb(132,0,0)";
pub(crate) const BODY_BACKGROUND: &str = "rgb(255,255,194)";
pub(crate) const FIELD_COLOR: &str = "rgb(0,132,132)";
pub(crate) const SHEET_COLOR: &str = "rgb(132,0,132)";
pub(crate) const SHEET_FILE_COLOR: &str = "rgb(132,132,0)";

/// Line width used where the document gives a thickness of zero.
pub(crate) const DEFAULT_LINE_WIDTH: i32 = 6;

/// Writes `text` as the content of the open `<text>` element. KiCad stores
/// line breaks as a literal `\n`; each line after the first becomes a
/// `tspan` placed one line below the previous one.
pub(crate) fn write_text_lines(writer: &mut SvgWriter, x: i32, text: &str) -> Result<(), WriterError> {
    if !text.contains("\\n") {
        return writer.write_text(text);
    }
    for (index, line) in text.split("\\n").enumerate() {
        writer.start_element("tspan")?;
        writer.write_non_inherited_attribute("x", &x.to_string())?;
        if index > 0 {
            writer.write_non_inherited_attribute("dy", "1.2em")?;
        }
        writer.write_text(line)?;
        writer.end_element()?;
    }
    Ok(())
}

pub(crate) fn stroke_width(thickness: i32) -> String {
    let width = if thickness > 0 {
        thickness
    } else {
        DEFAULT_LINE_WIDTH
    };
    format_number(f64::from(width))
}
