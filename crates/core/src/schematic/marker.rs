//! Point markers: junction dots and no-connect crosses.

use super::{BUS_COLOR, WIRE_COLOR};
use crate::error::RenderError;
use crate::registry::ConstructRenderer;
use crate::session::RenderSession;
use async_trait::async_trait;
use schsvg_lexer::{Token, TokenKind};

/// Reads `~ x y` and the line break.
async fn read_marker(session: &mut RenderSession<'_>) -> Result<(i32, i32), RenderError> {
    let tz = session.tokenizer();
    tz.read_literal(&["~"]).await?;
    let x = tz.read_int().await?;
    let y = tz.read_int().await?;
    tz.read_kind(TokenKind::LineBreak).await?;
    Ok((x, y))
}

/// `Connection ~ x y`
#[derive(Debug, Clone, Copy, Default)]
pub struct JunctionRenderer;

#[async_trait]
impl ConstructRenderer for JunctionRenderer {
    async fn render(
        &self,
        session: &mut RenderSession<'_>,
        _keyword: &Token,
    ) -> Result<(), RenderError> {
        let (x, y) = read_marker(session).await?;
        let radius = session.settings().junction_radius;

        let writer = session.writer();
        writer.start_element("circle")?;
        writer.write_non_inherited_attribute("class", "junction")?;
        writer.write_non_inherited_attribute("cx", &x.to_string())?;
        writer.write_non_inherited_attribute("cy", &y.to_string())?;
        writer.write_non_inherited_attribute("r", &radius.to_string())?;
        writer.write_inherited_attribute("fill", WIRE_COLOR)?;
        writer.write_inherited_attribute("stroke", "none")?;
        writer.end_element()?;
        Ok(())
    }
}

/// `NoConn ~ x y`
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConnectRenderer;

#[async_trait]
impl ConstructRenderer for NoConnectRenderer {
    async fn render(
        &self,
        session: &mut RenderSession<'_>,
        _keyword: &Token,
    ) -> Result<(), RenderError> {
        let (x, y) = read_marker(session).await?;
        let (x, y) = (i64::from(x), i64::from(y));
        let s = i64::from(session.settings().no_connect_size);
        let path = format!(
            "M{} {}L{} {}M{} {}L{} {}",
            x - s,
            y - s,
            x + s,
            y + s,
            x + s,
            y - s,
            x - s,
            y + s
        );

        let writer = session.writer();
        writer.start_element("path")?;
        writer.write_non_inherited_attribute("class", "noconnect")?;
        writer.write_non_inherited_attribute("d", &path)?;
        writer.write_inherited_attribute("stroke", BUS_COLOR)?;
        writer.write_inherited_attribute("stroke-width", "6")?;
        writer.write_inherited_attribute("fill", "none")?;
        writer.end_element()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEnvironment;
    use crate::schematic::testing::{render_construct, render_construct_in};
    use crate::settings::RenderSettings;

    #[tokio::test]
    async fn test_junction() {
        let svg = render_construct(&JunctionRenderer, "Connection", "~ 4500 3000\n")
            .await
            .unwrap();
        let doc = roxmltree::Document::parse(&svg).unwrap();
        let circle = doc.root_element().first_element_child().unwrap();
        assert_eq!(circle.tag_name().name(), "circle");
        assert_eq!(circle.attribute("class"), Some("junction"));
        assert_eq!(circle.attribute("cx"), Some("4500"));
        assert_eq!(circle.attribute("cy"), Some("3000"));
        assert_eq!(circle.attribute("r"), Some("20"));
        assert_eq!(circle.attribute("fill"), Some(WIRE_COLOR));
    }

    #[tokio::test]
    async fn test_junction_radius_comes_from_settings() {
        let environment = InMemoryEnvironment::new("").with_settings(RenderSettings {
            junction_radius: 35,
            ..RenderSettings::default()
        });
        let svg = render_construct_in(&environment, &[], &JunctionRenderer, "Connection", "~ 0 0\n")
            .await
            .unwrap();
        assert!(svg.contains("r=\"35\""), "{svg}");
    }

    #[tokio::test]
    async fn test_no_connect_draws_cross() {
        let svg = render_construct(&NoConnectRenderer, "NoConn", "~ 100 200\r\n")
            .await
            .unwrap();
        let doc = roxmltree::Document::parse(&svg).unwrap();
        let path = doc.root_element().first_element_child().unwrap();
        assert_eq!(path.attribute("class"), Some("noconnect"));
        assert_eq!(path.attribute("d"), Some("M76 176L124 224M124 176L76 224"));
    }

    #[tokio::test]
    async fn test_no_connect_at_coordinate_limits() {
        let svg = render_construct(&NoConnectRenderer, "NoConn", "~ 2147483647 -2147483648\n")
            .await
            .unwrap();
        let doc = roxmltree::Document::parse(&svg).unwrap();
        let path = doc.root_element().first_element_child().unwrap();
        assert_eq!(
            path.attribute("d"),
            Some("M2147483623 -2147483672L2147483671 -2147483624M2147483671 -2147483672L2147483623 -2147483624")
        );
    }

    #[tokio::test]
    async fn test_marker_requires_tilde() {
        let err = render_construct(&JunctionRenderer, "Connection", "4500 3000\n")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("\"~\""), "{err}");
    }
}
