use async_trait::async_trait;
use schsvg_core::lexer::{Token, TokenKind};
use schsvg_core::{
    Cancellation, CancellationSource, ConstructRegistry, ConstructRenderer, InMemoryEnvironment,
    RenderError, RenderOutcome, RenderSession, render, render_with_registry,
};
use std::sync::Arc;

const HEADER: &str = "EESchema Schematic File Version 4\r\n\
LIBS:device\r\n\
EELAYER 26 0\r\n\
EELAYER END\r\n\
$Descr A4 11693 8268\r\n\
encoding utf-8\r\n\
Sheet 1 1\r\n\
Title \"Demo\"\r\n\
$EndDescr\r\n";

const DEVICE_LIB: &str = "EESchema-LIBRARY Version 2.3\n\
#encoding utf-8\n\
DEF R R 0 0 N Y 1 F N\n\
DRAW\n\
S -40 -100 40 100 0 1 10 N\n\
X ~ 1 0 150 50 D 50 50 1 1 P\n\
X ~ 2 0 -150 50 U 50 50 1 1 P\n\
ENDDRAW\n\
ENDDEF\n\
#End Library\n";

fn schematic(body: &str) -> String {
    format!("{HEADER}{body}$EndSCHEMATC\r\n")
}

const BODY: &str = "Wire Wire Line\r\n\t4500 3000 5000 3000\r\n\
Wire Bus Line\r\n\t4500 3500 5000 3500\r\n\
Entry Wire Line\r\n\t5000 3500 5100 3600\r\n\
Connection ~ 5000 3000\r\n\
NoConn ~ 4500 3000\r\n\
Text Notes 4000 2500 0 60 ~ 0\r\nSupply & <regulator>\r\n\
Kmarker 4000 4000\r\n\
$Comp\r\n\
L Device:R R1\r\n\
U 1 1 5A0B1C2D\r\n\
P 6000 3000\r\n\
F 0 \"R1\" V 6080 3000 50  0000 C CNN\r\n\
F 1 \"10k\" V 6000 3000 50  0000 C CNN\r\n\
\t1    6000 3000\r\n\
\t1    0    0    -1  \r\n\
$EndComp\r\n";

#[tokio::test]
async fn test_renders_complete_document() {
    let environment =
        InMemoryEnvironment::new(schematic(BODY)).with_library("device.lib", DEVICE_LIB);
    let outcome = render(&environment, Cancellation::never()).await.unwrap();

    let svg = environment.output();
    let RenderOutcome::Rendered { bytes_written } = outcome else {
        panic!("expected a rendered outcome");
    };
    assert_eq!(bytes_written, svg.len() as u64);

    let doc = roxmltree::Document::parse(&svg).unwrap();
    let root = doc.root_element();
    assert_eq!(root.tag_name().name(), "svg");
    assert_eq!(root.tag_name().namespace(), Some("http://www.w3.org/2000/svg"));
    assert_eq!(root.attribute("width"), Some("297.0022mm"));
    assert_eq!(root.attribute("viewBox"), Some("0 0 11693 8268"));
    assert_eq!(root.attribute("font-family"), Some("sans-serif"));

    let classes: Vec<_> = root
        .children()
        .filter(|n| n.is_element())
        .map(|n| n.attribute("class").unwrap_or_default())
        .collect();
    assert_eq!(
        classes,
        vec!["wire", "bus", "entry wire", "junction", "noconnect", "notes", "component"]
    );

    let note = root.descendants().find(|n| n.has_tag_name("text")).unwrap();
    assert_eq!(note.text(), Some("Supply & <regulator>"));

    let component = root.children().filter(|n| n.is_element()).last().unwrap();
    assert!(
        component
            .descendants()
            .any(|n| n.attribute("class") == Some("symbol"))
    );
    assert_eq!(environment.last_error(), None);
}

#[tokio::test]
async fn test_empty_body() {
    let environment = InMemoryEnvironment::new(schematic(""));
    render(&environment, Cancellation::never()).await.unwrap();
    let svg = environment.output();
    let doc = roxmltree::Document::parse(&svg).unwrap();
    assert_eq!(doc.root_element().children().filter(|n| n.is_element()).count(), 0);
}

#[tokio::test]
async fn test_keywords_are_case_insensitive() {
    let environment = InMemoryEnvironment::new(format!(
        "{HEADER}WIRE Wire Line\n0 0 10 10\n$endschematc\n"
    ));
    render(&environment, Cancellation::never()).await.unwrap();
    assert!(environment.output().contains("class=\"wire\""));
}

#[tokio::test]
async fn test_format_error_before_output_leaves_sink_empty() {
    let environment = InMemoryEnvironment::new(schematic("Wire Wire Line\n1 2 3\n"));
    let failure = render(&environment, Cancellation::never()).await.unwrap_err();

    let RenderError::Format(err) = &failure.error else {
        panic!("expected a format error, got {:?}", failure.error);
    };
    assert!(err.message.contains("integer"));
    assert_eq!(err.location.line, 11);
    assert!(!failure.reported);
    assert!(environment.output().is_empty());
    assert!(environment.last_error().unwrap().contains("integer"));
}

#[tokio::test]
async fn test_error_after_output_started_is_reported_in_band() {
    let wires = "Wire Wire Line\n100 100 200 200\n".repeat(400);
    let body = format!("{wires}Wire Cable Line\n1 2 3 4\n");
    let environment = InMemoryEnvironment::new(schematic(&body));
    let failure = render(&environment, Cancellation::never()).await.unwrap_err();
    assert!(matches!(failure.error, RenderError::Format(_)));

    let svg = environment.output();
    let doc = roxmltree::Document::parse(&svg).unwrap();
    let error = doc
        .descendants()
        .find(|n| n.attribute("class") == Some("error"))
        .unwrap();
    assert_eq!(error.attribute("fill"), Some("rgb(255,0,0)"));
    assert!(error.text().unwrap().contains("Cable"));
}

#[tokio::test]
async fn test_unknown_item() {
    let environment = InMemoryEnvironment::new(schematic("Polyline Wire\n"));
    let failure = render(&environment, Cancellation::never()).await.unwrap_err();
    assert!(failure.error.to_string().contains("\"Polyline\""));
}

#[tokio::test]
async fn test_missing_end_marker() {
    let environment = InMemoryEnvironment::new(format!("{HEADER}Wire Wire Line\n1 2 3 4\n"));
    let failure = render(&environment, Cancellation::never()).await.unwrap_err();
    assert!(failure.error.to_string().contains("$EndSCHEMATC"));
}

#[tokio::test]
async fn test_matching_validator_short_circuits() {
    let environment = InMemoryEnvironment::new(schematic(BODY))
        .with_source_validator("\"abc\"")
        .with_request_validator("\"abc\"");
    let outcome = render(&environment, Cancellation::never()).await.unwrap();
    assert_eq!(outcome, RenderOutcome::NotModified);
    assert!(environment.output().is_empty());
    assert_eq!(environment.response_validator().as_deref(), Some("\"abc\""));
}

#[tokio::test]
async fn test_stale_validator_renders() {
    let environment = InMemoryEnvironment::new(schematic(""))
        .with_source_validator("\"new\"")
        .with_request_validator("\"old\"");
    let outcome = render(&environment, Cancellation::never()).await.unwrap();
    assert!(matches!(outcome, RenderOutcome::Rendered { .. }));
    assert_eq!(environment.response_validator().as_deref(), Some("\"new\""));
}

#[tokio::test]
async fn test_cancelled_render_writes_nothing() {
    let source = CancellationSource::new();
    source.cancel();
    let environment = InMemoryEnvironment::new(schematic(BODY));
    let failure = render(&environment, source.token()).await.unwrap_err();
    assert!(failure.error.is_cancelled());
    assert!(environment.output().is_empty());
}

struct MarkerRenderer;

#[async_trait]
impl ConstructRenderer for MarkerRenderer {
    async fn render(
        &self,
        session: &mut RenderSession<'_>,
        keyword: &Token,
    ) -> Result<(), RenderError> {
        let tz = session.tokenizer();
        let label = tz.read_atom().await?.value()?.to_string();
        tz.read_kind(TokenKind::LineBreak).await?;
        let writer = session.writer();
        writer.start_element("desc")?;
        writer.write_text(&format!("{} {label}", keyword.raw()))?;
        writer.end_element()?;
        Ok(())
    }
}

#[tokio::test]
async fn test_custom_renderers_extend_the_registry() {
    let mut registry = ConstructRegistry::default();
    registry.register("Marker", Arc::new(MarkerRenderer));
    let environment = InMemoryEnvironment::new(schematic("Marker here\n"));
    render_with_registry(&environment, &registry, Cancellation::never())
        .await
        .unwrap();
    assert!(environment.output().contains("<desc>Marker here</desc>"));
}

#[tokio::test]
async fn test_concurrent_renders_stay_independent() {
    let wires = "Wire Wire Line\r\n\t100 100 200 100\r\n".repeat(2000);
    let buses = "Wire Bus Line\r\n\t100 300 200 300\r\n".repeat(2000);
    let first = InMemoryEnvironment::new(schematic(&wires));
    let second = InMemoryEnvironment::new(schematic(&buses));

    let (a, b) = tokio::join!(
        render(&first, Cancellation::never()),
        render(&second, Cancellation::never())
    );
    a.unwrap();
    b.unwrap();

    let (first, second) = (first.output(), second.output());
    roxmltree::Document::parse(&first).unwrap();
    roxmltree::Document::parse(&second).unwrap();
    assert_eq!(first.matches("class=\"wire\"").count(), 2000);
    assert_eq!(second.matches("class=\"bus\"").count(), 2000);
    assert!(!first.contains("class=\"bus\""));
    assert!(!second.contains("class=\"wire\""));
}
