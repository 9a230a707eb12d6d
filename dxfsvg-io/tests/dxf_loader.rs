
use std::f64::consts::TAU;
use std::path::PathBuf;

use glam::DVec2;

use dxfsvg_core::document::Entity;
use dxfsvg_io::{DocumentLoader, DxfFacade, IoError};
use golden::assert_golden;

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

#[test]
fn load_basic_entities_matches_expected_document() {
    let loader = DxfFacade::new();
    let doc = loader
        .load(&fixture("basic_entities.dxf"))
        .expect("读取 DXF 失败");
    assert_golden("basic_entities", &doc);
}

#[test]
fn load_preserves_entity_order_and_skips_other_sections() {
    let doc = DxfFacade::new()
        .load(&fixture("basic_entities.dxf"))
        .expect("读取 DXF 失败");
    let kinds: Vec<&str> = doc.entities().map(|(_, e)| e.kind_name()).collect();
    assert_eq!(
        kinds,
        vec![
            "LINE",
            "CIRCLE",
            "ARC",
            "TEXT",
            "LWPOLYLINE",
            "POLYLINE",
            "ELLIPSE",
            "SPLINE",
            "HATCH"
        ]
    );
}

#[test]
fn lightweight_and_heavy_polylines_stay_distinct() {
    let doc = DxfFacade::new()
        .load(&fixture("basic_entities.dxf"))
        .expect("读取 DXF 失败");

    let lw = doc
        .entities()
        .find_map(|(_, entity)| match entity {
            Entity::LwPolyline(polyline) => Some(polyline),
            _ => None,
        })
        .expect("未找到 LWPOLYLINE");
    assert!(lw.is_closed);
    assert_eq!(lw.vertices.len(), 4);
    assert!((lw.vertices[1].bulge - 0.5).abs() < 1e-12);

    let heavy = doc
        .entities()
        .find_map(|(_, entity)| match entity {
            Entity::Polyline(polyline) => Some(polyline),
            _ => None,
        })
        .expect("未找到 POLYLINE");
    assert!(!heavy.is_closed);
    let points: Vec<DVec2> = heavy.points().map(|p| p.as_vec2()).collect();
    assert_eq!(
        points,
        vec![
            DVec2::new(1.0, 1.0),
            DVec2::new(2.0, 3.0),
            DVec2::new(4.0, 1.0)
        ]
    );
}

#[test]
fn ellipse_defaults_to_full_parameter_range() {
    let source = "0\nSECTION\n2\nENTITIES\n0\nELLIPSE\n8\n0\n10\n0\n20\n0\n11\n2\n21\n0\n40\n0.5\n0\nENDSEC\n0\nEOF\n";
    let doc = DxfFacade::new()
        .parse_str(source)
        .expect("解析 ELLIPSE 失败");
    match doc.entities().next().map(|(_, e)| e) {
        Some(Entity::Ellipse(ellipse)) => {
            assert_eq!(ellipse.start_parameter, 0.0);
            assert!((ellipse.end_parameter - TAU).abs() < 1e-12);
        }
        other => panic!("期望 ELLIPSE，实际为 {other:?}"),
    }
}

#[test]
fn frame_fixture_has_marker_text_and_boundaries() {
    let doc = DxfFacade::new()
        .load(&fixture("frame_drawing.dxf"))
        .expect("读取图框 DXF 失败");
    let marker: Vec<&str> = doc
        .entities()
        .filter(|(_, e)| e.is_on_layer("svgframe"))
        .map(|(_, e)| e.kind_name())
        .collect();
    assert_eq!(marker, vec!["TEXT", "LWPOLYLINE", "LWPOLYLINE"]);
}

#[test]
fn malformed_number_is_invalid_document() {
    let source = "0\nSECTION\n2\nENTITIES\n0\nCIRCLE\n8\n0\n10\nabc\n20\n0\n40\n1\n0\nENDSEC\n0\nEOF\n";
    let err = DxfFacade::new()
        .parse_str(source)
        .expect_err("非法数值应报错");
    match err {
        IoError::InvalidDocument(message) => assert!(message.contains("CIRCLE 圆心 X")),
        other => panic!("期望 InvalidDocument，实际为 {other:?}"),
    }
}
