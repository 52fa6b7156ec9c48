//! Reading whole decks into meshes.

use std::fs;
use std::path::PathBuf;

use abq_mesh::{
    ElementRegistry, FaceId, MeshError, MeshReader, Topology, create_surface_elements, parse_mesh,
    parse_mesh_str,
};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("../../tests/fixtures");
    path.push(name);
    path
}

#[test]
fn node_count_and_coordinates_follow_the_deck() {
    let rows: Vec<(i32, [f64; 3])> = (1..=25)
        .map(|i| (i * 3, [i as f64 * 0.5, -(i as f64), 1.0e-3 * i as f64]))
        .collect();
    let mut src = String::from("*NODE\n");
    for (id, [x, y, z]) in &rows {
        src.push_str(&format!("{id}, {x:e}, {y}, {z:e}\n"));
    }

    let mesh = parse_mesh_str(&src).expect("mesh should parse");
    assert_eq!(mesh.nodes.len(), rows.len());
    for (id, coords) in &rows {
        assert_eq!(mesh.coordinates(*id), Some(&coords[..]));
    }
}

#[test]
fn every_registered_code_parses_with_its_node_count() {
    let registry = ElementRegistry::builtin();
    for (code, info) in registry.entries() {
        let connectivity: Vec<String> = (1..=info.node_count).map(|n| n.to_string()).collect();
        let src = format!("*ELEMENT, TYPE={code}\n7, {}\n", connectivity.join(", "));
        let mesh = parse_mesh_str(&src).unwrap_or_else(|e| panic!("{code}: {e}"));
        assert_eq!(mesh.elements.len(), 1, "{code}");
        assert_eq!(mesh.topology(7), Some(info.topology), "{code}");
        assert_eq!(mesh.connectivity(7).map(<[i32]>::len), Some(info.node_count), "{code}");
        assert_eq!(mesh.element_code(7), Some(code), "{code}");
    }
}

#[test]
fn every_registered_code_rejects_short_connectivity() {
    let registry = ElementRegistry::builtin();
    for (code, info) in registry.entries() {
        let connectivity: Vec<String> = (1..info.node_count).map(|n| n.to_string()).collect();
        let src = format!("*ELEMENT, TYPE={code}\n7, {}\n", connectivity.join(", "));
        let err = parse_mesh_str(&src).expect_err(code);
        assert!(
            matches!(err, MeshError::IncompleteElement { element: 7, .. }),
            "{code}: {err}"
        );
    }
}

#[test]
fn mixed_case_keywords_parse_like_uppercase() {
    let lower = fs::read_to_string(fixture_path("mixed_case.inp")).expect("read fixture");
    let upper = lower
        .lines()
        .map(|l| {
            if l.starts_with('*') {
                let (kw, rest) = l.split_once(',').unwrap_or((l, ""));
                if rest.is_empty() {
                    kw.to_uppercase()
                } else {
                    format!("{},{rest}", kw.to_uppercase())
                }
            } else {
                l.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let a = parse_mesh_str(&lower).expect("mixed case should parse");
    let b = parse_mesh_str(&upper).expect("upper case should parse");
    assert_eq!(a, b);
    assert_eq!(a.topology(1), Some(Topology::Tet4));
    assert_eq!(a.node_set("Nall").map(<[i32]>::len), Some(4));
}

#[test]
fn registration_extends_the_reader() {
    let src = "*ELEMENT, TYPE=USER4\n1, 1, 2, 3, 4\n";
    let mut reader = MeshReader::default();
    assert!(matches!(
        reader.read_str(src),
        Err(MeshError::UnknownElementType { .. })
    ));

    reader.registry_mut().register("USER4", 3, Topology::Tri3);
    reader.registry_mut().register("USER4", 4, Topology::Quad4);
    let mesh = reader.read_str(src).expect("registered code should parse");
    assert_eq!(mesh.topology(1), Some(Topology::Quad4));
}

#[test]
fn cube_fixture_surface_materializes() {
    let mesh = parse_mesh(fixture_path("cube.inp")).expect("cube should parse");
    assert_eq!(mesh.nodes.len(), 8);
    assert_eq!(mesh.elements.len(), 1);
    assert_eq!(mesh.node_set("TOP"), Some(&[5, 6, 7, 8][..]));

    let surface = mesh.surface("TOPFACE").expect("surface");
    assert_eq!(surface.faces, vec![(1, FaceId(2))]);
    let faces = create_surface_elements(&mesh, "TOPFACE").expect("faces");
    assert_eq!(faces, vec![(Topology::Quad4, vec![5, 8, 7, 6])]);
}

#[test]
fn part_fixture_is_flattened() {
    let mesh = parse_mesh(fixture_path("bracket_parts.inp")).expect("parts should parse");
    assert_eq!(mesh.nodes.len(), 12);
    assert_eq!(mesh.elements.len(), 2);
    assert_eq!(mesh.connectivity(2), Some(&[5, 6, 7, 8, 9, 10, 11, 12][..]));
    assert_eq!(mesh.element_set("Block.Solid"), Some(&[2][..]));
    assert_eq!(mesh.node_set("Plate.Corner"), Some(&[1][..]));
    assert_eq!(mesh.parts.keys().collect::<Vec<_>>(), vec!["Plate", "Block"]);

    let faces = create_surface_elements(&mesh, "Block.Bottom").expect("faces");
    assert_eq!(faces, vec![(Topology::Quad4, vec![5, 6, 7, 8])]);
}

#[test]
fn file_reading_expands_includes() {
    let tmp = tempfile::tempdir().expect("create temp directory");
    let root = tmp.path().join("model.inp");
    fs::write(&root, "*INCLUDE, INPUT=nodes.inc\n*ELEMENT, TYPE=T3D2\n1, 1, 2\n")
        .expect("write root");
    fs::write(tmp.path().join("nodes.inc"), "*NODE\n1, 0, 0, 0\n2, 1, 0, 0\n")
        .expect("write include");

    let mesh = parse_mesh(&root).expect("mesh should parse");
    assert_eq!(mesh.nodes.len(), 2);
    assert_eq!(mesh.connectivity(1), Some(&[1, 2][..]));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = parse_mesh("/nonexistent/deck.inp").expect_err("should fail");
    assert!(err.to_string().contains("failed to read"), "{err}");
}

#[test]
fn mesh_serializes_to_json() {
    let mesh = parse_mesh(fixture_path("cube.inp")).expect("cube should parse");
    let json = serde_json::to_value(&mesh).expect("serialize");
    assert_eq!(json["elements"]["1"]["topology"], "Hex8");
    assert_eq!(json["surfaces"]["TOPFACE"]["faces"][0][1], "S2");
}
