//! Turning implicit surfaces into explicit boundary elements.

use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, Mesh};
use crate::topology::Topology;

/// Local node positions (1-based) of each face, in the winding the face
/// element gets. The order is part of the contract and must not be sorted.
pub fn face_nodes(topology: Topology, face: FaceId) -> Option<(Topology, &'static [usize])> {
    use Topology::*;

    let entry: (Topology, &'static [usize]) = match (topology, face.0) {
        (Tet4, 1) => (Tri3, &[1, 3, 2]),
        (Tet4, 2) => (Tri3, &[1, 2, 4]),
        (Tet4, 3) => (Tri3, &[2, 3, 4]),
        (Tet4, 4) => (Tri3, &[1, 4, 3]),

        (Tet10, 1) => (Tri6, &[1, 3, 2, 7, 6, 5]),
        (Tet10, 2) => (Tri6, &[1, 2, 4, 5, 9, 8]),
        (Tet10, 3) => (Tri6, &[2, 3, 4, 6, 10, 9]),
        (Tet10, 4) => (Tri6, &[1, 4, 3, 8, 10, 7]),

        (Hex8, 1) => (Quad4, &[1, 2, 3, 4]),
        (Hex8, 2) => (Quad4, &[5, 8, 7, 6]),
        (Hex8, 3) => (Quad4, &[1, 5, 6, 2]),
        (Hex8, 4) => (Quad4, &[2, 6, 7, 3]),
        (Hex8, 5) => (Quad4, &[3, 7, 8, 4]),
        (Hex8, 6) => (Quad4, &[4, 8, 5, 1]),

        (Hex20, 1) => (Quad8, &[1, 2, 3, 4, 9, 10, 11, 12]),
        (Hex20, 2) => (Quad8, &[5, 8, 7, 6, 16, 15, 14, 13]),
        (Hex20, 3) => (Quad8, &[1, 5, 6, 2, 17, 13, 18, 9]),
        (Hex20, 4) => (Quad8, &[2, 6, 7, 3, 18, 14, 19, 10]),
        (Hex20, 5) => (Quad8, &[3, 7, 8, 4, 19, 15, 20, 11]),
        (Hex20, 6) => (Quad8, &[4, 8, 5, 1, 20, 16, 17, 12]),

        (Wedge6, 1) => (Tri3, &[1, 2, 3]),
        (Wedge6, 2) => (Tri3, &[4, 6, 5]),
        (Wedge6, 3) => (Quad4, &[1, 4, 5, 2]),
        (Wedge6, 4) => (Quad4, &[2, 5, 6, 3]),
        (Wedge6, 5) => (Quad4, &[3, 6, 4, 1]),

        (Wedge15, 1) => (Tri6, &[1, 2, 3, 7, 8, 9]),
        (Wedge15, 2) => (Tri6, &[4, 6, 5, 12, 11, 10]),
        (Wedge15, 3) => (Quad8, &[1, 4, 5, 2, 13, 10, 14, 7]),
        (Wedge15, 4) => (Quad8, &[2, 5, 6, 3, 14, 11, 15, 8]),
        (Wedge15, 5) => (Quad8, &[3, 6, 4, 1, 15, 12, 13, 9]),

        // plane elements: faces are edges
        (Tri3, 1) => (Seg2, &[1, 2]),
        (Tri3, 2) => (Seg2, &[2, 3]),
        (Tri3, 3) => (Seg2, &[3, 1]),

        (Tri6, 1) => (Seg3, &[1, 2, 4]),
        (Tri6, 2) => (Seg3, &[2, 3, 5]),
        (Tri6, 3) => (Seg3, &[3, 1, 6]),

        (Quad4, 1) => (Seg2, &[1, 2]),
        (Quad4, 2) => (Seg2, &[2, 3]),
        (Quad4, 3) => (Seg2, &[3, 4]),
        (Quad4, 4) => (Seg2, &[4, 1]),

        (Quad8, 1) => (Seg3, &[1, 2, 5]),
        (Quad8, 2) => (Seg3, &[2, 3, 6]),
        (Quad8, 3) => (Seg3, &[3, 4, 7]),
        (Quad8, 4) => (Seg3, &[4, 1, 8]),

        _ => return None,
    };
    Some(entry)
}

/// One explicit face element per (element, face) pair of the named surface,
/// in surface order.
pub fn create_surface_elements(
    mesh: &Mesh,
    surface_name: &str,
) -> Result<Vec<(Topology, Vec<i32>)>> {
    let surface = mesh
        .surface(surface_name)
        .ok_or_else(|| MeshError::UnknownSurface(surface_name.to_string()))?;

    let mut out = Vec::with_capacity(surface.faces.len());
    for &(element_id, face) in &surface.faces {
        let element = mesh
            .elements
            .get(&element_id)
            .ok_or_else(|| MeshError::UnknownElement {
                surface: surface.name.clone(),
                element: element_id,
            })?;
        let (face_topology, positions) =
            face_nodes(element.topology, face).ok_or(MeshError::UnsupportedFace {
                topology: element.topology,
                face,
            })?;
        let connectivity = positions
            .iter()
            .map(|&p| {
                element
                    .connectivity
                    .get(p - 1)
                    .copied()
                    .ok_or(MeshError::ShortConnectivity {
                        element: element_id,
                        position: p,
                        face,
                    })
            })
            .collect::<Result<Vec<i32>>>()?;
        out.push((face_topology, connectivity));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Element, Surface, SurfaceKind};

    fn mesh_with(topology: Topology, connectivity: Vec<i32>, faces: Vec<u8>) -> Mesh {
        let mut mesh = Mesh::new();
        mesh.elements.insert(
            1,
            Element {
                id: 1,
                topology,
                code: String::new(),
                connectivity,
            },
        );
        mesh.surfaces.insert(
            "SURF".to_string(),
            Surface {
                name: "SURF".to_string(),
                kind: SurfaceKind::Element,
                faces: faces.into_iter().map(|f| (1, FaceId(f))).collect(),
            },
        );
        mesh
    }

    #[test]
    fn tet_face_keeps_table_winding() {
        let mesh = mesh_with(Topology::Tet4, vec![8, 9, 10, 2], vec![1]);
        let faces = create_surface_elements(&mesh, "SURF").expect("faces");
        assert_eq!(faces, vec![(Topology::Tri3, vec![8, 10, 9])]);
    }

    #[test]
    fn hex_faces_map_through_connectivity() {
        let mesh = mesh_with(
            Topology::Hex8,
            vec![11, 12, 13, 14, 15, 16, 17, 18],
            vec![1, 2, 6],
        );
        let faces = create_surface_elements(&mesh, "SURF").expect("faces");
        assert_eq!(
            faces,
            vec![
                (Topology::Quad4, vec![11, 12, 13, 14]),
                (Topology::Quad4, vec![15, 18, 17, 16]),
                (Topology::Quad4, vec![14, 18, 15, 11]),
            ]
        );
    }

    #[test]
    fn every_table_entry_fits_its_topologies() {
        for topology in Topology::ALL {
            for face in 1..=6 {
                if let Some((face_topology, positions)) = face_nodes(topology, FaceId(face)) {
                    assert_eq!(positions.len(), face_topology.num_nodes());
                    assert!(positions.iter().all(|&p| p >= 1 && p <= topology.num_nodes()));
                }
            }
        }
    }

    #[test]
    fn unknown_face_names_topology_and_face() {
        let mesh = mesh_with(Topology::Tet4, vec![1, 2, 3, 4], vec![5]);
        let err = create_surface_elements(&mesh, "SURF").expect_err("should fail");
        assert!(matches!(
            err,
            MeshError::UnsupportedFace {
                topology: Topology::Tet4,
                face: FaceId(5)
            }
        ));
        assert_eq!(err.to_string(), "no face S5 defined for topology Tet4");
    }

    #[test]
    fn missing_surface_is_an_error() {
        let err = create_surface_elements(&Mesh::new(), "NOPE").expect_err("should fail");
        assert!(matches!(err, MeshError::UnknownSurface(name) if name == "NOPE"));
    }

    #[test]
    fn surface_on_missing_element_is_an_error() {
        let mut mesh = mesh_with(Topology::Tet4, vec![1, 2, 3, 4], vec![1]);
        mesh.elements.clear();
        let err = create_surface_elements(&mesh, "SURF").expect_err("should fail");
        assert!(matches!(err, MeshError::UnknownElement { element: 1, .. }));
    }

    #[test]
    fn short_connectivity_is_an_error() {
        let mesh = mesh_with(Topology::Hex8, vec![1, 2, 3, 4], vec![2]);
        let err = create_surface_elements(&mesh, "SURF").expect_err("should fail");
        assert!(matches!(err, MeshError::ShortConnectivity { position: 5, .. }));
    }
}
