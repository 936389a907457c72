//! Geometry sampling: element centroids from placed node coordinates.

use nalgebra::{Point3, Vector3};

/// One element of a part instance as handed over by the host: its label and
/// the assembly coordinates of its nodes, in connectivity order.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNodes {
    pub label: i32,
    pub nodes: Vec<Point3<f64>>,
}

/// A part instance with its elements, in host enumeration order.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceMesh {
    pub name: String,
    pub part_name: String,
    pub elements: Vec<ElementNodes>,
}

/// Derived geometry of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSample {
    pub instance: String,
    pub part_name: String,
    pub label: i32,
    pub centroid: Point3<f64>,
}

impl ElementSample {
    pub fn from_element(instance: &InstanceMesh, element: &ElementNodes) -> Self {
        Self {
            instance: instance.name.clone(),
            part_name: instance.part_name.clone(),
            label: element.label,
            centroid: centroid(&element.nodes),
        }
    }
}

/// Arithmetic mean of the node positions. Callers guarantee at least one node.
pub fn centroid(nodes: &[Point3<f64>]) -> Point3<f64> {
    let sum = nodes
        .iter()
        .fold(Vector3::zeros(), |acc: Vector3<f64>, p| acc + p.coords);
    Point3::from(sum / nodes.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_square_is_its_center() {
        let nodes = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
        ];
        assert_eq!(centroid(&nodes), Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn centroid_of_single_node_is_the_node() {
        let p = Point3::new(-1.5, 3.0, 7.25);
        assert_eq!(centroid(&[p]), p);
    }

    #[test]
    fn sample_carries_instance_identity() {
        let instance = InstanceMesh {
            name: "Plate-1".to_string(),
            part_name: "Plate".to_string(),
            elements: vec![ElementNodes {
                label: 42,
                nodes: vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)],
            }],
        };
        let sample = ElementSample::from_element(&instance, &instance.elements[0]);
        assert_eq!(sample.instance, "Plate-1");
        assert_eq!(sample.part_name, "Plate");
        assert_eq!(sample.label, 42);
        assert_eq!(sample.centroid, Point3::new(0.5, 0.5, 0.5));
    }
}
