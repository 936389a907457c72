//! Part and instance geometry read from the deck itself.
//!
//! Parts supply node coordinates and element connectivity, instances place a
//! part in the assembly. The instance order of the deck is the enumeration
//! order the category slots follow.

use std::collections::HashMap;
use std::path::Path;

use nalgebra::{Point3, Rotation3, Unit, Vector3};
use sfi_inp::{Card, Deck, DeckBuffer};
use sfi_model::{ElementNodes, InstanceMesh};

use crate::error::{AssemblyError, Result};

/// Mesh of one `*Part` definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartGeometry {
    pub name: String,
    pub nodes: HashMap<i32, Point3<f64>>,
    /// Element label and node labels, in deck order.
    pub elements: Vec<(i32, Vec<i32>)>,
}

/// Rigid placement of an instance: translation first, then an optional
/// rotation about the axis through two points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placement {
    pub translation: Vector3<f64>,
    pub rotation: Option<Rotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rotation {
    pub axis_start: Point3<f64>,
    pub axis_end: Point3<f64>,
    pub angle_deg: f64,
}

impl Placement {
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        let moved = *point + self.translation;
        match &self.rotation {
            Some(rotation) => rotation.apply(&moved),
            None => moved,
        }
    }
}

impl Rotation {
    fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        // validated on construction
        let Some(axis) = Unit::try_new(self.axis_end - self.axis_start, f64::EPSILON) else {
            return *point;
        };
        let rotation = Rotation3::from_axis_angle(&axis, self.angle_deg.to_radians());
        self.axis_start + rotation * (*point - self.axis_start)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDef {
    pub name: String,
    pub part: String,
    pub placement: Placement,
    pub line: usize,
}

/// Parts and instances of a deck.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssemblyModel {
    pub parts: HashMap<String, PartGeometry>,
    pub instances: Vec<InstanceDef>,
}

impl AssemblyModel {
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let buffer = DeckBuffer::read_file(path)?;
        Self::from_buffer(&buffer)
    }

    pub fn from_buffer(buffer: &DeckBuffer) -> Result<Self> {
        let deck = Deck::from_buffer(buffer)?;
        Ok(Self::from_deck(&deck)?)
    }

    pub fn from_deck(deck: &Deck) -> std::result::Result<Self, AssemblyError> {
        let mut model = AssemblyModel::default();
        let mut part: Option<PartGeometry> = None;

        for card in &deck.cards {
            match card.normalized_keyword().as_str() {
                "PART" => {
                    let name = required_parameter(card, "NAME")?;
                    part = Some(PartGeometry {
                        name: name.to_string(),
                        ..PartGeometry::default()
                    });
                }
                "ENDPART" => {
                    let finished = part.take().ok_or_else(|| AssemblyError {
                        line: card.line_start,
                        message: "*End Part without *Part".to_string(),
                    })?;
                    model.parts.insert(finished.name.clone(), finished);
                }
                "NODE" => {
                    if let Some(part) = part.as_mut() {
                        parse_nodes(card, part)?;
                    }
                }
                "ELEMENT" => {
                    if let Some(part) = part.as_mut() {
                        parse_elements(card, part)?;
                    }
                }
                "INSTANCE" => model.instances.push(parse_instance(card)?),
                _ => {}
            }
        }

        if let Some(open) = part {
            return Err(AssemblyError {
                line: 0,
                message: format!("part {} is never closed by *End Part", open.name),
            });
        }

        for instance in &model.instances {
            if !model.parts.contains_key(&instance.part) {
                return Err(AssemblyError {
                    line: instance.line,
                    message: format!(
                        "instance {} references undefined part {}",
                        instance.name, instance.part
                    ),
                });
            }
        }

        Ok(model)
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Placed element geometry of every instance, in deck order.
    pub fn instance_meshes(&self) -> std::result::Result<Vec<InstanceMesh>, AssemblyError> {
        self.instances
            .iter()
            .map(|instance| self.instance_mesh(instance))
            .collect()
    }

    fn instance_mesh(&self, instance: &InstanceDef) -> std::result::Result<InstanceMesh, AssemblyError> {
        let part = self.parts.get(&instance.part).ok_or_else(|| AssemblyError {
            line: instance.line,
            message: format!("undefined part {}", instance.part),
        })?;

        let mut elements = Vec::with_capacity(part.elements.len());
        for (label, connectivity) in &part.elements {
            let mut nodes = Vec::with_capacity(connectivity.len());
            for node in connectivity {
                let point = part.nodes.get(node).ok_or_else(|| AssemblyError {
                    line: instance.line,
                    message: format!(
                        "element {label} of part {} references undefined node {node}",
                        part.name
                    ),
                })?;
                nodes.push(instance.placement.apply(point));
            }
            elements.push(ElementNodes {
                label: *label,
                nodes,
            });
        }

        Ok(InstanceMesh {
            name: instance.name.clone(),
            part_name: part.name.clone(),
            elements,
        })
    }
}

fn required_parameter<'a>(card: &'a Card, key: &str) -> std::result::Result<&'a str, AssemblyError> {
    card.parameter(key).ok_or_else(|| AssemblyError {
        line: card.line_start,
        message: format!("*{} card missing {} parameter", card.keyword, key),
    })
}

fn parse_fields<T: std::str::FromStr>(
    line: &str,
    card: &Card,
    what: &str,
) -> std::result::Result<Vec<T>, AssemblyError> {
    line.split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(|field| {
            field.parse::<T>().map_err(|_| AssemblyError {
                line: card.line_start,
                message: format!("invalid {what} value '{field}' in *{}", card.keyword),
            })
        })
        .collect()
}

fn parse_nodes(card: &Card, part: &mut PartGeometry) -> std::result::Result<(), AssemblyError> {
    for data_line in &card.data_lines {
        let mut fields = data_line.split(',').map(str::trim);
        let label = fields
            .next()
            .and_then(|f| f.parse::<i32>().ok())
            .ok_or_else(|| AssemblyError {
                line: card.line_start,
                message: format!("invalid node line '{data_line}'"),
            })?;
        let coords: Vec<f64> = parse_fields(&fields.collect::<Vec<_>>().join(","), card, "coordinate")?;
        if coords.is_empty() || coords.len() > 3 {
            return Err(AssemblyError {
                line: card.line_start,
                message: format!("node {label} must have 1 to 3 coordinates"),
            });
        }
        let coord = |i: usize| coords.get(i).copied().unwrap_or(0.0);
        part.nodes.insert(label, Point3::new(coord(0), coord(1), coord(2)));
    }
    Ok(())
}

// Element records continue on the next line while the current one ends in a comma.
fn parse_elements(card: &Card, part: &mut PartGeometry) -> std::result::Result<(), AssemblyError> {
    let mut record = String::new();
    for data_line in &card.data_lines {
        record.push_str(data_line);
        if data_line.ends_with(',') {
            continue;
        }
        push_element(&record, card, part)?;
        record.clear();
    }
    if !record.is_empty() {
        push_element(&record, card, part)?;
    }
    Ok(())
}

fn push_element(record: &str, card: &Card, part: &mut PartGeometry) -> std::result::Result<(), AssemblyError> {
    let fields: Vec<i32> = parse_fields(record, card, "element")?;
    match fields.split_first() {
        Some((label, nodes)) if !nodes.is_empty() => {
            part.elements.push((*label, nodes.to_vec()));
            Ok(())
        }
        _ => Err(AssemblyError {
            line: card.line_start,
            message: format!("element record '{record}' has no nodes"),
        }),
    }
}

fn parse_instance(card: &Card) -> std::result::Result<InstanceDef, AssemblyError> {
    let name = required_parameter(card, "NAME")?.to_string();
    let part = required_parameter(card, "PART")?.to_string();
    let mut placement = Placement::default();

    if let Some(line) = card.data_lines.first() {
        let values: Vec<f64> = parse_fields(line, card, "translation")?;
        if values.len() != 3 {
            return Err(AssemblyError {
                line: card.line_start,
                message: format!("instance {name} translation needs 3 values"),
            });
        }
        placement.translation = Vector3::new(values[0], values[1], values[2]);
    }

    if let Some(line) = card.data_lines.get(1) {
        let v: Vec<f64> = parse_fields(line, card, "rotation")?;
        if v.len() != 7 {
            return Err(AssemblyError {
                line: card.line_start,
                message: format!("instance {name} rotation needs 7 values"),
            });
        }
        let rotation = Rotation {
            axis_start: Point3::new(v[0], v[1], v[2]),
            axis_end: Point3::new(v[3], v[4], v[5]),
            angle_deg: v[6],
        };
        if (rotation.axis_end - rotation.axis_start).norm() <= f64::EPSILON {
            return Err(AssemblyError {
                line: card.line_start,
                message: format!("instance {name} rotation axis is degenerate"),
            });
        }
        placement.rotation = Some(rotation);
    }

    Ok(InstanceDef {
        name,
        part,
        placement,
        line: card.line_start,
    })
}
