//! Face-stream export for an external persistent-homology engine.
//!
//! The filtered complex is written in stream order (level, then
//! dimension, then vertex ids), so every face follows its subfaces.
//!
//! ```text
//! FilteredComplex → export_face_stream()      → "<level> <v0> <v1> ..." lines
//!                 → export_face_stream_json() → [{"level":0,"vertices":[..]}, ..]
//! ```

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::complex::{FilteredComplex, Filtration};
use crate::model::{FaceKey, VertexId};
use crate::network::Network;
use crate::Result;

/// One face of the filtered stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRecord {
    pub level: u8,
    pub dimension: usize,
    pub vertices: Vec<u32>,
}

impl FaceRecord {
    fn new(key: &FaceKey, level: Filtration) -> Self {
        Self {
            level: level.level(),
            dimension: key.dim().unwrap_or(0),
            vertices: key.vertices().iter().map(|v| v.0).collect(),
        }
    }
}

/// One vertex's inventory, vectors rendered as 0/1 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub vertex: VertexId,
    pub rank: usize,
    pub vectors: Vec<String>,
}

/// Write the filtered stream as text, one face per line.
pub fn export_face_stream(filtered: &FilteredComplex, writer: &mut dyn Write) -> Result<()> {
    let stream = filtered.stream();
    writeln!(writer, "# coverage-rs face stream")?;
    writeln!(writer, "# faces: {}", stream.len())?;
    for (key, level) in &stream {
        writeln!(writer, "{}", format_face(key, *level))?;
    }
    Ok(())
}

/// Write the filtered stream as a JSON array of [`FaceRecord`]s.
pub fn export_face_stream_json(filtered: &FilteredComplex, writer: &mut dyn Write) -> Result<()> {
    let records: Vec<FaceRecord> = filtered
        .stream()
        .iter()
        .map(|(key, level)| FaceRecord::new(key, *level))
        .collect();
    serde_json::to_writer(&mut *writer, &records)?;
    writeln!(writer)?;
    Ok(())
}

/// Write every vertex's inventory as a JSON array of [`InventoryRecord`]s.
pub fn export_inventories_json(net: &Network, writer: &mut dyn Write) -> Result<()> {
    let records: Vec<InventoryRecord> = net
        .vertices()
        .map(|v| InventoryRecord {
            vertex: v.id(),
            rank: v.rank(),
            vectors: v.inventory().iter().map(ToString::to_string).collect(),
        })
        .collect();
    serde_json::to_writer_pretty(&mut *writer, &records)?;
    writeln!(writer)?;
    Ok(())
}

/// `<level> <v0> <v1> ...`
fn format_face(key: &FaceKey, level: Filtration) -> String {
    let mut line = level.level().to_string();
    for v in key.vertices() {
        line.push(' ');
        line.push_str(&v.0.to_string());
    }
    line
}
