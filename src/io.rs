//! Tabular input and output.
//!
//! Input rows are `px, py, pz, vx, vy, vz, mass` after one header row. The final
//! positions are written as `px,py,pz` with exactly two decimals per coordinate.

use crate::error::SimError;
use crate::state::{Body, BodySet};
use anyhow::{Context, Result};
use log::info;
use nbody_common::Vec3;
use std::io::{Read, Write};
use std::path::Path;

pub const INPUT_FIELDS: usize = 7;
pub const INPUT_HEADER: [&str; INPUT_FIELDS] = ["px", "py", "pz", "vx", "vy", "vz", "mass"];
pub const OUTPUT_HEADER: [&str; 3] = ["px", "py", "pz"];

/// Reads bodies from any CSV source.
///
/// A blank line after the header is a row with zero fields and is rejected like
/// any other short row.
pub fn read_bodies_from<R: Read>(mut source: R) -> Result<BodySet> {
    let mut text = String::new();
    source.read_to_string(&mut text).context("Failed to read body data")?;
    if let Some(idx) = text.lines().skip(1).position(|line| line.trim().is_empty()) {
        return Err(SimError::MalformedInput {
            row: idx + 1,
            reason: format!("blank line, expected {} fields", INPUT_FIELDS),
        }
        .into());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut bodies = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let row = idx + 1;
        let record = record.map_err(|e| SimError::MalformedInput { row, reason: e.to_string() })?;
        if record.len() != INPUT_FIELDS {
            return Err(SimError::MalformedInput {
                row,
                reason: format!("expected {} fields, found {}", INPUT_FIELDS, record.len()),
            }
            .into());
        }

        let mut values = [0.0f64; INPUT_FIELDS];
        for (col, (field, value)) in record.iter().zip(values.iter_mut()).enumerate() {
            *value = field.parse::<f64>().map_err(|_| SimError::MalformedInput {
                row,
                reason: format!("column '{}' is not a number: '{}'", INPUT_HEADER[col], field),
            })?;
        }

        bodies.push(Body {
            position: Vec3::new(values[0], values[1], values[2]),
            velocity: Vec3::new(values[3], values[4], values[5]),
            mass: values[6],
        });
    }

    BodySet::new(bodies)
}

pub fn read_bodies<P: AsRef<Path>>(path: P) -> Result<BodySet> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open input file '{}'", path.display()))?;
    let bodies = read_bodies_from(file)?;
    info!("Read {} bodies from {}", bodies.len(), path.display());
    Ok(bodies)
}

/// Writes final positions, one row per body in index order.
pub fn write_positions_to<W: Write>(sink: W, bodies: &BodySet) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(sink);
    writer.write_record(OUTPUT_HEADER)?;
    for p in bodies.positions() {
        writer.write_record(&[format!("{:.2}", p.x), format!("{:.2}", p.y), format!("{:.2}", p.z)])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_positions<P: AsRef<Path>>(path: P, bodies: &BodySet) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .with_context(|| format!("Error creating output file '{}'", path.display()))?;
    write_positions_to(file, bodies)?;
    info!("Final positions saved to {}", path.display());
    Ok(())
}

/// Writes the full 7-column input format so the file can be fed back in.
pub fn write_bodies<P: AsRef<Path>>(path: P, bodies: &BodySet) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("Error creating body file '{}'", path.display()))?;
    writer.write_record(INPUT_HEADER)?;
    for body in bodies.bodies() {
        let fields = [
            body.position.x,
            body.position.y,
            body.position.z,
            body.velocity.x,
            body.velocity.y,
            body.velocity.z,
            body.mass,
        ];
        writer.write_record(fields.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Degeneracy;

    #[test]
    fn reads_rows_in_order_with_spaced_header() {
        let input = "px, py, pz, vx, vy, vz, mass\n\
                     0.0, 0.0, 0.0, 0.0, 0.1, 0.0, 1.0\n\
                     1.0, 2.0, 3.0, -0.5, 0.0, 0.0, 2.5\n";
        let bodies = read_bodies_from(input.as_bytes()).unwrap();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies.body(1).position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(bodies.body(1).velocity, Vec3::new(-0.5, 0.0, 0.0));
        assert_eq!(bodies.body(1).mass, 2.5);
        assert_eq!(bodies.body(0).velocity.y, 0.1);
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        let input = "px,py,pz,vx,vy,vz,mass\n0,0,0,0,0,0,1\n1,2,3,4,5,6\n";
        let err = read_bodies_from(input.as_bytes()).unwrap_err();
        match err.downcast_ref::<SimError>() {
            Some(SimError::MalformedInput { row, reason }) => {
                assert_eq!(*row, 2);
                assert!(reason.contains("expected 7 fields"));
            }
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn non_numeric_field_is_malformed() {
        let input = "px,py,pz,vx,vy,vz,mass\n0,0,zero,0,0,0,1\n";
        let err = read_bodies_from(input.as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SimError>(),
            Some(SimError::MalformedInput { row: 1, .. })
        ));
    }

    #[test]
    fn blank_line_is_malformed() {
        let input = "px,py,pz,vx,vy,vz,mass\n0,0,0,0,0,0,1\n\n1,0,0,0,0,0,1\n";
        let err = read_bodies_from(input.as_bytes()).unwrap_err();
        match err.downcast_ref::<SimError>() {
            Some(SimError::MalformedInput { row, reason }) => {
                assert_eq!(*row, 2);
                assert!(reason.contains("blank line"));
            }
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn trailing_blank_line_is_malformed() {
        let input = "px,py,pz,vx,vy,vz,mass\r\n0,0,0,0,0,0,1\r\n   \r\n";
        assert!(matches!(
            read_bodies_from(input.as_bytes()).unwrap_err().downcast_ref::<SimError>(),
            Some(SimError::MalformedInput { row: 2, .. })
        ));
        // A single final newline is just the end of the last row.
        let input = "px,py,pz,vx,vy,vz,mass\r\n0,0,0,0,0,0,1\r\n";
        assert_eq!(read_bodies_from(input.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn zero_mass_in_input_is_degenerate() {
        let input = "px,py,pz,vx,vy,vz,mass\n0,0,0,0,0,0,0\n";
        let err = read_bodies_from(input.as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SimError>(),
            Some(SimError::DegenerateConfiguration(Degeneracy::NonPositiveMass { body: 0, .. }))
        ));
    }

    #[test]
    fn header_only_gives_empty_set() {
        let bodies = read_bodies_from("px,py,pz,vx,vy,vz,mass\n".as_bytes()).unwrap();
        assert!(bodies.is_empty());
    }

    #[test]
    fn positions_use_two_fixed_decimals() {
        let bodies = BodySet::new(vec![
            Body { position: Vec3::new(1.0, -0.004, 12345.678), velocity: Vec3::zero(), mass: 1.0 },
            Body { position: Vec3::new(1e-7, 2.5e6, -3.14159), velocity: Vec3::zero(), mass: 1.0 },
        ])
        .unwrap();
        let mut out = Vec::new();
        write_positions_to(&mut out, &bodies).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "px,py,pz\n1.00,-0.00,12345.68\n0.00,2500000.00,-3.14\n"
        );
    }

    #[test]
    fn body_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bodies.csv");
        let bodies = BodySet::new(vec![
            Body { position: Vec3::new(0.1, 0.2, 0.3), velocity: Vec3::new(-1.0, 0.0, 1e-3), mass: 4.0 },
            Body { position: Vec3::new(5.0, 6.0, 7.0), velocity: Vec3::zero(), mass: 0.25 },
        ])
        .unwrap();
        write_bodies(&path, &bodies).unwrap();
        assert_eq!(read_bodies(&path).unwrap(), bodies);
    }
}
