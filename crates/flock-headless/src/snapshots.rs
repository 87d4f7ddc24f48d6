use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Result;
use csv::Writer;
use flock_core::{Boid, FrameView};
use serde::Serialize;

#[derive(Serialize)]
struct BoidRow<'a> {
    id: &'a str,
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
}

impl<'a> BoidRow<'a> {
    fn new(id: &'a str, boid: &Boid) -> Self {
        Self {
            id,
            x: boid.pos[0],
            y: boid.pos[1],
            vx: boid.vel[0],
            vy: boid.vel[1],
        }
    }
}

/// Snapshot writer for per-boid state
pub struct SnapshotWriter {
    output_dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(output_dir: &Path) -> Result<Self> {
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Write predator and boid positions to `boids_NNNN.csv`, predator first
    pub fn write_boids_snapshot(&self, step: u32, view: &FrameView<'_>) -> Result<PathBuf> {
        let filepath = self.output_dir.join(format!("boids_{:04}.csv", step));

        let file = File::create(&filepath)?;
        let mut csv_writer = Writer::from_writer(file);

        csv_writer.serialize(BoidRow::new("predator", view.predator))?;
        for (i, boid) in view.boids.iter().enumerate() {
            let id = i.to_string();
            csv_writer.serialize(BoidRow::new(&id, boid))?;
        }

        csv_writer.flush()?;
        Ok(filepath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predator_row_comes_first() {
        let dir = std::env::temp_dir().join(format!("flock-snapshots-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let boids = [Boid {
            pos: [1.0, 2.0],
            vel: [3.0, 4.0],
        }];
        let predator = Boid {
            pos: [5.0, 6.0],
            vel: [0.0, 0.0],
        };
        let view = FrameView {
            frame: 0,
            boids: &boids,
            predator: &predator,
        };

        let path = SnapshotWriter::new(&dir).unwrap().write_boids_snapshot(7, &view).unwrap();
        assert!(path.ends_with("boids_0007.csv"));

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,x,y,vx,vy");
        assert_eq!(lines[1], "predator,5.0,6.0,0.0,0.0");
        assert_eq!(lines[2], "0,1.0,2.0,3.0,4.0");

        std::fs::remove_dir_all(&dir).ok();
    }
}
