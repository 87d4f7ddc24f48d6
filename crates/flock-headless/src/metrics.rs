use std::fs::File;
use std::path::Path;
use std::time::Duration;

use csv::Writer;
use flock_core::{FlockStats, FrameReport};

/// Metrics writer for CSV output and performance logging
pub struct MetricsWriter {
    csv_writer: Writer<File>,
    rows: u32,
    faults_since_last: usize,
}

impl MetricsWriter {
    pub fn new(output_dir: &Path) -> Result<Self, anyhow::Error> {
        let csv_path = output_dir.join("metrics.csv");
        let file = File::create(&csv_path)?;

        let mut csv_writer = Writer::from_writer(file);
        csv_writer.write_record([
            "frame",
            "boid_count",
            "centroid_x",
            "centroid_y",
            "mean_speed",
            "min_speed",
            "max_speed",
            "polarization",
            "spread",
            "predator_distance",
            "numeric_faults",
            "wall_time_ms",
            "fps_proxy",
        ])?;

        Ok(Self {
            csv_writer,
            rows: 0,
            faults_since_last: 0,
        })
    }

    /// Accumulate faults from a frame that is not itself written out
    pub fn record_frame(&mut self, report: &FrameReport) {
        self.faults_since_last += report.total_faults();
    }

    /// Write one metrics row; the fault column covers every frame since the previous row
    pub fn write_step(&mut self, stats: &FlockStats, step_time: Duration) -> Result<(), anyhow::Error> {
        let wall_time_ms = step_time.as_secs_f64() * 1000.0;
        let fps_proxy = if wall_time_ms > 0.0 { 1000.0 / wall_time_ms } else { 0.0 };

        self.csv_writer.write_record(&[
            stats.frame.to_string(),
            stats.boid_count.to_string(),
            stats.centroid_x.to_string(),
            stats.centroid_y.to_string(),
            stats.mean_speed.to_string(),
            stats.min_speed.to_string(),
            stats.max_speed.to_string(),
            stats.polarization.to_string(),
            stats.spread.to_string(),
            stats.predator_distance.to_string(),
            self.faults_since_last.to_string(),
            format!("{:.3}", wall_time_ms),
            format!("{:.1}", fps_proxy),
        ])?;

        self.csv_writer.flush()?;
        self.faults_since_last = 0;
        self.rows += 1;

        Ok(())
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let dir = std::env::temp_dir().join(format!("flock-metrics-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut writer = MetricsWriter::new(&dir).unwrap();
        writer.record_frame(&FrameReport {
            frame: 1,
            numeric_faults: 2,
            predator_fault: true,
            elapsed: Duration::from_millis(1),
        });
        let stats = FlockStats {
            frame: 1,
            boid_count: 10,
            ..Default::default()
        };
        writer.write_step(&stats, Duration::from_millis(4)).unwrap();
        assert_eq!(writer.rows(), 1);

        let text = std::fs::read_to_string(dir.join("metrics.csv")).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("frame,boid_count,"));
        let row: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(row[0], "1");
        assert_eq!(row[1], "10");
        assert_eq!(row[10], "3");
        assert_eq!(row[12], "250.0");

        std::fs::remove_dir_all(&dir).ok();
    }
}
