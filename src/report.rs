//! Run summaries and the CSV report.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::pipeline::RunResult;

/// Boundary-layer view of one completed run, shaped for the JSON responses.
#[derive(Clone, Debug, Serialize)]
pub struct VideoSummary {
    pub video_name: String,
    pub total_unique_birds: usize,
    /// Number of sampled frames.
    pub frame_count: usize,
    pub unique_ids: Vec<u32>,
    pub bird_details: Vec<BirdDetail>,
    pub birds_detected_each_frame: BTreeMap<String, u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BirdDetail {
    pub id: u32,
    pub weight_index: f64,
}

/// Package a run result for the boundary layer.
pub fn summarize(video_name: &str, result: &RunResult) -> VideoSummary {
    let bird_details = result
        .bird_ids
        .iter()
        .map(|&id| BirdDetail {
            id,
            weight_index: result.mean_size_index.get(&id).copied().unwrap_or(0.0),
        })
        .collect();

    VideoSummary {
        video_name: video_name.to_string(),
        total_unique_birds: result.bird_ids.len(),
        frame_count: result.frame_counts.len(),
        unique_ids: result.bird_ids.clone(),
        bird_details,
        birds_detected_each_frame: result
            .frame_counts
            .iter()
            .map(|(frame, &count)| (format!("frame_{frame}"), count))
            .collect(),
    }
}

/// Two-column per-bird report: `Bird_ID, Average_Weight_Index`.
pub fn write_csv_report(path: &Path, result: &RunResult) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create report directory for {}", path.display()))?;
        }
    }
    let mut file = fs::File::create(path)
        .with_context(|| format!("create report file {}", path.display()))?;
    writeln!(file, "Bird_ID,Average_Weight_Index")?;
    for (id, mean) in &result.mean_size_index {
        writeln!(file, "{id},{mean}")?;
    }
    Ok(())
}
