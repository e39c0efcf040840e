use std::collections::BTreeMap;

use flockwatch::{
    BoundingBox, Detection, DetectorSession, FlockConfig, Frame, MemorySink, Pipeline,
    PipelineError, StubSession, SyntheticConfig, SyntheticSource,
};

const TARGET_CLASS: u32 = 14;

/// Two seconds of 30 fps source sampled at 5 fps: frames 0, 6, ..., 54.
fn two_second_source() -> SyntheticSource {
    SyntheticSource::new(
        "stub://scenario",
        SyntheticConfig {
            frames: 60,
            frame_rate: 30.0,
            width: 320,
            height: 240,
        },
    )
}

fn sampled_frames() -> Vec<u64> {
    (0..60).filter(|frame| frame % 6 == 0).collect()
}

fn bird(raw_id: Option<i64>, side: f32) -> Detection {
    Detection {
        class_id: TARGET_CLASS,
        confidence: 0.9,
        bbox: BoundingBox {
            x1: 10.0,
            y1: 10.0,
            x2: 10.0 + side,
            y2: 10.0 + side,
        },
        track_id: raw_id,
    }
}

fn run_scripted(script: Vec<Vec<Detection>>) -> flockwatch::RunResult {
    let cfg = FlockConfig::default();
    let mut source = two_second_source();
    let mut session = StubSession::with_script(script);
    let mut sink = MemorySink::new();
    Pipeline::new(&cfg)
        .run(&mut source, &mut session, &mut sink)
        .expect("scripted run")
}

#[test]
fn samples_exactly_the_stride_frames() {
    // One detection per sampled frame, box area pinned to min_area:
    // 40 x 50 = 2000.
    let script = sampled_frames()
        .iter()
        .map(|_| {
            vec![Detection {
                class_id: TARGET_CLASS,
                confidence: 0.9,
                bbox: BoundingBox {
                    x1: 0.0,
                    y1: 0.0,
                    x2: 40.0,
                    y2: 50.0,
                },
                track_id: Some(71),
            }]
        })
        .collect();

    let result = run_scripted(script);

    let keys: Vec<u64> = result.frame_counts.keys().copied().collect();
    assert_eq!(keys, sampled_frames());
    assert!(result.frame_counts.values().all(|&count| count == 1));
    assert_eq!(result.bird_ids, vec![1]);
    assert_eq!(result.mean_size_index[&1], 0.0);
}

#[test]
fn zero_detections_still_record_every_sampled_frame() {
    let cfg = FlockConfig::default();
    let mut source = two_second_source();
    let mut session = StubSession::empty();
    let mut sink = MemorySink::new();

    let result = Pipeline::new(&cfg)
        .run(&mut source, &mut session, &mut sink)
        .expect("empty run");

    assert!(result.bird_ids.is_empty());
    assert!(result.mean_size_index.is_empty());
    assert_eq!(result.frame_counts.len(), sampled_frames().len());
    assert!(result.frame_counts.values().all(|&count| count == 0));
    // Every sampled frame still reaches the sink.
    assert_eq!(sink.frames().len(), sampled_frames().len());
    assert!(sink.is_finished());
}

#[test]
fn sparse_raw_ids_become_dense_first_seen_ids() {
    // Frame 0: raw 50 at min_area. Frame 6: raw 12 at max_area plus raw 50
    // at the window midpoint. Later frames: nothing.
    let mut script = vec![
        vec![bird(Some(50), 44.72136)],            // area ~2000 -> 0.0
        vec![bird(Some(12), 148.32397), bird(Some(50), 109.544512)], // 1.0 and 0.5
    ];
    script.resize(sampled_frames().len(), vec![]);

    let result = run_scripted(script);

    assert_eq!(result.bird_ids, vec![1, 2]);
    assert_eq!(result.mean_size_index[&1], 0.25); // mean(0.0, 0.5)
    assert_eq!(result.mean_size_index[&2], 1.0);
    assert_eq!(result.frame_counts[&0], 1);
    assert_eq!(result.frame_counts[&6], 2);
    assert_eq!(result.frame_counts[&12], 0);
}

#[test]
fn untracked_detections_count_but_are_not_aggregated() {
    let mut script = vec![vec![bird(Some(9), 60.0), bird(None, 60.0)]];
    script.resize(sampled_frames().len(), vec![]);

    let result = run_scripted(script);

    assert_eq!(result.frame_counts[&0], 2);
    assert_eq!(result.bird_ids, vec![1]);
    assert_eq!(result.mean_size_index.len(), 1);
}

#[test]
fn other_classes_are_filtered_out_entirely() {
    let mut non_bird = bird(Some(33), 80.0);
    non_bird.class_id = 0;
    let mut script = vec![vec![non_bird]];
    script.resize(sampled_frames().len(), vec![]);

    let result = run_scripted(script);

    assert_eq!(result.frame_counts[&0], 0);
    assert!(result.bird_ids.is_empty());
}

struct FailingSession;

impl DetectorSession for FailingSession {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn process(&mut self, _frame: &Frame) -> anyhow::Result<Vec<Detection>> {
        anyhow::bail!("model exploded")
    }
}

#[test]
fn detector_failure_aborts_the_run_with_no_result() {
    let cfg = FlockConfig::default();
    let mut source = two_second_source();
    let mut session = FailingSession;
    let mut sink = MemorySink::new();

    let err = Pipeline::new(&cfg)
        .run(&mut source, &mut session, &mut sink)
        .expect_err("run must abort");

    assert!(matches!(err, PipelineError::Detection { frame: 0, .. }));
    // Nothing was written before the abort.
    assert!(sink.frames().is_empty());
    assert!(!sink.is_finished());
}

#[test]
fn synthetic_end_to_end_produces_consistent_summary() {
    let cfg = FlockConfig::default();
    let mut source = two_second_source();
    let mut session = flockwatch::SyntheticSession::new(3, TARGET_CLASS);
    let mut sink = MemorySink::new();

    let result = Pipeline::new(&cfg)
        .run(&mut source, &mut session, &mut sink)
        .expect("synthetic run");

    assert_eq!(result.bird_ids, vec![1, 2, 3]);
    assert!(result.frame_counts.values().all(|&count| count >= 3));
    for id in &result.bird_ids {
        let mean = result.mean_size_index[id];
        assert!((0.0..=1.0).contains(&mean));
    }

    let summary = flockwatch::summarize("stub://scenario", &result);
    assert_eq!(summary.total_unique_birds, 3);
    assert_eq!(summary.frame_count, sampled_frames().len());
    assert_eq!(summary.unique_ids, vec![1, 2, 3]);
    let per_frame: BTreeMap<String, u32> = summary.birds_detected_each_frame;
    assert_eq!(per_frame.len(), sampled_frames().len());
    assert!(per_frame.contains_key("frame_0"));
    assert!(per_frame.contains_key("frame_54"));
}
