use std::sync::Mutex;

use tempfile::NamedTempFile;

use flockwatch::config::FlockConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "FLOCK_CONFIG",
        "FLOCK_INPUT",
        "FLOCK_OUTPUT",
        "FLOCK_API_ADDR",
        "FLOCK_DETECTOR_BACKEND",
        "FLOCK_SAMPLE_FPS",
        "FLOCK_FONT_PATH",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_cover_a_runnable_stub_setup() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = FlockConfig::load().expect("load defaults");

    assert_eq!(cfg.input_uri, "stub://flock");
    assert_eq!(cfg.api_addr, "127.0.0.1:8798");
    assert_eq!(cfg.sampling.target_fps, 5);
    assert_eq!(cfg.detector.backend, "synthetic");
    assert_eq!(cfg.detector.target_class, 14);
    assert!((cfg.detector.confidence - 0.25).abs() < f32::EPSILON);
    assert!((cfg.detector.iou - 0.30).abs() < f32::EPSILON);
    assert!(cfg.detector.persist);
    assert_eq!(cfg.size_index.min_area, 2000.0);
    assert_eq!(cfg.size_index.max_area, 22000.0);

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "input": "barn_cam.mp4",
        "output": "processed/barn_cam_out.mp4",
        "report_path": "processed/barn_report.csv",
        "upload": {
            "path": "incoming/upload.mp4",
            "output": "processed/upload_out.mp4"
        },
        "api": {
            "addr": "0.0.0.0:9100"
        },
        "detector": {
            "backend": "stub",
            "confidence": 0.4,
            "iou": 0.5,
            "target_class": 14
        },
        "sampling": {
            "target_fps": 10
        },
        "size_index": {
            "min_area": 1500,
            "max_area": 18000
        },
        "stub": {
            "frames": 90,
            "frame_rate": 25.0
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("FLOCK_CONFIG", file.path());
    std::env::set_var("FLOCK_SAMPLE_FPS", "2");
    std::env::set_var("FLOCK_DETECTOR_BACKEND", "synthetic");

    let cfg = FlockConfig::load().expect("load config");

    assert_eq!(cfg.input_uri, "barn_cam.mp4");
    assert_eq!(cfg.output_path, "processed/barn_cam_out.mp4");
    assert_eq!(cfg.report_path, "processed/barn_report.csv");
    assert_eq!(cfg.upload_path, "incoming/upload.mp4");
    assert_eq!(cfg.upload_output_path, "processed/upload_out.mp4");
    assert_eq!(cfg.api_addr, "0.0.0.0:9100");
    assert!((cfg.detector.confidence - 0.4).abs() < f32::EPSILON);
    assert!((cfg.detector.iou - 0.5).abs() < f32::EPSILON);
    assert_eq!(cfg.size_index.min_area, 1500.0);
    assert_eq!(cfg.size_index.max_area, 18000.0);
    assert_eq!(cfg.stub_source.frames, 90);
    assert_eq!(cfg.stub_source.frame_rate, 25.0);
    // Env wins over the file.
    assert_eq!(cfg.sampling.target_fps, 2);
    assert_eq!(cfg.detector.backend, "synthetic");

    clear_env();
}

#[test]
fn rejects_inverted_size_bounds() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{"size_index": {"min_area": 9000, "max_area": 9000}}"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    std::env::set_var("FLOCK_CONFIG", file.path());

    let err = FlockConfig::load().expect_err("must reject");
    assert!(err.to_string().contains("min_area"));

    clear_env();
}

#[test]
fn rejects_unparsable_sample_fps() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FLOCK_SAMPLE_FPS", "five");
    let err = FlockConfig::load().expect_err("must reject");
    assert!(err.to_string().contains("FLOCK_SAMPLE_FPS"));

    clear_env();
}

#[test]
fn rejects_zero_sample_rate() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FLOCK_SAMPLE_FPS", "0");
    let err = FlockConfig::load().expect_err("must reject");
    assert!(err.to_string().contains("target_fps"));

    clear_env();
}
