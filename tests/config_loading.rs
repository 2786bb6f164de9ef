use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use ripeness_lens::classify::{Scaling, TensorLayout};
use ripeness_lens::config::AppConfig;
use ripeness_lens::{ChannelOrder, Color};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "RIPENESS_CONFIG",
        "RIPENESS_SOURCE",
        "RIPENESS_MODEL",
        "RIPENESS_SCREENSHOT_DIR",
        "RIPENESS_SHOW_PROBABILITIES",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_json_from_env_path_with_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "source": { "uri": "stub://bench", "width": 640, "height": 480 },
        "model": { "path": "fruit.onnx", "channel_order": "bgr", "rescales_internally": false },
        "labels": [
            { "id": "unripe_apple", "text": "Green Apple" },
            { "id": "ripe_apple", "color": [10, 200, 10] },
            { "id": "overripe_apple" }
        ],
        "fallback": { "text": "Unknown", "color": [128, 128, 128] },
        "overlay": { "mirror": false, "watermark": "Fruit Ripeness Classifier" },
        "display": { "show_probabilities": true }
    }"#;
    file.write_all(json.as_bytes()).expect("write config");

    std::env::set_var("RIPENESS_CONFIG", file.path());
    std::env::set_var("RIPENESS_SOURCE", "stub://override?frames=5");
    std::env::set_var("RIPENESS_SHOW_PROBABILITIES", "false");
    std::env::set_var("RIPENESS_SCREENSHOT_DIR", "/tmp/shots");

    let cfg = AppConfig::load(None).expect("load config");

    assert_eq!(cfg.source.uri, "stub://override?frames=5");
    assert_eq!((cfg.source.width, cfg.source.height), (640, 480));
    assert_eq!(cfg.model.path, Some(PathBuf::from("fruit.onnx")));
    assert_eq!(cfg.model.channel_order, ChannelOrder::Bgr);
    assert_eq!(cfg.model.scaling(), Scaling::UnitRange);
    assert_eq!(cfg.labels.len(), 3);
    assert_eq!(cfg.labels[0].text, "Green Apple");
    assert_eq!(cfg.labels[1].text, "Ripe Apple");
    assert_eq!(cfg.labels[1].color, Color::new(10, 200, 10));
    assert_eq!(cfg.fallback.text, "Unknown");
    assert!(!cfg.mirror);
    assert_eq!(cfg.overlay.watermark.as_deref(), Some("Fruit Ripeness Classifier"));
    assert!(!cfg.display.show_probabilities);
    assert_eq!(cfg.screenshots.dir, PathBuf::from("/tmp/shots"));

    let labels = cfg.label_set().expect("labels");
    let table = cfg.display_table(&labels).expect("table");
    assert_eq!(table.lookup("ripe_kiwi").text, "Unknown");

    clear_env();
}

#[test]
fn explicit_toml_path_wins_over_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    let toml = r#"
[source]
uri = "file:///tmp/apple.jpg"

[model]
layout = "nchw"
input_width = 128
input_height = 96

[screenshots]
extension = "png"
"#;
    file.write_all(toml.as_bytes()).expect("write config");
    std::env::set_var("RIPENESS_CONFIG", "/definitely/not/here.json");

    let cfg = AppConfig::load(Some(file.path())).expect("load config");
    assert_eq!(cfg.source.uri, "file:///tmp/apple.jpg");
    assert_eq!(cfg.model.layout, TensorLayout::Nchw);
    assert_eq!(
        cfg.model.preprocessor().expect("preprocessor").output_shape(),
        [1, 3, 96, 128]
    );
    assert_eq!(cfg.screenshots.extension, "png");
    assert_eq!(cfg.labels.len(), 6);

    clear_env();
}

#[test]
fn invalid_inputs_are_reported() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("RIPENESS_CONFIG", "/definitely/not/here.json");
    let err = AppConfig::load(None).unwrap_err();
    assert!(format!("{:#}", err).contains("failed to read config file"));
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    file.write_all(br#"{ "labels": [ { "id": "ripe_apple" }, { "id": "ripe_apple" } ] }"#)
        .expect("write config");
    let err = AppConfig::load(Some(file.path())).unwrap_err();
    assert!(err.to_string().contains("appears twice"));

    std::env::set_var("RIPENESS_SHOW_PROBABILITIES", "sometimes");
    assert!(AppConfig::load(None).is_err());

    clear_env();
}
