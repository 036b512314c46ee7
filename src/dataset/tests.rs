use super::*;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use tempfile::TempDir;

fn row(fill: u8, label: u8) -> String {
    let mut fields: Vec<String> = (0..N_FEATURES).map(|i| ((i as u8 + fill) % 17).to_string()).collect();
    fields.push(label.to_string());
    fields.join(",")
}

/// Answer a single HTTP request with `200 OK` and `body`, returning its URL
fn serve_once(body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
    });
    format!("http://{}/optdigits.tes", addr)
}

fn offline_config(path: std::path::PathBuf) -> DatasetConfig {
    DatasetConfig {
        path,
        download: false,
        ..DatasetConfig::default()
    }
}

#[test]
fn test_parse_valid_rows() {
    let text = format!("{}\n{}\n\n{}\n", row(0, 0), row(3, 7), row(5, 9));
    let (samples, targets) = parse(text.as_bytes()).unwrap();

    assert_eq!(samples.len(), 3);
    assert_eq!(targets, vec![0, 7, 9]);
    assert!(samples.iter().all(|s| s.len() == N_FEATURES));
    assert_eq!(samples[1][0], 3.0);
    assert_eq!(samples[0][16], 16.0);
}

#[test]
fn test_parse_rejects_short_row() {
    let text = format!("{}\n1,2,3\n", row(0, 1));
    match parse(text.as_bytes()) {
        Err(DatasetError::Malformed { line, message }) => {
            assert_eq!(line, 2);
            assert!(message.contains("expected 65 fields"));
        }
        other => panic!("expected malformed error, got {:?}", other),
    }
}

#[test]
fn test_parse_rejects_out_of_range_values() {
    let mut fields = vec!["0"; N_FEATURES];
    fields[10] = "17";
    let bad_pixel = format!("{},3", fields.join(","));
    assert!(matches!(
        parse(bad_pixel.as_bytes()),
        Err(DatasetError::Malformed { line: 1, .. })
    ));

    let bad_label = format!("{},10", vec!["0"; N_FEATURES].join(","));
    assert!(matches!(
        parse(bad_label.as_bytes()),
        Err(DatasetError::Malformed { line: 1, .. })
    ));

    let not_a_number = format!("{},x", vec!["0"; N_FEATURES].join(","));
    assert!(parse(not_a_number.as_bytes()).is_err());
}

#[test]
fn test_normalized_scales_by_global_max() {
    let text = format!("{}\n{}\n", row(0, 1), row(1, 2));
    let (samples, targets) = parse(text.as_bytes()).unwrap();
    let digits = Digits::new(samples, targets, "mem".into(), String::new());

    assert_eq!(digits.max_value, 16.0);
    let normalized = digits.normalized().unwrap();
    let max = normalized
        .iter()
        .flat_map(|r| r.iter().copied())
        .fold(0.0f32, f32::max);
    assert_eq!(max, 1.0);
    assert_eq!(normalized[0][8], 0.5);
}

#[test]
fn test_normalized_rejects_blank_images() {
    let digits = Digits::new(
        vec![vec![0.0; N_FEATURES]; 3],
        vec![0, 1, 2],
        "mem".into(),
        String::new(),
    );
    assert_eq!(digits.max_value, 0.0);
    assert!(matches!(digits.normalized(), Err(DatasetError::AllZero)));
}

#[test]
fn test_load_from_cache() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("digits.tes");
    let text: String = (0..20).map(|i| row(i, i % 10) + "\n").collect();
    fs::write(&path, &text).unwrap();

    let digits = load(&offline_config(path.clone())).unwrap();

    assert_eq!(digits.len(), 20);
    assert_eq!(digits.image_side(), 8);
    assert_eq!(digits.source, path);
    assert_eq!(digits.sha256.len(), 64);
    assert_eq!(digits.class_counts(), [2; 10]);
}

#[test]
fn test_load_truncates_to_max_samples() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("digits.tes");
    let text: String = (0..12).map(|i| row(i, 3) + "\n").collect();
    fs::write(&path, &text).unwrap();

    let config = DatasetConfig {
        max_samples: Some(5),
        ..offline_config(path)
    };
    let digits = load(&config).unwrap();

    assert_eq!(digits.samples.len(), 5);
    assert_eq!(digits.targets.len(), 5);
}

#[test]
fn test_load_without_cache_or_download() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.tes");

    assert!(matches!(
        load(&offline_config(path)),
        Err(DatasetError::NotCached(_))
    ));
}

#[test]
fn test_load_empty_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.tes");
    fs::write(&path, "\n\n").unwrap();

    assert!(matches!(
        load(&offline_config(path)),
        Err(DatasetError::Empty)
    ));
}

#[test]
fn test_download_is_cached_after_parsing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache").join("digits.tes");
    let text: String = (0..10).map(|i| row(i, i % 10) + "\n").collect();

    let config = DatasetConfig {
        path: path.clone(),
        url: serve_once(text.clone()),
        download: true,
        max_samples: None,
    };
    let digits = load(&config).unwrap();

    assert_eq!(digits.len(), 10);
    assert_eq!(fs::read_to_string(&path).unwrap(), text);

    // second load is served from the cache
    let cached = load(&DatasetConfig {
        download: false,
        ..config
    })
    .unwrap();
    assert_eq!(cached.sha256, digits.sha256);
}

#[test]
fn test_bad_download_is_not_cached() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("digits.tes");

    let config = DatasetConfig {
        path: path.clone(),
        url: serve_once("<html>moved</html>".to_string()),
        download: true,
        max_samples: None,
    };

    assert!(matches!(
        load(&config),
        Err(DatasetError::Malformed { line: 1, .. })
    ));
    assert!(!path.exists());

    // nothing poisoned: an offline retry reports the missing cache
    assert!(matches!(
        load(&DatasetConfig {
            download: false,
            ..config
        }),
        Err(DatasetError::NotCached(_))
    ));
}
