use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use shapefile::dbase::{FieldValue, Record};
use shapefile::Polyline;

use terrace_lines::{run, Crs, Error, GeoTiffCodec, PipelineConfig, VectorFormat};

/// A 100x100 black image with a white vertical line of width 3 centred on column 50.
fn line_image(dir: &Path) -> PathBuf {
    let path = dir.join("line.png");
    RgbImage::from_fn(100, 100, |x, _| {
        if (49..=51).contains(&x) {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })
    .save(&path)
    .unwrap();
    path
}

fn config(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        image: line_image(dir),
        out_dir: dir.join("out"),
        fallback_pixel_size: 1.0,
        fallback_epsg: Some(Crs::from_epsg(32633)),
        ..PipelineConfig::default()
    }
}

#[test]
fn vertical_line_to_shapefile() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let output = run(&config, &GeoTiffCodec).unwrap();

    assert_eq!(output.out_dir, config.out_dir);
    assert_eq!(output.edges_path, config.out_dir.join("terrace_edges.png"));
    assert_eq!(output.skeleton_path, config.out_dir.join("terrace_skeleton.png"));
    assert_eq!(output.vector_path, config.out_dir.join("terrace_lines.shp"));
    assert!(output.edges_path.exists());
    assert!(output.skeleton_path.exists());
    assert!(config.out_dir.join("terrace_lines.prj").exists());

    // Both flanks of the line are traced from the top row down.
    assert_eq!(output.lines, 2);
    let features = shapefile::read_as::<_, Polyline, Record>(&output.vector_path).unwrap();
    assert_eq!(features.len(), 2);
    for (shape, record) in &features {
        let points = &shape.parts()[0];
        assert_eq!(points.len(), 100);
        let x = points[0].x;
        assert!((47.0..=53.0).contains(&x), "trace at x = {}", x);
        assert!(points.iter().all(|p| p.x == x));
        assert_eq!(points[0].y, 0.0);
        assert_eq!(points[99].y, -99.0);
        match record.get("length") {
            Some(FieldValue::Numeric(Some(length))) => assert!((length - 99.0).abs() < 1e-6),
            other => panic!("unexpected length field {:?}", other),
        }
    }
}

#[test]
fn vertical_line_to_geopackage() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        format: VectorFormat::GeoPackage,
        ..config(dir.path())
    };
    let output = run(&config, &GeoTiffCodec).unwrap();
    assert_eq!(output.vector_path, config.out_dir.join("terrace_lines.gpkg"));

    let conn = rusqlite::Connection::open(&output.vector_path).unwrap();
    let lengths: Vec<f64> = conn
        .prepare("SELECT length FROM terraces ORDER BY fid")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<rusqlite::Result<_>>()
        .unwrap();
    assert_eq!(lengths.len(), 2);
    assert!(lengths.iter().all(|l| (l - 99.0).abs() < 1e-6));
}

#[test]
fn short_lines_are_filtered_in_metres() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        min_length: 100.0,
        ..config(dir.path())
    };
    assert_eq!(run(&config, &GeoTiffCodec).unwrap().lines, 0);
}

#[test]
fn geographic_fallback_skips_the_filter() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        fallback_epsg: Some(Crs::from_epsg(4326)),
        fallback_pixel_size: 0.0001,
        ..config(dir.path())
    };
    assert_eq!(run(&config, &GeoTiffCodec).unwrap().lines, 2);
}

#[test]
fn rerun_overwrites_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        format: VectorFormat::GeoPackage,
        ..config(dir.path())
    };
    run(&config, &GeoTiffCodec).unwrap();
    assert_eq!(run(&config, &GeoTiffCodec).unwrap().lines, 2);
}

#[test]
fn missing_image_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        image: dir.path().join("nope.png"),
        out_dir: dir.path().join("out"),
        ..PipelineConfig::default()
    };
    assert!(matches!(run(&config, &GeoTiffCodec), Err(Error::Read { .. })));
}

#[test]
fn output_dir_that_is_a_file_is_a_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("out");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let config = config(dir.path());
    assert_eq!(config.out_dir, blocker);
    assert!(matches!(run(&config, &GeoTiffCodec), Err(Error::Write { .. })));
}

#[test]
fn failed_vector_write_keeps_the_masks() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        format: VectorFormat::GeoPackage,
        ..config(dir.path())
    };
    let blocker = config.out_dir.join("terrace_lines.gpkg");
    std::fs::create_dir_all(&blocker).unwrap();

    match run(&config, &GeoTiffCodec) {
        Err(Error::Write { path, .. }) => assert_eq!(path, blocker),
        other => panic!("expected a write error, got {:?}", other),
    }
    assert!(config.out_dir.join("terrace_edges.png").exists());
    assert!(config.out_dir.join("terrace_skeleton.png").exists());
}
