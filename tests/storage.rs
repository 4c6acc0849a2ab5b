//! Output directory and file naming tests.

mod common;

use std::path::Path;

use stillframe::{ImageFormat, StillframeError, StorageNamer};

use common::{frame_index_of, synthetic_frame};

#[test]
fn directory_is_named_after_the_video_stem() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let namer = StorageNamer::new(output.path(), ImageFormat::Png);

    let directory = namer
        .directory_for(Path::new("/videos/Holiday 2024.final.mkv"), "Screenshots")
        .expect("Failed to create directory");
    assert_eq!(
        directory,
        output.path().join("Screenshots").join("Holiday 2024.final")
    );
    assert!(directory.is_dir());
}

#[test]
fn creating_the_directory_twice_is_fine() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let namer = StorageNamer::new(output.path(), ImageFormat::Png);

    let first = namer
        .directory_for(Path::new("clip.mp4"), "BatchScreenshots")
        .expect("First call failed");
    let second = namer
        .directory_for(Path::new("clip.mp4"), "BatchScreenshots")
        .expect("Second call failed");
    assert_eq!(first, second);
}

#[test]
fn directory_path_does_not_touch_the_disk() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let namer = StorageNamer::new(output.path(), ImageFormat::Png);

    let directory = namer.directory_path(Path::new("clip.mp4"), "Screenshots");
    assert_eq!(directory, output.path().join("Screenshots").join("clip"));
    assert!(!directory.exists());
}

#[test]
fn file_names_use_prefix_sequence_and_extension() {
    let png = StorageNamer::new("root", ImageFormat::Png);
    let bmp = StorageNamer::new("root", ImageFormat::Bmp);
    assert_eq!(png.file_name("Capture", 0), "Capture_0.png");
    assert_eq!(png.file_name("Screenshot", 12), "Screenshot_12.png");
    assert_eq!(bmp.file_name("Capture", 3), "Capture_3.bmp");
}

#[test]
fn image_format_parsing() {
    assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
    assert_eq!(ImageFormat::from_extension(".bmp"), Some(ImageFormat::Bmp));
    assert_eq!(ImageFormat::from_extension("tif"), Some(ImageFormat::Tiff));
    assert_eq!(ImageFormat::from_extension("jpg"), None);
    assert_eq!(ImageFormat::default(), ImageFormat::Png);
}

#[test]
fn written_image_matches_the_frame() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    for format in [ImageFormat::Png, ImageFormat::Bmp, ImageFormat::Tiff] {
        let namer = StorageNamer::new(output.path(), format);
        let path = namer
            .write(output.path(), "Frame", 7, &synthetic_frame(300))
            .expect("Failed to write image");
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("Frame_7.{}", format.extension())
        );
        assert_eq!(frame_index_of(&path), 300);
    }
}

#[test]
fn write_failure_names_the_destination() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let namer = StorageNamer::new(output.path(), ImageFormat::Png);
    let missing = output.path().join("does").join("not").join("exist");

    let error = namer
        .write(&missing, "Frame", 1, &synthetic_frame(0))
        .unwrap_err();
    match error {
        StillframeError::WriteFailed { path, .. } => {
            assert_eq!(path, missing.join("Frame_1.png"));
        }
        other => panic!("expected WriteFailed, got {other:?}"),
    }
}

#[test]
fn pictures_namer_has_a_root() {
    let namer = StorageNamer::pictures(ImageFormat::Png);
    assert!(!namer.root().as_os_str().is_empty());
    assert_eq!(namer.format(), ImageFormat::Png);
}
