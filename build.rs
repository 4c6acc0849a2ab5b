use std::env;
use std::path::Path;

fn main() {
    for variable in ["FFMPEG_DIR", "PKG_CONFIG_PATH", "VCPKG_ROOT"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if let Some(directory) = env::var_os("FFMPEG_DIR") {
        let include = Path::new(&directory).join("include").join("libavcodec");
        if !include.exists() {
            println!(
                "cargo:warning=FFMPEG_DIR={} has no include/libavcodec; FFmpeg headers may not be found.",
                Path::new(&directory).display(),
            );
        }
        return;
    }

    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("windows") {
        println!(
            "cargo:warning=stillframe needs FFmpeg development libraries. On Windows set FFMPEG_DIR to an FFmpeg install (e.g. <vcpkg>/installed/x64-windows)."
        );
    }
}
