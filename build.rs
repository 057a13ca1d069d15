use std::{env, path::PathBuf};

const WATCHED_VARIABLES: [&str; 4] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    // Linux and macOS find FFmpeg through pkg-config.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }
    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT").map(PathBuf::from) else {
        println!(
            "cargo:warning=speaker-gender needs FFmpeg; on Windows install it with vcpkg and set FFMPEG_DIR (or VCPKG_ROOT)."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let install = vcpkg_root.join("installed").join(&triplet);

    if !install.exists() {
        println!(
            "cargo:warning=VCPKG_ROOT is set but {} does not exist; install ffmpeg:{triplet} first.",
            install.display(),
        );
        return;
    }

    println!(
        "cargo:warning=Using vcpkg FFmpeg at {}; set FFMPEG_DIR to that path to silence this hint.",
        install.display(),
    );
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        println!("cargo:warning=Set VCPKGRS_DYNAMIC=1 if the vcpkg FFmpeg build is dynamic.");
    }
}
