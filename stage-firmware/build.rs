//! Build script for stage-firmware
//!
//! - Sets up linker search paths and scripts for memory.x
//! - Validates stage.toml and compiles it into the firmware

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use stage_core::config::StageConfig;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    setup_linker(&out_dir);
    generate_config(&out_dir);
}

/// Set up linker search paths for memory.x
fn setup_linker(out_dir: &Path) {
    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("create memory.x");
    f.write_all(memory_x).expect("write memory.x");

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate stage.toml and write the `STAGE_CONFIG` constant
fn generate_config(out_dir: &Path) {
    println!("cargo:rerun-if-changed=stage.toml");

    let config_path = Path::new("stage.toml");

    let config = if config_path.exists() {
        let content = match fs::read_to_string(config_path) {
            Ok(content) => content,
            Err(e) => fail("Failed to read stage.toml", &e.to_string()),
        };

        match toml::from_str::<StageConfig>(&content) {
            Ok(config) => config,
            Err(e) => fail("Invalid stage.toml", &e.to_string()),
        }
    } else {
        println!("cargo:warning=stage.toml not found, using built-in defaults");
        StageConfig::default()
    };

    if let Err(e) = config.validate() {
        fail("Inconsistent values in stage.toml", &format!("{:?}", e));
    }

    let dest = out_dir.join("stage_config.rs");
    fs::write(&dest, render(&config)).expect("write stage_config.rs");
}

/// Render the configuration as a Rust constant
fn render(c: &StageConfig) -> String {
    let j = &c.joystick;
    let s = &c.supervisor;
    let p = &c.scheduler;
    format!(
        "pub const STAGE_CONFIG: StageConfig = StageConfig {{\n\
         \x20   joystick: JoystickConfig {{ center: {}, deadzone: {}, full_scale: {}, min_speed: {}, max_speed: {} }},\n\
         \x20   x: AxisConfig {{ max_speed: {}, acceleration: {} }},\n\
         \x20   y: AxisConfig {{ max_speed: {}, acceleration: {} }},\n\
         \x20   supervisor: SupervisorConfig {{ inactivity_timeout_ms: {}, command_spacing_ms: {}, status_interval_ms: {} }},\n\
         \x20   scheduler: SchedulerConfig {{ large_move_threshold: {}, throttled_ticks: {}, max_ticks_per_cycle: {} }},\n\
         }};\n",
        j.center,
        j.deadzone,
        j.full_scale,
        j.min_speed,
        j.max_speed,
        c.x.max_speed,
        c.x.acceleration,
        c.y.max_speed,
        c.y.acceleration,
        s.inactivity_timeout_ms,
        s.command_spacing_ms,
        s.status_interval_ms,
        p.large_move_threshold,
        p.throttled_ticks,
        p.max_ticks_per_cycle,
    )
}

/// Abort the build with a boxed error message
fn fail(title: &str, detail: &str) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        format_error_lines(detail)
    );
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
