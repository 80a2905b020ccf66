//! Screen-capture session manager with an annotation overlay and optional
//! recording.
//!
//! [`SessionController`] acquires a live capture, attaches a drawing surface
//! on top of it and, on request, records the stream into a downloadable
//! artifact. Host facilities sit behind the traits in [`capture`],
//! [`recording`], [`annotation`] and [`listener_registry`]; [`host`] provides
//! headless implementations of all of them.

/// Submodule for the drawing overlay, its tools and the raster canvas.
pub mod annotation;
/// Submodule for acquiring and releasing the live capture stream.
pub mod capture;
/// Submodule for loading and validating the TOML configuration.
pub mod configuration;
/// Submodule for the error types of every subsystem.
pub mod error_handling;
/// Submodule for the headless host backends.
pub mod host;
/// Submodule for scoped event-listener bookkeeping.
pub mod listener_registry;
/// Submodule for recording the capture and delivering the artifact.
pub mod recording;
/// Submodule for the session state machine and its controller.
pub mod session_management;

pub use session_management::{SessionController, SessionStatus};

#[cfg(test)]
mod tests {
    const MODULE_FILES: [(&str, &str); 9] = [
        ("lib.rs", include_str!("lib.rs")),
        ("annotation.rs", include_str!("annotation.rs")),
        ("capture.rs", include_str!("capture.rs")),
        ("configuration.rs", include_str!("configuration.rs")),
        ("error_handling.rs", include_str!("error_handling.rs")),
        ("host.rs", include_str!("host.rs")),
        ("listener_registry.rs", include_str!("listener_registry.rs")),
        ("recording.rs", include_str!("recording.rs")),
        ("session_management.rs", include_str!("session_management.rs")),
    ];

    #[test]
    fn every_public_module_is_documented() {
        for (file, source) in MODULE_FILES {
            let lines: Vec<&str> = source.lines().collect();
            for (i, line) in lines.iter().enumerate() {
                if !line.starts_with("pub mod ") {
                    continue;
                }
                let doc = lines[..i]
                    .iter()
                    .rev()
                    .find(|l| !l.starts_with("#["))
                    .copied()
                    .unwrap_or_default();
                assert!(doc.starts_with("/// "), "{}:{} `{}` has no doc comment", file, i + 1, line);
            }
        }
        assert!(MODULE_FILES[0].1.starts_with("//! "));
    }
}
