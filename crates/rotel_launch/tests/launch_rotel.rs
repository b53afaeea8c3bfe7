//! Runs the full launcher against a stub collector script.
//!
//! The test seeds the real process environment, so it lives in its own test
//! binary with a single test.

#![cfg(unix)]

use rotel_launch::{exit_code, LaunchError, Launcher, LauncherConfig};
use std::os::unix::fs::PermissionsExt;
use tokio::sync::watch;

#[tokio::test]
async fn test_run_hands_off_to_collector() {
    let dir = tempfile::tempdir().unwrap();

    let config_path = dir.path().join("fluent-bit.conf");
    std::fs::write(
        &config_path,
        "[INPUT]\n    Name forward\n    Listen 0.0.0.0\n    Port 24224\n\
         [FILTER]\n    Name record_modifier\n    Record team observability\n",
    )
    .unwrap();

    let output = dir.path().join("collector.out");
    let script = dir.path().join("rotel");
    std::fs::write(
        &script,
        format!(
            "#!/bin/sh\n\
             echo \"args=$*\" > {out}\n\
             echo \"endpoint=$ROTEL_FLUENT_RECEIVER_ENDPOINT\" >> {out}\n\
             echo \"attributes=$ROTEL_OTEL_RESOURCE_ATTRIBUTES\" >> {out}\n\
             echo \"receivers=$ROTEL_RECEIVERS\" >> {out}\n\
             echo \"exporter=$ROTEL_EXPORTER\" >> {out}\n\
             echo \"ambient=$LAUNCH_TEST_AMBIENT\" >> {out}\n\
             exit 7\n",
            out = output.display()
        ),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    std::env::remove_var("S3_OTLP_LOG_PROCESSORS");
    std::env::remove_var("ROTEL_RECEIVERS");
    std::env::remove_var("ROTEL_FLUENT_RECEIVER_ENDPOINT");
    std::env::remove_var("ROTEL_EXPORTER");
    std::env::remove_var("ROTEL_EXPORTERS");
    std::env::set_var("ROTEL_OTLP_EXPORTER_ENDPOINT", "http://localhost:4317");
    std::env::set_var("ROTEL_OTEL_RESOURCE_ATTRIBUTES", "team=platform");
    std::env::set_var("LAUNCH_TEST_AMBIENT", "kept");

    let (_shutdown_tx, shutdown_rx) = watch::channel(());

    // Missing executable fails before anything is spawned
    let missing = Launcher::new(LauncherConfig::new(&config_path, dir.path().join("absent")));
    let err = missing.run(shutdown_rx.clone()).await.unwrap_err();
    assert!(matches!(err, LaunchError::Process(_)));
    assert!(err.to_string().contains("absent"));
    assert!(!output.exists());

    let launcher = Launcher::new(LauncherConfig::new(&config_path, &script));
    let status = launcher.run(shutdown_rx).await.unwrap();
    assert_eq!(exit_code(&status), 7);

    let written = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(
        lines,
        vec![
            "args=start",
            "endpoint=0.0.0.0:24224",
            "attributes=team=observability,team=platform",
            "receivers=fluent,otlp",
            "exporter=",
            "ambient=kept",
        ]
    );

    // Only the child saw the synthesized variables
    assert_eq!(
        std::env::var("ROTEL_OTEL_RESOURCE_ATTRIBUTES").as_deref(),
        Ok("team=platform")
    );
    assert!(std::env::var("ROTEL_RECEIVERS").is_err());
    assert!(std::env::var("ROTEL_FLUENT_RECEIVER_ENDPOINT").is_err());
}
