// ABOUTME: Integration tests for container engine operations.
// ABOUTME: Run against a local Docker/Podman daemon and skip when none is reachable.

use futures::StreamExt;
use hookd::runtime::{
    BollardRuntime, BuildEvent, BuildOptions, ContainerFilters, ContainerOps, ImageError,
    ImageOps, RuntimeInfoTrait, detect_local,
};
use hookd::types::{CommitHash, ImageTag, ProjectRef};

/// Get local runtime, skipping test if unavailable.
fn local_runtime() -> Option<BollardRuntime> {
    let info = detect_local().ok()?;
    BollardRuntime::connect(&info).ok()
}

/// Skip test if no local runtime available.
macro_rules! require_runtime {
    () => {
        match local_runtime() {
            Some(rt) => rt,
            None => {
                eprintln!("Skipping test: no local container runtime found");
                return;
            }
        }
    };
}

/// Tar context with a single Dockerfile and one payload file.
fn context(dockerfile: &str) -> Vec<u8> {
    let mut archive = tar::Builder::new(Vec::new());
    for (name, body) in [("Dockerfile", dockerfile), ("hello.txt", "hello\n")] {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        archive
            .append_data(&mut header, name, body.as_bytes())
            .unwrap();
    }
    archive.into_inner().unwrap()
}

fn test_tag(salt: u8) -> ImageTag {
    let project = ProjectRef::new("github.com/hookd-test/runtime").unwrap();
    let commit = CommitHash::new(&format!("{:08x}{:02x}", std::process::id(), salt)).unwrap();
    ImageTag::new(&project, &commit)
}

// =============================================================================
// RuntimeInfo Tests
// =============================================================================

#[tokio::test]
async fn runtime_info() {
    let runtime = require_runtime!();

    let info = runtime.info().await.expect("should get runtime info");

    assert!(
        !info.name.is_empty(),
        "runtime name should not be empty, got: {}",
        info.name
    );
    assert!(
        !info.version.is_empty(),
        "runtime version should not be empty"
    );
}

#[tokio::test]
async fn runtime_ping() {
    let runtime = require_runtime!();
    runtime.ping().await.expect("ping should succeed");
}

// =============================================================================
// ContainerOps Tests
// =============================================================================

#[tokio::test]
async fn list_all_containers() {
    let runtime = require_runtime!();

    let containers = runtime
        .list_containers(&ContainerFilters::everything())
        .await
        .expect("list should succeed");

    for container in containers {
        assert!(!container.id.as_str().is_empty());
    }
}

// =============================================================================
// ImageOps Tests
// =============================================================================

#[tokio::test]
async fn build_and_remove_image() {
    let runtime = require_runtime!();
    let tag = test_tag(1);

    let mut options = BuildOptions::for_deploy(tag.clone());
    options.pull = false;
    let mut stream = runtime
        .build_image(context("FROM scratch\nCOPY hello.txt /hello.txt\n"), &options)
        .await
        .expect("build should start");

    let mut output = String::new();
    while let Some(event) = stream.next().await {
        match event.expect("build step should succeed") {
            BuildEvent::Output(chunk) => output.push_str(&chunk),
            BuildEvent::Built(_) => {}
        }
    }
    assert!(!output.is_empty(), "engine should report build progress");

    runtime
        .remove_image(&tag, true, true)
        .await
        .expect("remove should succeed");

    let err = runtime.remove_image(&tag, true, true).await.unwrap_err();
    assert!(matches!(err, ImageError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn failing_build_reports_error() {
    let runtime = require_runtime!();
    let tag = test_tag(2);

    let mut options = BuildOptions::for_deploy(tag.clone());
    options.pull = false;
    let result = runtime
        .build_image(context("FROM scratch\nRUN /does-not-exist\n"), &options)
        .await;

    let failed = match result {
        Err(_) => true,
        Ok(mut stream) => {
            let mut failed = false;
            while let Some(event) = stream.next().await {
                if event.is_err() {
                    failed = true;
                    break;
                }
            }
            failed
        }
    };
    assert!(failed, "build with a failing step should report an error");

    let _ = runtime.remove_image(&tag, true, true).await;
}
