// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! End-to-end runs of the engine against recording backends

mod common;

use serde_json::json;
use tempfile::TempDir;

use common::{context, options, params, Call, Fakes, SigningState, KEY_NAME};
use stevedore::engine::{RunState, CONTENT_TRUST, CONTENT_TRUST_PASSPHRASE};
use stevedore::{ImageExecutor, StevedoreError};

const SINGLE_BUILD: &str = r#"
images:
  - name: image0
    vars:
      context: .
    stages:
      - name: stage0
        task_type: docker_build
        dockerfile: Dockerfile
        output:
          - registry: r0
            tag: t0
"#;

const THREE_OUTPUTS: &str = r#"
images:
  - name: image0
    vars:
      context: .
    stages:
      - name: stage0
        task_type: docker_build
        dockerfile: Dockerfile
        output:
          - registry: r0
            tag: t0
          - registry: r1
            tag: t1
          - registry: r2
            tag: t2
"#;

#[tokio::test]
async fn test_build_and_push_single_output() {
    let (fakes, backends) = Fakes::new().into_backends();
    let mut ctx = context(SINGLE_BUILD, &options("image0"));

    let outcome = ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();

    assert_eq!(fakes.builds().len(), 1);
    match &fakes.builds()[0] {
        Call::Build {
            build_args,
            labels,
            platform,
            ..
        } => {
            assert!(build_args.is_empty());
            assert!(labels.is_empty());
            assert_eq!(platform, &None);
        }
        other => panic!("Expected build, got {other:?}"),
    }
    assert_eq!(fakes.tags(), vec![("r0".to_string(), "t0".to_string())]);
    assert_eq!(fakes.pushes(), vec![("r0".to_string(), "t0".to_string())]);
    assert!(fakes.calls().contains(&Call::EnsureRepository {
        registry: "r0".to_string()
    }));

    assert!(outcome.captured.is_empty());
    assert!(outcome.report.is_none());
    assert_eq!(ctx.state(), RunState::Completed);
}

#[tokio::test]
async fn test_include_tags_report() {
    let yaml = r#"
images:
  - name: image0
    vars:
      context: .
    stages:
      - name: stage0
        task_type: docker_build
        dockerfile: Dockerfile
        tags: ["tag0"]
        output:
          - registry: r0
            tag: t0

      - name: stage1
        task_type: docker_build
        dockerfile: Dockerfile
        tags: ["tag1"]
        output:
          - registry: r1
            tag: t1
"#;
    let (fakes, backends) = Fakes::new().into_backends();
    let mut opts = options("image0");
    opts.include_tags = vec!["tag0".to_string()];
    opts.pipeline = true;
    let mut ctx = context(yaml, &opts);

    let outcome = ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();
    let report = outcome.report.expect("pipeline mode returns a report");

    assert_eq!(
        report.to_json()["image0"]["stage1"],
        json!({"skipping-stage": "stage1"})
    );
    let stage0 = report.stage("image0", "stage0").unwrap();
    assert!(!stage0.contains_key("skipping-stage"));
    assert_eq!(stage0["stage-started"], "1/2");
    assert_eq!(stage0["docker-image-push"], "r0:t0");
    assert_eq!(report.event("image0", None, "image-build-start"), Some("image0"));

    assert_eq!(fakes.builds().len(), 1);
    assert_eq!(fakes.pushes(), vec![("r0".to_string(), "t0".to_string())]);
}

#[tokio::test]
async fn test_skip_tags_and_untagged_stages() {
    let yaml = r#"
images:
  - name: image0
    stages:
      - name: tagged
        task_type: tag_image
        tags: ["slow"]
        source: {registry: src0, tag: t}
        destination:
          - {registry: dst0, tag: t}

      - name: untagged
        task_type: tag_image
        source: {registry: src1, tag: t}
        destination:
          - {registry: dst1, tag: t}
"#;

    // Skipping never touches untagged stages
    let (fakes, backends) = Fakes::new().into_backends();
    let mut opts = options("image0");
    opts.skip_tags = vec!["slow".to_string()];
    let mut ctx = context(yaml, &opts);
    ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();
    assert_eq!(fakes.pushes(), vec![("dst1".to_string(), "t".to_string())]);

    // An include filter leaves untagged stages out
    let (fakes, backends) = Fakes::new().into_backends();
    let mut opts = options("image0");
    opts.include_tags = vec!["slow".to_string()];
    let mut ctx = context(yaml, &opts);
    ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();
    assert_eq!(fakes.pushes(), vec![("dst0".to_string(), "t".to_string())]);
}

#[tokio::test]
async fn test_continue_on_errors() {
    let (fakes, backends) = Fakes::new().failing_pushes(&[2]).into_backends();
    let mut opts = options("image0");
    opts.pipeline = true;
    let mut ctx = context(THREE_OUTPUTS, &opts);

    let outcome = ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();

    assert_eq!(fakes.pushes().len(), 3);
    assert_eq!(outcome.captured.len(), 1);
    assert_eq!(outcome.captured[0].stage, "stage0");
    assert!(matches!(
        outcome.captured[0].error,
        StevedoreError::PublishFailed { ref target, .. } if target == "r1:t1"
    ));

    let report = outcome.report.unwrap();
    let error = report
        .event("image0", Some("stage0"), "docker-image-push/error")
        .unwrap();
    assert!(error.contains("r1:t1"));
    assert_eq!(ctx.state(), RunState::Completed);
}

#[tokio::test]
async fn test_fail_on_captured_errors() {
    let (fakes, backends) = Fakes::new().failing_pushes(&[2]).into_backends();
    let mut opts = options("image0");
    opts.fail_on_errors = true;
    opts.pipeline = true;
    let mut ctx = context(THREE_OUTPUTS, &opts);

    let err = ImageExecutor::new(backends)
        .execute(&mut ctx)
        .await
        .unwrap_err();

    assert_eq!(fakes.pushes().len(), 3);
    assert!(matches!(
        err,
        StevedoreError::PublishFailed { ref target, .. } if target == "r1:t1"
    ));

    let summary = ctx
        .report()
        .event("image0", None, "docker-image-push/captured-errors")
        .unwrap();
    assert!(summary.contains("[stage0]"));
}

#[tokio::test]
async fn test_fail_on_errors_without_errors_succeeds() {
    let (fakes, backends) = Fakes::new().into_backends();
    let mut opts = options("image0");
    opts.fail_on_errors = true;
    let mut ctx = context(THREE_OUTPUTS, &opts);

    let outcome = ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();
    assert!(outcome.captured.is_empty());
    assert_eq!(fakes.pushes().len(), 3);
}

#[tokio::test]
async fn test_abort_on_first_error() {
    let (fakes, backends) = Fakes::new().failing_pushes(&[1]).into_backends();
    let mut opts = options("image0");
    opts.continue_on_errors = false;
    let mut ctx = context(THREE_OUTPUTS, &opts);

    let err = ImageExecutor::new(backends)
        .execute(&mut ctx)
        .await
        .unwrap_err();

    assert_eq!(fakes.pushes().len(), 1);
    assert!(matches!(err, StevedoreError::PublishFailed { .. }));
    assert_eq!(ctx.state(), RunState::Aborted);
    assert!(ctx.captured_errors().is_empty());
}

#[tokio::test]
async fn test_tag_image_republishes() {
    let yaml = r#"
vars:
  quay: quay.io/org
images:
  - name: image0
    stages:
      - name: retag
        task_type: tag_image
        source:
          registry: $(inputs.params.quay)/image0
          tag: $(inputs.params.version)
        destination:
          - registry: reg0/image0
            tag: latest
          - registry: reg1/image0
            tag: $(inputs.params.version)
"#;
    let (fakes, backends) = Fakes::new().into_backends();
    let mut opts = options("image0");
    opts.parameters = params(&[("version", "1.2.3")]);
    let mut ctx = context(yaml, &opts);

    ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();

    let calls = fakes.calls();
    assert_eq!(
        calls[0],
        Call::Pull {
            registry: "quay.io/org/image0".to_string(),
            tag: "1.2.3".to_string(),
        }
    );
    assert!(fakes.builds().is_empty());
    assert_eq!(
        fakes.tags(),
        vec![
            ("reg0/image0".to_string(), "latest".to_string()),
            ("reg1/image0".to_string(), "1.2.3".to_string()),
        ]
    );
    assert_eq!(fakes.pushes(), fakes.tags());
    assert!(calls.iter().any(|c| matches!(
        c,
        Call::Tag { image, .. } if image == "quay.io/org/image0:1.2.3"
    )));
}

#[tokio::test]
async fn test_tag_image_pull_failure_is_captured() {
    let yaml = r#"
images:
  - name: image0
    stages:
      - name: retag
        task_type: tag_image
        source: {registry: src, tag: t}
        destination:
          - {registry: dst, tag: t}
      - name: after
        task_type: tag_image
        source: {registry: src2, tag: t}
        destination: []
"#;
    let (fakes, backends) = Fakes::new().failing_pull().into_backends();
    let mut ctx = context(yaml, &options("image0"));

    let outcome = ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();

    // Both pulls fail; each is captured and the run carries on
    assert_eq!(outcome.captured.len(), 2);
    assert_eq!(outcome.captured[0].operation, "docker-image-pull");
    assert_eq!(outcome.captured[1].stage, "after");
    assert!(fakes.tags().is_empty());
    assert!(fakes.pushes().is_empty());
    // The next stage still ran
    assert!(fakes.calls().contains(&Call::Pull {
        registry: "src2".to_string(),
        tag: "t".to_string(),
    }));
}

#[tokio::test]
async fn test_dockerfile_create_writes_file() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("Dockerfile.data");
    let yaml = r#"
vars:
  bucket: https://downloads.example.com
images:
  - name: image0
    stages:
      - name: data
        task_type: dockerfile_create
        from: busybox
        static_files:
          - src: $(inputs.params.bucket)/archive.tgz
            dst: /data/archive.tgz
          - from: builder
            src: /out/bin
            dst: /usr/local/bin/
        output:
          - dockerfile: $(inputs.params.out)
"#;
    let (fakes, backends) = Fakes::new().into_backends();
    let mut opts = options("image0");
    opts.parameters = params(&[("out", output.to_str().unwrap())]);
    opts.pipeline = true;
    let mut ctx = context(yaml, &opts);

    let outcome = ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "FROM busybox\n\
         ADD https://downloads.example.com/archive.tgz /data/archive.tgz\n\
         ADD --from=builder /out/bin /usr/local/bin/\n"
    );
    assert_eq!(
        outcome
            .report
            .unwrap()
            .event("image0", Some("data"), "dockerfile-save-location"),
        output.to_str()
    );
    assert!(fakes.calls().is_empty());
}

#[tokio::test]
async fn test_dockerfile_template_renders_and_saves() {
    let yaml = r#"
images:
  - name: image0
    vars:
      context: docker/image0
      template_context: docker/templates
    inputs:
      - version
    stages:
      - name: template
        task_type: dockerfile_template
        distro: ubi
        vars:
          base: ubi8
        inputs:
          - base
          - version
        output:
          - dockerfile: s3://bucket/image0/$(inputs.params.version)/Dockerfile
          - dockerfile: out/Dockerfile
          - registry: not-a-dockerfile
            tag: ignored
"#;
    let (fakes, backends) = Fakes::new().into_backends();
    let mut opts = options("image0");
    opts.parameters = params(&[("version", "5.0")]);
    opts.pipeline = true;
    let mut ctx = context(yaml, &opts);

    let outcome = ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();

    let calls = fakes.calls();
    assert_eq!(
        calls[0],
        Call::Render {
            context: "docker/templates".into(),
            variant: Some("ubi".to_string()),
            params: params(&[("base", "ubi8"), ("version", "5.0")]),
        }
    );

    let rendered = "# Dockerfile.ubi\nARG base=ubi8\nARG version=5.0\n".to_string();
    assert_eq!(
        &calls[1..],
        &[
            Call::Save {
                destination: "s3://bucket/image0/5.0/Dockerfile".to_string(),
                content: rendered.clone(),
            },
            Call::Save {
                destination: "out/Dockerfile".to_string(),
                content: rendered,
            },
        ]
    );

    // One event per destination; the report keeps the last
    assert_eq!(
        outcome
            .report
            .unwrap()
            .event("image0", Some("template"), "dockerfile-save-location"),
        Some("out/Dockerfile")
    );
}

#[tokio::test]
async fn test_dockerfile_template_falls_back_to_docker_context() {
    let yaml = r#"
images:
  - name: image0
    stages:
      - name: template
        task_type: dockerfile_template
        dockercontext: docker/stage
        output:
          - dockerfile: Dockerfile.out
"#;
    let (fakes, backends) = Fakes::new().into_backends();
    let mut ctx = context(yaml, &options("image0"));

    ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();

    assert_eq!(
        fakes.calls()[0],
        Call::Render {
            context: "docker/stage".into(),
            variant: None,
            params: Default::default(),
        }
    );
}

#[tokio::test]
async fn test_build_arguments_are_interpolated() {
    let yaml = r#"
vars:
  registry: quay.io/org
images:
  - name: image0
    vars:
      context: docker/$(inputs.params.name)
      name: image0
    stages:
      - name: build
        task_type: docker_build
        dockerfile: docker/$(inputs.params.name)/Dockerfile
        platform: linux/$(inputs.params.arch)
        buildargs:
          version: $(inputs.params.version)
          retries: 3
        labels:
          quay.expires-after: 48h
        output:
          - registry: $(inputs.params.registry)/$(inputs.params.name)
            tag: $(inputs.params.version_id)
"#;
    let (fakes, backends) = Fakes::new().into_backends();
    let mut opts = options("image0");
    opts.parameters = params(&[("version", "2.0"), ("arch", "arm64")]);
    let mut ctx = context(yaml, &opts);

    let outcome = ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();

    assert_eq!(
        fakes.builds()[0],
        Call::Build {
            context: "docker/image0".into(),
            dockerfile: "docker/image0/Dockerfile".into(),
            dockerfile_content: None,
            build_args: params(&[("version", "2.0"), ("retries", "3")]),
            labels: params(&[("quay.expires-after", "48h")]),
            platform: Some("linux/arm64".to_string()),
        }
    );
    assert_eq!(
        fakes.pushes(),
        vec![("quay.io/org/image0".to_string(), outcome.run_id.clone())]
    );
}

#[tokio::test]
async fn test_remote_dockerfile_is_fetched() {
    let yaml = r#"
images:
  - name: image0
    vars:
      context: .
    stages:
      - name: build
        task_type: docker_build
        dockerfile: https://example.com/Dockerfile
"#;
    let (fakes, backends) = Fakes::new().into_backends();
    let mut ctx = context(yaml, &options("image0"));

    ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();

    let calls = fakes.calls();
    let Call::Fetch { url, path } = &calls[0] else {
        panic!("Expected fetch, got {:?}", calls[0]);
    };
    assert_eq!(url, "https://example.com/Dockerfile");

    let Call::Build {
        dockerfile,
        dockerfile_content,
        ..
    } = &calls[1]
    else {
        panic!("Expected build, got {:?}", calls[1]);
    };
    assert_eq!(dockerfile, path);
    assert_eq!(dockerfile_content.as_deref(), Some("FROM remote\n"));

    // The download is gone once the stage is done
    assert!(!path.exists());
    assert!(fakes.pushes().is_empty());
}

#[tokio::test]
async fn test_signing_is_armed_around_push() {
    let dir = TempDir::new().unwrap();
    let trust_dir = dir.path().join("trust/private");
    let key_path = trust_dir.join(KEY_NAME);

    let yaml = r#"
images:
  - name: image0
    vars:
      context: .
    stages:
      - name: build
        task_type: docker_build
        dockerfile: Dockerfile
        output:
          - registry: signed
            tag: t0
            signer_name: evergreen_ci
            key_secret_name: image0/key
            passphrase_secret_name: image0/$(inputs.params.secret)
            region: us-east-1
          - registry: unsigned
            tag: t0
          - registry: no-region
            tag: t0
            signer_name: evergreen_ci
            key_secret_name: image0/key
            passphrase_secret_name: image0/passphrase
"#;

    // Successful signed push
    let (fakes, backends) = Fakes::new()
        .with_secret("image0/key", "PRIVATE KEY")
        .with_secret("image0/passphrase", "s3cret")
        .watching_trust_dir(&trust_dir)
        .into_backends();
    let mut opts = options("image0");
    opts.trust_dir = trust_dir.clone();
    opts.parameters = params(&[("secret", "passphrase")]);
    let mut ctx = context(yaml, &opts);

    ImageExecutor::new(backends.clone())
        .execute(&mut ctx)
        .await
        .unwrap();

    assert_eq!(
        fakes.push_signing_states(),
        vec![
            Some(SigningState {
                passphrase: Some("s3cret".to_string()),
                key: Some("PRIVATE KEY".to_string()),
            }),
            None,
            None,
        ]
    );
    assert!(fakes.calls().contains(&Call::GetSecret {
        name: "image0/passphrase".to_string(),
        region: "us-east-1".to_string(),
    }));
    assert!(std::env::var(CONTENT_TRUST).is_err());
    assert!(std::env::var(CONTENT_TRUST_PASSPHRASE).is_err());
    assert!(!key_path.exists());

    // A failed push still tears everything down
    let (fakes, backends) = Fakes::new()
        .with_secret("image0/key", "PRIVATE KEY")
        .with_secret("image0/passphrase", "s3cret")
        .watching_trust_dir(&trust_dir)
        .failing_pushes(&[1])
        .into_backends();
    let mut ctx = context(yaml, &opts);

    let outcome = ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();

    assert_eq!(outcome.captured.len(), 1);
    assert!(fakes.push_signing_states()[0].is_some());
    assert!(std::env::var(CONTENT_TRUST).is_err());
    assert!(!key_path.exists());

    // A missing secret fails that destination before anything is set up
    let (fakes, backends) = Fakes::new()
        .with_secret("image0/passphrase", "s3cret")
        .watching_trust_dir(&trust_dir)
        .into_backends();
    let mut ctx = context(yaml, &opts);

    let outcome = ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();

    assert_eq!(outcome.captured.len(), 1);
    assert_eq!(
        fakes.pushes(),
        vec![
            ("unsigned".to_string(), "t0".to_string()),
            ("no-region".to_string(), "t0".to_string()),
        ]
    );
    assert!(std::env::var(CONTENT_TRUST).is_err());
    assert!(!key_path.exists());
}

#[tokio::test]
async fn test_missing_variable_is_fatal() {
    let yaml = r#"
images:
  - name: image0
    vars:
      context: .
    stages:
      - name: build
        task_type: docker_build
        dockerfile: Dockerfile
        output:
          - registry: r0
            tag: $(inputs.params.nope)
      - name: never
        task_type: tag_image
        source: {registry: s, tag: t}
"#;
    let (fakes, backends) = Fakes::new().into_backends();
    let mut ctx = context(yaml, &options("image0"));

    let err = ImageExecutor::new(backends)
        .execute(&mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, StevedoreError::VariableNotFound { ref name } if name == "nope"));
    assert!(fakes.pushes().is_empty());
    assert!(!fakes.calls().iter().any(|c| matches!(c, Call::Pull { .. })));
    assert_eq!(ctx.state(), RunState::Aborted);
}

#[tokio::test]
async fn test_missing_image_input_is_fatal() {
    let yaml = r#"
images:
  - name: image0
    inputs:
      - version
    vars:
      context: .
      version: from-image-vars
    stages:
      - name: build
        task_type: docker_build
        dockerfile: Dockerfile
        output:
          - registry: r0
            tag: $(inputs.params.version)
"#;
    let (_fakes, backends) = Fakes::new().into_backends();
    let mut ctx = context(yaml, &options("image0"));

    let err = ImageExecutor::new(backends)
        .execute(&mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, StevedoreError::MissingInput { ref name } if name == "version"));
}

#[tokio::test]
async fn test_build_failure_is_never_captured() {
    let yaml = r#"
images:
  - name: image0
    vars:
      context: .
    stages:
      - name: build
        task_type: docker_build
        dockerfile: Dockerfile
        output:
          - {registry: r0, tag: t0}
      - name: never
        task_type: tag_image
        source: {registry: s, tag: t}
"#;
    let (fakes, backends) = Fakes::new().failing_build().into_backends();
    let mut opts = options("image0");
    opts.pipeline = true;
    let mut ctx = context(yaml, &opts);

    let err = ImageExecutor::new(backends)
        .execute(&mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, StevedoreError::BuildFailed { .. }));
    assert_eq!(fakes.calls().len(), 1);
    assert!(ctx.captured_errors().is_empty());
    assert!(ctx
        .report()
        .event("image0", Some("build"), "stage-aborted")
        .is_some());
}

#[tokio::test]
async fn test_missing_docker_context_is_fatal() {
    let yaml = r#"
images:
  - name: image0
    stages:
      - name: build
        task_type: docker_build
        dockerfile: Dockerfile
"#;
    let (fakes, backends) = Fakes::new().into_backends();
    let mut ctx = context(yaml, &options("image0"));

    let err = ImageExecutor::new(backends)
        .execute(&mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, StevedoreError::MissingDockerContext { .. }));
    assert!(fakes.calls().is_empty());
}

const LEGACY_STAGE: &str = r#"
images:
  - name: image0
    vars:
      context: .
    stages:
      - name: stage0
        task_type: docker_build
        dockerfile: Dockerfile
        output:
          - registry: r0
            tag: t0
      - name: legacy
        task_type: podman_build
        tags: [legacy]
"#;

#[tokio::test]
async fn test_skipped_stage_with_unknown_task_type() {
    let (fakes, backends) = Fakes::new().into_backends();
    let mut opts = options("image0");
    opts.skip_tags = vec!["legacy".to_string()];
    opts.pipeline = true;
    let mut ctx = context(LEGACY_STAGE, &opts);

    let outcome = ImageExecutor::new(backends).execute(&mut ctx).await.unwrap();

    assert_eq!(fakes.pushes(), vec![("r0".to_string(), "t0".to_string())]);
    assert!(outcome.captured.is_empty());
    assert_eq!(
        ctx.report().event("image0", Some("legacy"), "skipping-stage"),
        Some("legacy")
    );
}

#[tokio::test]
async fn test_unknown_task_type_fails_when_reached() {
    let (fakes, backends) = Fakes::new().into_backends();
    let mut opts = options("image0");
    opts.pipeline = true;
    let mut ctx = context(LEGACY_STAGE, &opts);

    let err = ImageExecutor::new(backends)
        .execute(&mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StevedoreError::UnknownTaskType { ref task_type, ref stage }
            if task_type == "podman_build" && stage == "legacy"
    ));
    assert_eq!(fakes.pushes().len(), 1);
    assert!(ctx
        .report()
        .event("image0", Some("legacy"), "stage-aborted")
        .is_some());
    assert_eq!(ctx.state(), RunState::Aborted);
}

#[tokio::test]
async fn test_malformed_stage_fails_when_reached() {
    let yaml = r#"
images:
  - name: image0
    stages:
      - name: retag
        task_type: tag_image
        destination:
          - {registry: r0, tag: t0}
"#;
    let (fakes, backends) = Fakes::new().into_backends();
    let mut ctx = context(yaml, &options("image0"));

    let err = ImageExecutor::new(backends)
        .execute(&mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, StevedoreError::InvalidStage { ref stage, .. } if stage == "retag"));
    assert!(fakes.calls().is_empty());
}
