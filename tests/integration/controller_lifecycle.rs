// Tests for the job lifecycle controller and its UI action sequences

use std::sync::Arc;

use ffpress::TranscodeError;
use ffpress::controller::JobController;
use ffpress::engine::JobOutcome;
use ffpress::ui::{UiAction, ui_channel};

use crate::common::{ScriptedRunner, Step, write_input};

const EXPECTED_DURATION_MILLIS: u64 = 9000;

fn controller_with(
    runner: Arc<ScriptedRunner>,
    dir: &std::path::Path,
) -> (JobController, ffpress::ui::UiReceiver) {
    let (ui, rx) = ui_channel();
    let controller = JobController::new(runner, ui, EXPECTED_DURATION_MILLIS, dir.to_path_buf());
    (controller, rx)
}

#[test]
fn test_successful_job_emits_progress_then_playback() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());

    let runner = Arc::new(ScriptedRunner::new(vec![
        Step::Progress(1000),
        Step::Progress(9000),
        Step::Complete(JobOutcome::Success {
            duration_millis: 5000,
        }),
    ]));
    let (controller, rx) = controller_with(runner, dir.path());

    controller.start_transcode(&input, "vp9").unwrap();

    let expected_output = dir.path().join("compressed_video.webm");
    assert_eq!(
        rx.drained(),
        vec![
            UiAction::ShowProgress,
            UiAction::ProgressUpdated(11),
            UiAction::ProgressUpdated(100),
            UiAction::HideProgress,
            UiAction::PlaybackRequested(expected_output),
        ]
    );
}

#[test]
fn test_failed_job_surfaces_state_and_trace() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());

    let runner = Arc::new(ScriptedRunner::new(vec![Step::Complete(
        JobOutcome::Failure {
            state_description: "FAILED".into(),
            fail_trace: Some("No such filter: 'bogus'".into()),
        },
    )]));
    let (controller, rx) = controller_with(runner, dir.path());

    controller.start_transcode(&input, "x264").unwrap();

    let actions = rx.drained();
    assert_eq!(actions.len(), 3);
    assert_eq!(actions[0], UiAction::ShowProgress);
    assert_eq!(actions[1], UiAction::HideProgress);
    match &actions[2] {
        UiAction::TranscodeFailed(message) => {
            assert!(message.contains("FAILED"));
            assert!(message.contains("No such filter"));
        }
        other => panic!("expected failure notification, got {other:?}"),
    }
}

#[test]
fn test_exactly_one_terminal_action_per_job() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());

    // Progress and log events keep arriving after the terminal callback
    let runner = Arc::new(ScriptedRunner::new(vec![
        Step::Progress(4500),
        Step::Complete(JobOutcome::Success {
            duration_millis: 1200,
        }),
        Step::Progress(9000),
        Step::Log("frame=  42"),
    ]));
    let (controller, rx) = controller_with(runner, dir.path());

    controller.start_transcode(&input, "mpeg4").unwrap();

    let actions = rx.drained();
    let terminals = actions
        .iter()
        .filter(|a| {
            matches!(
                a,
                UiAction::PlaybackRequested(_) | UiAction::TranscodeFailed(_)
            )
        })
        .count();
    assert_eq!(terminals, 1);
    // The late progress sample never reaches the display
    assert_eq!(
        actions
            .iter()
            .filter(|a| matches!(a, UiAction::ProgressUpdated(_)))
            .count(),
        1
    );
    assert_eq!(actions.last(), Some(&UiAction::PlaybackRequested(
        dir.path().join("compressed_video.mp4")
    )));
}

#[test]
fn test_pre_first_frame_samples_produce_no_display_update() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());

    let runner = Arc::new(ScriptedRunner::new(vec![
        Step::Progress(-1),
        Step::Progress(1000),
        Step::Complete(JobOutcome::Success {
            duration_millis: 900,
        }),
    ]));
    let (controller, rx) = controller_with(runner, dir.path());

    controller.start_transcode(&input, "x264").unwrap();

    let percents: Vec<u32> = rx
        .drained()
        .into_iter()
        .filter_map(|a| match a {
            UiAction::ProgressUpdated(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(percents, vec![11]);
}

#[test]
fn test_second_submission_while_in_flight_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());

    // No terminal step: the first job stays in flight
    let runner = Arc::new(ScriptedRunner::new(vec![Step::Progress(1000)]));
    let (controller, rx) = controller_with(runner, dir.path());

    controller.start_transcode(&input, "x264").unwrap();
    assert_eq!(
        controller.latest_progress().map(|p| p.elapsed_millis),
        Some(1000)
    );

    let second = controller.start_transcode(&input, "x264");
    assert!(matches!(second, Err(TranscodeError::JobInFlight)));

    // The rejected submission posts nothing
    let actions = rx.drained();
    assert_eq!(
        actions
            .iter()
            .filter(|a| matches!(a, UiAction::ShowProgress))
            .count(),
        1
    );
}

#[test]
fn test_terminal_job_admits_the_next_submission() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());

    let runner = Arc::new(ScriptedRunner::with_scripts(vec![
        vec![Step::Complete(JobOutcome::Failure {
            state_description: "FAILED".into(),
            fail_trace: None,
        })],
        vec![Step::Complete(JobOutcome::Success {
            duration_millis: 700,
        })],
    ]));
    let (controller, rx) = controller_with(runner, dir.path());

    controller.start_transcode(&input, "x264").unwrap();
    controller.start_transcode(&input, "x264").unwrap();

    let actions = rx.drained();
    assert!(matches!(actions[2], UiAction::TranscodeFailed(_)));
    assert!(matches!(actions.last(), Some(UiAction::PlaybackRequested(_))));
}

#[test]
fn test_invalid_input_is_rejected_before_submission() {
    let dir = tempfile::tempdir().unwrap();

    let runner = Arc::new(ScriptedRunner::new(vec![]));
    let (controller, rx) = controller_with(Arc::clone(&runner), dir.path());

    let missing = dir.path().join("nope.mp4");
    let result = controller.start_transcode(&missing, "x264");
    assert!(matches!(result, Err(TranscodeError::InvalidInput { .. })));

    assert!(runner.submissions().is_empty());
    assert!(rx.drained().is_empty());
}

#[test]
fn test_submitted_arguments_follow_the_codec_policy() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());

    let runner = Arc::new(ScriptedRunner::new(vec![Step::Complete(
        JobOutcome::Success {
            duration_millis: 100,
        },
    )]));
    let (controller, _rx) = controller_with(Arc::clone(&runner), dir.path());

    controller.start_transcode(&input, "vp9").unwrap();

    let submissions = runner.submissions();
    assert_eq!(submissions.len(), 1);
    let args = &submissions[0];
    assert!(args.windows(2).any(|w| w == ["-c:v", "libvpx-vp9"]));
    assert!(args.windows(2).any(|w| w == ["-b:v", "2M"]));
    assert!(args.last().unwrap().ends_with("compressed_video.webm"));
}
