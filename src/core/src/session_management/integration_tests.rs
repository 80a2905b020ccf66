#[cfg(test)]
mod integration_tests {
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    use crate::annotation::{Point, RasterCanvas, Tool};
    use crate::capture::{MediaTrack, TrackState};
    use crate::configuration::Config;
    use crate::host::{HeadlessDocument, SyntheticCapture, SyntheticRecorderService};
    use crate::listener_registry::{ElementId, EventKind};
    use crate::recording::FileDownloader;
    use crate::session_management::{HostServices, SessionController, SessionStatus};

    fn document(width: u32, height: u32) -> HeadlessDocument {
        HeadlessDocument::new(width, height)
            .with_element("startScreenShare")
            .with_element("stopScreenShare")
            .with_element("toggleRecording")
            .with_element("annotationCanvas")
            .with_element("tool-pen")
            .with_element("tool-arrow")
            .with_element("tool-rectangle")
            .with_element("tool-highlight")
    }

    fn controller(
        config: &Config,
        capture: &SyntheticCapture,
        recorders: &SyntheticRecorderService,
        document: &HeadlessDocument,
        download_dir: &Path,
    ) -> SessionController {
        let _ = env_logger::builder().is_test(true).try_init();
        SessionController::new(
            config,
            HostServices {
                capture: Box::new(capture.clone()),
                recorders: Box::new(recorders.clone()),
                document: Box::new(document.clone()),
                canvas: Box::new(RasterCanvas::new(1, 1)),
                downloads: Box::new(FileDownloader::new(download_dir).expect("download dir")),
            },
        )
        .expect("controller")
    }

    #[tokio::test(start_paused = true)]
    async fn full_session_with_one_recording() {
        let dir = tempfile::tempdir().unwrap();
        let capture = SyntheticCapture::new(2);
        let recorders = SyntheticRecorderService::manual();
        let page = document(1920, 1080);
        let canvas = ElementId::from("annotationCanvas");
        let ctl = controller(&Config::default(), &capture, &recorders, &page, dir.path());

        ctl.start().await;
        assert_eq!(ctl.status(), SessionStatus::Sharing);
        assert_eq!(page.listener_count(&canvas), 3);
        assert_eq!(ctl.with_canvas(|c| c.dimensions()), (1920, 1080));
        assert!(ctl.with_canvas(|c| c.is_visible()));

        ctl.toggle_recording().await;
        assert_eq!(ctl.status(), SessionStatus::Recording);
        assert_eq!(recorders.created(), 1);

        let handle = recorders.last_recorder().unwrap();
        for fragment in [vec![0x1A, 0x45, 0xDF, 0xA3], vec![7; 100], vec![8; 50]] {
            handle.emit(fragment);
        }

        ctl.stop().await;

        assert_eq!(ctl.status(), SessionStatus::Idle);
        assert_eq!(ctl.recorded_chunk_count(), 0);
        assert_eq!(page.listener_count(&canvas), 0);
        assert!(!ctl.with_canvas(|c| c.is_visible()));
        assert!(capture
            .issued_tracks()
            .iter()
            .all(|track| track.state() == TrackState::Ended && track.stop_calls() == 1));

        let outcome = ctl.last_recording().unwrap();
        assert_eq!(outcome.chunk_count, 3);
        let receipt = outcome.download.unwrap();
        assert_eq!(receipt.mime_type, "video/webm");
        let path = receipt.location.unwrap();
        assert_eq!(path, dir.path().join("screen-recording.webm"));
        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 154);
        assert_eq!(&bytes[..4], &[0x1A, 0x45, 0xDF, 0xA3]);

        let session = ctl.last_session().unwrap();
        assert_eq!(session.recordings, 1);
        assert!(session.annotations);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_recordings_land_side_by_side() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_toml_str(
            r#"
            [recording]
            file_name = "lesson.webm"
            revoke_delay_ms = 250
            "#,
        )
        .unwrap();
        let capture = SyntheticCapture::new(1);
        let recorders = SyntheticRecorderService::ticking(Duration::from_millis(100), 64);
        let page = document(800, 600);
        let ctl = controller(&config, &capture, &recorders, &page, dir.path());

        ctl.start().await;
        for _ in 0..2 {
            ctl.toggle_recording().await;
            tokio::time::sleep(Duration::from_millis(350)).await;
            assert_eq!(ctl.recorded_chunk_count(), 3);
            ctl.toggle_recording().await;
            assert_eq!(ctl.status(), SessionStatus::Sharing);
        }
        ctl.stop().await;

        assert!(dir.path().join("lesson.webm").is_file());
        assert!(dir.path().join("lesson (1).webm").is_file());
        assert_eq!(fs::read(dir.path().join("lesson (1).webm")).unwrap().len(), 192);
    }

    #[tokio::test]
    async fn clicking_through_the_page() {
        let dir = tempfile::tempdir().unwrap();
        let capture = SyntheticCapture::new(1);
        let recorders = SyntheticRecorderService::manual();
        let page = document(1024, 768);
        let ctl = controller(&Config::default(), &capture, &recorders, &page, dir.path());
        let before = page.snapshot();
        let canvas = ElementId::from("annotationCanvas");

        ctl.dispatch(&ElementId::from("startScreenShare"), EventKind::Click, None)
            .await;
        for tool in Tool::ALL {
            let selector = ElementId::new(format!("tool-{}", tool));
            assert!(ctl.dispatch(&selector, EventKind::Click, None).await);
            assert_eq!(ctl.annotation_state().tool, tool);

            ctl.dispatch(&canvas, EventKind::PointerDown, Some(Point::new(100.0, 100.0)))
                .await;
            ctl.dispatch(&canvas, EventKind::PointerMove, Some(Point::new(180.0, 140.0)))
                .await;
            ctl.dispatch(&canvas, EventKind::PointerUp, None).await;
        }
        ctl.clear_annotations();

        ctl.dispatch(&ElementId::from("stopScreenShare"), EventKind::Click, None)
            .await;

        assert_eq!(ctl.status(), SessionStatus::Idle);
        assert_eq!(page.snapshot(), before);
        assert_eq!(page.total_listeners(), 7);
        assert!(ctl.last_recording().is_none());
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
