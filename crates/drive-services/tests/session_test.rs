#[path = "helpers/mod.rs"]
mod helpers;

use chrono::{Datelike, Utc};
use drive_core::FlipAxis;
use drive_services::{DriveError, SessionState};
use helpers::{dimensions, png, TestDisk};
use std::time::Duration;

#[tokio::test]
async fn test_avatar_profile_is_applied_and_committed() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;
    let mut session = drive
        .accept(disk.inbound("photo.jpg", "image/png", &png(300, 200)))
        .unwrap();

    let path = session.profile("avatar").save(None).await.unwrap().unwrap();

    let now = Utc::now();
    assert_eq!(path, format!("{}/{}/photo.jpg", now.year(), now.month()));
    assert_eq!(session.state(), SessionState::Committed);
    // crop(100, 100, 25, 25) then heighten(200)
    assert_eq!(dimensions(&disk.final_path(&path)), (200, 200));

    session.close().await;
    assert_eq!(disk.scratch_entries(), 0);
}

#[tokio::test]
async fn test_empty_profile_commits_identical_bytes() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;
    let original = png(64, 48);
    let mut session = drive
        .accept(disk.inbound("raw.png", "image/png", &original))
        .unwrap();

    let path = session.profile("raw").save(None).await.unwrap().unwrap();

    assert_eq!(std::fs::read(disk.final_path(&path)).unwrap(), original);
    session.close().await;
}

#[tokio::test]
async fn test_default_profiles_apply_when_none_queued() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;

    let mut image = drive
        .accept(disk.inbound("a.png", "image/png", &png(300, 200)))
        .unwrap();
    let image_path = image.save(None).await.unwrap().unwrap();
    assert_eq!(dimensions(&disk.final_path(&image_path)), (200, 200));
    image.close().await;

    // No defaults for documents: committed untouched
    let mut document = drive
        .accept(disk.inbound("notes.txt", "text/plain", b"plain text"))
        .unwrap();
    let doc_path = document.save(None).await.unwrap().unwrap();
    assert!(doc_path.ends_with("/notes.txt"));
    assert_eq!(std::fs::read(disk.final_path(&doc_path)).unwrap(), b"plain text");
    document.close().await;
}

#[tokio::test]
async fn test_operation_order_is_significant() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;
    let source = png(40, 20);

    let mut first = drive
        .accept(disk.inbound("a.png", "image/png", &source))
        .unwrap();
    first.edit().crop(10, 10, 0, 0).rotate(90.0);
    let a = first.save(None).await.unwrap().unwrap();

    let mut second = drive
        .accept(disk.inbound("b.png", "image/png", &source))
        .unwrap();
    second.edit().rotate(90.0).crop(10, 10, 0, 0);
    let b = second.save(None).await.unwrap().unwrap();

    assert_ne!(
        std::fs::read(disk.final_path(&a)).unwrap(),
        std::fs::read(disk.final_path(&b)).unwrap()
    );
    first.close().await;
    second.close().await;
}

#[tokio::test]
async fn test_unreadable_image_is_committed_untransformed() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;
    let mut session = drive
        .accept(disk.inbound("broken.jpg", "image/jpeg", b"not really a jpeg"))
        .unwrap();

    let path = session.profile("avatar").save(None).await.unwrap();

    let path = path.expect("unreadable content must still be committed");
    assert_eq!(
        std::fs::read(disk.final_path(&path)).unwrap(),
        b"not really a jpeg"
    );
    session.close().await;
}

#[tokio::test]
async fn test_second_save_starts_from_empty_queue() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;
    let mut session = drive
        .accept(disk.inbound("pic.png", "image/png", &png(40, 20)))
        .unwrap();

    session.edit().rotate(90.0);
    let first = session.save(None).await.unwrap().unwrap();
    assert!(session.queued().is_empty());

    session.edit().widen(80);
    let second = session.save(Some("_wide")).await.unwrap().unwrap();

    assert_eq!(dimensions(&disk.final_path(&first)), (20, 40));
    // widen only, applied to a fresh copy of the original
    assert_eq!(dimensions(&disk.final_path(&second)), (80, 40));
    assert!(second.ends_with("/pic_wide.png"));
    session.close().await;
}

#[tokio::test]
async fn test_profile_queued_after_commit_applies_to_next_save() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;
    let mut session = drive
        .accept(disk.inbound("pic.png", "image/png", &png(300, 200)))
        .unwrap();

    let first = session.profile("raw").save(None).await.unwrap().unwrap();
    assert_eq!(session.state(), SessionState::Committed);

    session.profile("avatar");
    assert_eq!(session.state(), SessionState::Committed);
    assert_eq!(session.queued().len(), 1);

    let second = session.save(Some("_avatar")).await.unwrap().unwrap();
    assert_eq!(dimensions(&disk.final_path(&first)), (300, 200));
    assert_eq!(dimensions(&disk.final_path(&second)), (200, 200));
    session.close().await;
}

#[tokio::test]
async fn test_same_name_twice_gets_a_digit_tail() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;

    let mut first = drive
        .accept(disk.inbound("a.png", "image/png", &png(8, 8)))
        .unwrap();
    let a = first.profile("raw").save(None).await.unwrap().unwrap();

    let mut second = drive
        .accept(disk.inbound("a.png", "image/png", &png(8, 8)))
        .unwrap();
    let b = second.profile("raw").save(None).await.unwrap().unwrap();

    assert!(a.ends_with("/a.png"));
    let (dir, name) = b.rsplit_once('/').unwrap();
    assert_eq!(Some(dir), a.rsplit_once('/').map(|(d, _)| d));
    let digit = name
        .strip_prefix("a-")
        .and_then(|n| n.strip_suffix(".png"))
        .unwrap();
    assert_eq!(digit.len(), 1);
    assert!(digit.chars().all(|c| c.is_ascii_digit()));

    first.close().await;
    second.close().await;
}

#[tokio::test]
async fn test_unknown_profile_fails_before_staging() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;
    let inbound = disk.inbound("a.png", "image/png", &png(8, 8));
    let upload = inbound.path().to_path_buf();
    let mut session = drive.accept(inbound).unwrap();

    let err = session.profile("thumb").save(None).await.unwrap_err();

    assert!(matches!(err, DriveError::UnknownProfile(ref name) if name == "thumb"));
    assert_eq!(session.state(), SessionState::Failed);
    assert!(upload.exists(), "nothing should have been staged");
    session.close().await;
}

#[tokio::test]
async fn test_transform_error_names_the_step() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;
    let mut session = drive
        .accept(disk.inbound("small.png", "image/png", &png(50, 50)))
        .unwrap();

    session.edit().flip(FlipAxis::Vertical).crop(40, 40, 30, 30);
    let err = session.save(None).await.unwrap_err();

    match err {
        DriveError::Transform {
            profile,
            operation,
            position,
            ..
        } => {
            assert_eq!(profile, "editing");
            assert_eq!(operation, "crop");
            assert_eq!(position, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!disk.root().join("files").exists());

    session.close().await;
    assert_eq!(disk.scratch_entries(), 0);
}

#[tokio::test]
async fn test_rejected_editing_step_is_reported() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;
    let mut session = drive
        .accept(disk.inbound("a.png", "image/png", &png(8, 8)))
        .unwrap();

    session.edit().resize(0, 10);
    let err = session.save(None).await.unwrap_err();

    assert!(matches!(err, DriveError::InvalidOperation { ref operation, .. } if operation == "resize"));
    session.close().await;
}

#[tokio::test]
async fn test_oversized_edit_is_rejected_without_staging() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;
    let inbound = disk.inbound("a.png", "image/png", &png(8, 8));
    let upload = inbound.path().to_path_buf();
    let mut session = drive.accept(inbound).unwrap();

    session.edit().resize(u32::MAX, u32::MAX);
    let err = session.save(None).await.unwrap_err();

    assert!(matches!(err, DriveError::InvalidOperation { ref operation, .. } if operation == "resize"));
    assert!(upload.exists());
    session.close().await;
}

#[tokio::test]
async fn test_oversized_output_is_a_transform_error() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;
    let mut session = drive
        .accept(disk.inbound("strip.png", "image/png", &png(1, 400)))
        .unwrap();

    // 100 wide keeps the ratio at 100x40000
    session.edit().greyscale().widen(100);
    let err = session.save(None).await.unwrap_err();

    match err {
        DriveError::Transform {
            operation,
            position,
            ..
        } => {
            assert_eq!(operation, "widen");
            assert_eq!(position, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!disk.root().join("files").exists());
    session.close().await;
}

#[tokio::test]
async fn test_client_directories_are_stripped_from_name() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;
    let mut session = drive
        .accept(disk.inbound("nested/deep/photo.png", "image/png", &png(8, 8)))
        .unwrap();

    let path = session.profile("raw").save(None).await.unwrap().unwrap();

    let now = Utc::now();
    assert_eq!(path, format!("{}/{}/photo.png", now.year(), now.month()));
    assert!(disk.final_path(&path).exists());
    assert!(!disk
        .final_path(&format!("{}/{}/nested", now.year(), now.month()))
        .exists());
    session.close().await;
}

#[tokio::test]
async fn test_commit_failure_returns_none_and_can_be_retried() {
    let disk = TestDisk::new();
    let (drive, storage) = disk.instrumented_drive().await;
    let mut session = drive
        .accept(disk.inbound("a.png", "image/png", &png(8, 8)))
        .unwrap();

    storage
        .fail_commits
        .store(true, std::sync::atomic::Ordering::SeqCst);
    assert_eq!(session.profile("raw").save(None).await.unwrap(), None);
    assert!(session.queued().is_empty());

    storage
        .fail_commits
        .store(false, std::sync::atomic::Ordering::SeqCst);
    let path = session.profile("raw").save(None).await.unwrap().unwrap();
    assert!(disk.final_path(&path).exists());

    session.close().await;
}

#[tokio::test]
async fn test_cleanup_runs_exactly_once() {
    let disk = TestDisk::new();
    let (drive, storage) = disk.instrumented_drive().await;

    // never saved
    let mut idle = drive
        .accept(disk.inbound("a.png", "image/png", &png(8, 8)))
        .unwrap();
    idle.close().await;
    idle.close().await;
    drop(idle);
    assert_eq!(storage.deletes(), 1);

    // saved twice
    let mut busy = drive
        .accept(disk.inbound("b.png", "image/png", &png(8, 8)))
        .unwrap();
    busy.profile("raw").save(None).await.unwrap();
    busy.profile("raw").save(None).await.unwrap();
    busy.close().await;
    drop(busy);
    assert_eq!(storage.deletes(), 2);
    assert_eq!(disk.scratch_entries(), 0);
}

#[tokio::test]
async fn test_abandoned_session_is_cleaned_up() {
    let disk = TestDisk::new();
    let drive = disk.drive().await;
    let mut session = drive
        .accept(disk.inbound("a.png", "image/png", &png(8, 8)))
        .unwrap();
    session.profile("raw").save(None).await.unwrap();
    assert!(disk.scratch_entries() > 0);

    drop(session);

    for _ in 0..100 {
        if disk.scratch_entries() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("scratch directory was not released after drop");
}

#[tokio::test]
async fn test_scoped_closes_on_error() {
    let disk = TestDisk::new();
    let (drive, storage) = disk.instrumented_drive().await;
    let session = drive
        .accept(disk.inbound("a.png", "image/png", &png(8, 8)))
        .unwrap();

    let result = session
        .scoped(|session| {
            Box::pin(async move {
                session.profile("raw").save(None).await?;
                session.profile("missing").save(None).await
            })
        })
        .await;

    assert!(matches!(result, Err(DriveError::UnknownProfile(_))));
    assert_eq!(storage.deletes(), 1);
    assert_eq!(disk.scratch_entries(), 0);
}
