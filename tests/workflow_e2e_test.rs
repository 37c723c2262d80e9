// ==========================================
// CRM 联系人导入 - 导入工作流端到端测试
// ==========================================
// 范围: 上传 → 预览 → 重复检查 → 确认 → 提交
// 覆盖: 自动跳过、阻塞式重复确认、取消确认、迟到结果丢弃、提交失败重试、返回导航
// ==========================================


use crm_contact_import::app::AppState;
use crm_contact_import::domain::contact::ImportStats;
use crm_contact_import::domain::types::WorkflowStep;
use crm_contact_import::importer::DuplicateMatcherImpl;
use crm_contact_import::repository::ContactRepository;
use crm_contact_import::workflow::{CancelOutcome, ImportWorkflowController, WorkflowError};
use std::sync::Arc;
use test_helpers::{
    build_csv, create_test_db, csv_row, existing_ref, profile_url, write_csv_file, GatedImporter,
    MockConfig, MockContactStore,
};
use tokio::sync::Notify;

fn controller_with(store: Arc<MockContactStore>, config: MockConfig) -> ImportWorkflowController {
    ImportWorkflowController::new(store.clone(), store, Arc::new(config))
}

fn five_contacts_csv() -> String {
    build_csv(
        &(1..=5)
            .map(|i| csv_row(&format!("User{}", i), "Test", &profile_url(&format!("user-{}", i))))
            .collect::<Vec<_>>(),
    )
}

/// 上传并推进到 CONFIRM（无重复）
async fn to_confirm(controller: &ImportWorkflowController, csv: &str) {
    controller.upload_bytes("contacts.csv", csv.as_bytes()).await.unwrap();
    controller.next().await.unwrap();
    controller.select_categories(["cat-1"]).unwrap();
    let session = controller.next().await.unwrap();
    assert_eq!(session.step, WorkflowStep::Confirm);
}

#[tokio::test]
async fn test_no_duplicates_auto_advances_and_commits() {
    let store = Arc::new(MockContactStore::default());
    let controller = controller_with(store.clone(), MockConfig::default());

    let csv = write_csv_file(&five_contacts_csv());
    let session = controller.upload_file(csv.path()).await.unwrap();
    assert_eq!(session.step, WorkflowStep::Upload);
    assert!(session.can_advance());
    assert_eq!(session.parse_result.as_ref().unwrap().valid_rows, 5);

    let session = controller.next().await.unwrap();
    assert_eq!(session.step, WorkflowStep::Preview);
    assert!(!session.can_advance());

    assert!(matches!(
        controller.next().await,
        Err(WorkflowError::NoCategorySelected)
    ));
    assert_eq!(store.snapshot_reads.load(std::sync::atomic::Ordering::SeqCst), 0);

    controller.select_categories(["cat-1"]).unwrap();
    let session = controller.next().await.unwrap();
    assert_eq!(session.step, WorkflowStep::Confirm);
    assert!(session.duplicates.is_empty());

    let summary = controller.summary().unwrap();
    assert_eq!(summary.contact_count, 5);
    assert_eq!(summary.expected_creates, 5);

    let stats = controller.commit().await.unwrap();
    assert_eq!(
        stats,
        ImportStats {
            imported: 5,
            updated: 0,
            skipped: 0
        }
    );
    assert!(controller.snapshot().unwrap().is_done());
    assert_eq!(store.commit_count(), 1);
}

#[tokio::test]
async fn test_precheck_rejects_before_parsing() {
    let store = Arc::new(MockContactStore::default());
    let controller = controller_with(
        store,
        MockConfig {
            max_file_size_bytes: 16,
            ..Default::default()
        },
    );

    let err = controller
        .upload_bytes("contacts.xlsx", b"whatever")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "UNSUPPORTED_FORMAT");

    let err = controller
        .upload_bytes("contacts.csv", five_contacts_csv().as_bytes())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FILE_TOO_LARGE");

    let session = controller.snapshot().unwrap();
    assert!(session.file.is_none());
    assert!(session.parse_result.is_none());
    assert!(!session.in_flight);
    assert!(session.last_error.is_some());
}

#[tokio::test]
async fn test_zero_valid_contacts_blocks_with_report() {
    let store = Arc::new(MockContactStore::default());
    let controller = controller_with(store, MockConfig::default());

    let csv = build_csv(&[
        csv_row("", "Doe", &profile_url("x")),
        csv_row("Ann", "Lee", "not-a-url"),
    ]);
    let session = controller
        .upload_bytes("contacts.csv", csv.as_bytes())
        .await
        .unwrap();
    assert!(!session.can_advance());

    assert!(matches!(
        controller.next().await,
        Err(WorkflowError::NoValidContacts)
    ));

    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("errors.txt");
    controller.export_error_report(&report_path).await.unwrap();
    let report = std::fs::read_to_string(&report_path).unwrap();
    assert_eq!(
        report,
        "Row 1: Missing required fields (First Name, Last Name, or URL)\nRow 2: Invalid LinkedIn URL format"
    );
}

#[tokio::test]
async fn test_duplicate_check_blocks_until_resolved() {
    let store = Arc::new(MockContactStore::with_existing(vec![
        existing_ref("c1", "Someone", "Else", &profile_url("user-1")),
        existing_ref("c2", "user2", "TEST", &profile_url("other")),
    ]));
    let controller = controller_with(store.clone(), MockConfig::default());

    controller
        .upload_bytes("contacts.csv", five_contacts_csv().as_bytes())
        .await
        .unwrap();
    controller.next().await.unwrap();
    controller.select_categories(["cat-1"]).unwrap();

    let session = controller.next().await.unwrap();
    assert_eq!(session.step, WorkflowStep::DuplicateCheck);
    assert_eq!(session.duplicates.len(), 2);

    assert!(matches!(
        controller.next().await,
        Err(WorkflowError::DuplicatesUnresolved { count: 2 })
    ));
    assert!(matches!(
        controller.resolve_duplicates(["c9"]),
        Err(WorkflowError::UnknownOverwriteTarget(_))
    ));

    let session = controller.resolve_duplicates(["c1"]).unwrap();
    assert_eq!(session.step, WorkflowStep::Confirm);

    let summary = controller.summary().unwrap();
    assert_eq!(
        (summary.expected_creates, summary.expected_updates, summary.expected_skips),
        (3, 1, 1)
    );

    let stats = controller.commit().await.unwrap();
    assert_eq!(
        stats,
        ImportStats {
            imported: 3,
            updated: 1,
            skipped: 1
        }
    );
    let request = store.requests.lock().unwrap()[0].clone();
    assert_eq!(request.overwrite_ids, vec!["c1"]);
    assert_eq!(request.category_ids, vec!["cat-1"]);
}

#[tokio::test]
async fn test_back_navigation_and_reupload() {
    let store = Arc::new(MockContactStore::with_existing(vec![existing_ref(
        "c1",
        "User1",
        "Test",
        &profile_url("someone"),
    )]));
    let controller = controller_with(store, MockConfig::default());

    controller
        .upload_bytes("contacts.csv", five_contacts_csv().as_bytes())
        .await
        .unwrap();
    controller.next().await.unwrap();
    controller.select_categories(["cat-1"]).unwrap();
    assert_eq!(controller.next().await.unwrap().step, WorkflowStep::DuplicateCheck);

    let session = controller.back().unwrap();
    assert_eq!(session.step, WorkflowStep::Preview);
    assert!(session.duplicates.is_empty());

    let session = controller.back().unwrap();
    assert_eq!(session.step, WorkflowStep::Upload);

    // 重新上传替换之前的文件与结果
    let csv = build_csv(&[csv_row("Solo", "Person", &profile_url("solo"))]);
    let session = controller
        .upload_bytes("other.CSV", csv.as_bytes())
        .await
        .unwrap();
    assert_eq!(session.file.as_ref().unwrap().file_name, "other.CSV");
    assert_eq!(session.parse_result.as_ref().unwrap().valid_rows, 1);
    assert!(session.category_ids.is_empty());

    assert!(matches!(
        controller.back(),
        Err(WorkflowError::InvalidStateTransition { .. })
    ));
}

#[tokio::test]
async fn test_cancel_requires_confirmation_once_progress_exists() {
    let store = Arc::new(MockContactStore::default());
    let controller = controller_with(store, MockConfig::default());

    // 无进度：直接丢弃
    assert_eq!(controller.cancel().unwrap(), CancelOutcome::Discarded);

    controller
        .upload_bytes("contacts.csv", five_contacts_csv().as_bytes())
        .await
        .unwrap();
    let original_id = controller.snapshot().unwrap().session_id;

    match controller.cancel().unwrap() {
        CancelOutcome::ConfirmationRequired { prompt } => assert!(!prompt.is_empty()),
        other => panic!("unexpected cancel outcome: {:?}", other),
    }

    // 放弃取消：进度保留
    let session = controller.dismiss_cancel().unwrap();
    assert!(session.file.is_some());
    assert_eq!(session.session_id, original_id);

    controller.cancel().unwrap();
    let session = controller.confirm_cancel().unwrap();
    assert!(session.file.is_none());
    assert!(session.parse_result.is_none());
    assert_ne!(session.session_id, original_id);
}

#[tokio::test]
async fn test_cancel_while_parsing_requires_confirmation_and_discards_result() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let store = Arc::new(MockContactStore::default());
    let controller = ImportWorkflowController::with_components(
        store.clone(),
        store,
        Arc::new(MockConfig::default()),
        Box::new(GatedImporter::new(entered.clone(), release.clone())),
        Box::new(DuplicateMatcherImpl),
    );
    let file = write_csv_file(&five_contacts_csv());
    let original_id = controller.snapshot().unwrap().session_id;

    let (upload_result, outcome) = tokio::join!(controller.upload_file(file.path()), async {
        entered.notified().await;
        let session = controller.snapshot().unwrap();
        assert!(session.in_flight);
        assert!(session.file.is_some());

        let outcome = controller.cancel().unwrap();
        controller.confirm_cancel().unwrap();
        release.notify_one();
        outcome
    });

    assert!(matches!(outcome, CancelOutcome::ConfirmationRequired { .. }));
    assert!(matches!(upload_result, Err(WorkflowError::SessionSuperseded)));

    let session = controller.snapshot().unwrap();
    assert_ne!(session.session_id, original_id);
    assert_eq!(session.step, WorkflowStep::Upload);
    assert!(session.file.is_none());
    assert!(session.parse_result.is_none());
    assert!(!session.in_flight);
}

#[tokio::test]
async fn test_late_duplicate_check_result_discarded_after_cancel() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let store = Arc::new(
        MockContactStore::with_existing(vec![existing_ref(
            "c-1",
            "User1",
            "Test",
            &profile_url("user-1"),
        )])
        .with_snapshot_gate(entered.clone(), release.clone()),
    );
    let controller = controller_with(store.clone(), MockConfig::default());
    controller
        .upload_bytes("contacts.csv", five_contacts_csv().as_bytes())
        .await
        .unwrap();
    controller.next().await.unwrap();
    controller.select_categories(["cat-1"]).unwrap();

    let (check_result, _) = tokio::join!(controller.next(), async {
        entered.notified().await;
        controller.cancel().unwrap();
        controller.confirm_cancel().unwrap();
        release.notify_one();
    });

    assert!(matches!(check_result, Err(WorkflowError::SessionSuperseded)));
    assert_eq!(store.snapshot_reads.load(std::sync::atomic::Ordering::SeqCst), 1);

    let session = controller.snapshot().unwrap();
    assert_eq!(session.step, WorkflowStep::Upload);
    assert!(session.duplicates.is_empty());
    assert!(session.category_ids.is_empty());
}

#[tokio::test]
async fn test_commit_rejected_while_cancel_pending() {
    let store = Arc::new(MockContactStore::default());
    let controller = controller_with(store.clone(), MockConfig::default());
    to_confirm(&controller, &five_contacts_csv()).await;

    controller.cancel().unwrap();
    assert!(matches!(
        controller.commit().await,
        Err(WorkflowError::CancelPending)
    ));
    assert_eq!(store.commit_count(), 0);

    controller.dismiss_cancel().unwrap();
    assert_eq!(controller.commit().await.unwrap().imported, 5);
}

#[tokio::test]
async fn test_commit_failure_stays_in_confirm_and_retries() {
    let store = Arc::new(MockContactStore::default().fail_next_commits(1));
    let controller = controller_with(store.clone(), MockConfig::default());
    to_confirm(&controller, &five_contacts_csv()).await;

    let err = controller.commit().await.unwrap_err();
    assert_eq!(err.code(), "COMMIT_FAILED");

    let session = controller.snapshot().unwrap();
    assert_eq!(session.step, WorkflowStep::Confirm);
    assert!(!session.in_flight);
    assert!(session.last_error.as_deref().unwrap().contains("simulated failure"));

    let stats = controller.commit().await.unwrap();
    assert_eq!(stats.imported, 5);
    assert_eq!(store.commit_count(), 2);
}

#[tokio::test]
async fn test_second_commit_rejected_while_in_flight() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let store = Arc::new(
        MockContactStore::default().with_commit_gate(entered.clone(), release.clone()),
    );
    let controller = controller_with(store.clone(), MockConfig::default());
    to_confirm(&controller, &five_contacts_csv()).await;

    let (first, second) = tokio::join!(controller.commit(), async {
        entered.notified().await;
        let second = controller.commit().await;
        release.notify_one();
        second
    });

    assert!(first.is_ok());
    assert!(matches!(second, Err(WorkflowError::OperationInProgress)));
    assert_eq!(store.commit_count(), 1);
}

#[tokio::test]
async fn test_late_commit_result_discarded_after_cancel() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let store = Arc::new(
        MockContactStore::default().with_commit_gate(entered.clone(), release.clone()),
    );
    let controller = controller_with(store, MockConfig::default());
    to_confirm(&controller, &five_contacts_csv()).await;

    let (commit_result, _) = tokio::join!(controller.commit(), async {
        entered.notified().await;
        controller.cancel().unwrap();
        controller.confirm_cancel().unwrap();
        release.notify_one();
    });

    assert!(matches!(commit_result, Err(WorkflowError::SessionSuperseded)));
    let session = controller.snapshot().unwrap();
    assert_eq!(session.step, WorkflowStep::Upload);
    assert!(session.stats.is_none());
    assert!(session.file.is_none());
}

#[tokio::test]
async fn test_full_flow_against_sqlite() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();

    // 预置一个已有联系人
    let seed = state.new_import_controller();
    to_confirm(
        &seed,
        &build_csv(&[csv_row("User1", "Test", &profile_url("user-1"))]),
    )
    .await;
    seed.commit().await.unwrap();

    let controller = state.new_import_controller();
    controller
        .upload_bytes("contacts.csv", five_contacts_csv().as_bytes())
        .await
        .unwrap();
    controller.next().await.unwrap();
    controller.select_categories(["cat-1"]).unwrap();
    let session = controller.next().await.unwrap();
    assert_eq!(session.step, WorkflowStep::DuplicateCheck);

    let ids: Vec<String> = session
        .matched_existing_ids()
        .into_iter()
        .map(str::to_string)
        .collect();
    assert_eq!(ids.len(), 1);
    controller.resolve_duplicates(ids).unwrap();

    let stats = controller.commit().await.unwrap();
    assert_eq!(
        stats,
        ImportStats {
            imported: 4,
            updated: 1,
            skipped: 0
        }
    );
    assert_eq!(state.contact_repo.count_contacts().await.unwrap(), 5);
}
