mod support;

use std::sync::{Arc, Mutex};

use support::{FakeApi, chart, csv_file, project_file};
use tabula_application::flows::create_project;
use tabula_application::{
    AuthFlow, ChatFlow, DataService, FileAnalysisFlow, ProjectFlow, QuickAnalysisFlow,
};
use tabula_core::analysis::{AnalysisStage, SelectedFile};
use tabula_core::auth::{Route, RouteDecision, StoredToken, TokenStore};
use tabula_core::cache::QueryKey;
use tabula_core::chat::{MessageRole, QueryAnswer};
use tabula_core::compare::{ComparisonType, JoinType};
use tabula_core::config::{CacheSettings, UploadPolicy};
use tabula_core::project::ProjectDraft;
use tabula_core::store::{AppStore, Session};
use tabula_core::wizard::Navigation;
use tabula_core::TabulaError;
use tabula_infrastructure::MemoryTokenStore;

fn setup() -> (Arc<FakeApi>, Arc<DataService>) {
    let api = Arc::new(FakeApi::new());
    let data = Arc::new(DataService::new(api.clone(), CacheSettings::default()));
    (api, data)
}

// ============================================================================
// Quick analysis
// ============================================================================

#[tokio::test]
async fn test_quick_analysis_visits_stages_in_order() {
    let (api, data) = setup();
    let stages = Arc::new(Mutex::new(Vec::new()));
    let recorder = stages.clone();

    let flow = QuickAnalysisFlow::new(data, UploadPolicy::default()).with_stage_callback(Arc::new(
        move |stage| recorder.lock().unwrap().push(stage),
    ));
    let mut updates = flow.subscribe();

    flow.select_file(csv_file("sales.csv", 10 * 1024)).unwrap();
    assert!(flow.state().analysis_result().is_none());

    let result = flow.run().await.unwrap();
    assert_eq!(result.charts.len(), 1);

    assert_eq!(
        *stages.lock().unwrap(),
        vec![
            AnalysisStage::Uploading,
            AnalysisStage::Processing,
            AnalysisStage::Analyzing,
            AnalysisStage::Complete,
        ]
    );
    assert_eq!(api.calls(), vec!["upload", "analyze_upload:up-1"]);

    let state = flow.state();
    assert_eq!(state.stage(), AnalysisStage::Complete);
    assert!(state.analysis_result().is_some());
    assert_eq!(state.upload_result().unwrap().id, "up-1");
    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().stage(), AnalysisStage::Complete);
}

#[tokio::test]
async fn test_rejected_file_makes_no_call_and_keeps_selection() {
    let (api, data) = setup();
    let flow = QuickAnalysisFlow::new(data, UploadPolicy::default());

    flow.select_file(csv_file("sales.csv", 2048)).unwrap();

    let pdf = SelectedFile::new("report.pdf", Some("application/pdf".into()), vec![1; 100]);
    assert!(flow.select_file(pdf).unwrap_err().is_validation());

    let oversize = csv_file("huge.csv", (UploadPolicy::default().max_size_bytes + 1) as usize);
    assert!(flow.select_file(oversize).unwrap_err().is_validation());

    let state = flow.state();
    assert_eq!(state.selected_file().unwrap().name, "sales.csv");
    assert!(state.validation_error().is_some());
    assert_eq!(state.stage(), AnalysisStage::Idle);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_opaque_analyze_failure_uses_fallback_message() {
    let (api, data) = setup();
    api.fail_analyze(TabulaError::Opaque("model exploded".into()));
    let flow = QuickAnalysisFlow::new(data, UploadPolicy::default());

    flow.select_file(csv_file("sales.csv", 512)).unwrap();
    let err = flow.run().await.unwrap_err();
    assert_eq!(err, TabulaError::Opaque("model exploded".into()));

    let state = flow.state();
    assert_eq!(state.stage(), AnalysisStage::Error);
    assert_eq!(state.error(), Some("Failed to analyze file"));
    assert!(state.analysis_result().is_none());

    // No automatic retry: the user resets and starts over.
    assert_eq!(api.calls().len(), 2);
    flow.reset().unwrap();
    assert_eq!(flow.state().stage(), AnalysisStage::Idle);
}

#[tokio::test]
async fn test_upload_failure_surfaces_server_detail() {
    let (api, data) = setup();
    api.fail_upload(TabulaError::http(400, "File has no header row"));
    let flow = QuickAnalysisFlow::new(data, UploadPolicy::default());

    flow.select_file(csv_file("sales.csv", 512)).unwrap();
    assert!(flow.run().await.is_err());

    assert_eq!(flow.state().error(), Some("File has no header row"));
    assert_eq!(api.calls(), vec!["upload"]);
}

#[tokio::test]
async fn test_cancelled_flow_returns_to_idle_with_file_kept() {
    let (api, data) = setup();
    let flow = QuickAnalysisFlow::new(data, UploadPolicy::default());
    flow.select_file(csv_file("sales.csv", 512)).unwrap();
    let mut stages = flow.subscribe();

    drop(flow.drop_guard());
    let err = flow.run().await.unwrap_err();
    assert!(err.is_cancelled());

    let state = flow.state();
    assert_eq!(state.stage(), AnalysisStage::Idle);
    assert!(state.error().is_none());
    assert_eq!(
        state.selected_file().map(|f| f.name.as_str()),
        Some("sales.csv")
    );
    assert!(api.calls().is_empty());

    // Watchers see the flow settle instead of staying on a busy stage.
    assert!(stages.has_changed().unwrap());
    assert!(!stages.borrow_and_update().stage().is_busy());

    flow.reset().unwrap();
    assert!(flow.state().selected_file().is_none());
}

// ============================================================================
// Project file analysis
// ============================================================================

#[tokio::test]
async fn test_file_analysis_uploads_then_analyzes_and_invalidates() {
    let (api, data) = setup();
    let before = data.project_files(1).await.unwrap();
    assert!(before.is_empty());

    let flow = FileAnalysisFlow::new(1, data.clone(), UploadPolicy::default());
    flow.select_file(csv_file("march.csv", 4096)).unwrap();
    flow.set_intent(Some("find seasonality".into())).unwrap();

    let (stored, result) = flow.run().await.unwrap();
    assert_eq!(stored.filename, "march.csv");
    assert_eq!(result.analysis_id, Some(5));

    assert_eq!(
        data.cache().is_stale(&QueryKey::project_files(1)).await,
        Some(true)
    );
    let after = data.project_files(1).await.unwrap();
    assert_eq!(after.len(), 1);

    assert_eq!(
        api.calls(),
        vec![
            "list_files:1",
            "upload_project_file:1",
            "analyze_file:1:21:find seasonality",
            "list_files:1",
        ]
    );
}

#[tokio::test]
async fn test_reanalyze_skips_upload() {
    let (api, data) = setup();
    let flow = FileAnalysisFlow::new(1, data, UploadPolicy::default());
    let file = project_file(3, &["month", "revenue"]);

    flow.reanalyze(&file, Some("compare quarters".into()))
        .await
        .unwrap();
    flow.reanalyze(&file, Some("look for outliers".into()))
        .await
        .unwrap();

    assert_eq!(
        api.calls(),
        vec![
            "analyze_file:1:3:compare quarters",
            "analyze_file:1:3:look for outliers",
        ]
    );
    assert_eq!(flow.state().stage(), AnalysisStage::Complete);

    let insight = flow.chart_insight(&chart(), Some(3)).await.unwrap();
    assert_eq!(insight, "Revenue by month peaks in December");
    assert_eq!(flow.state().stage(), AnalysisStage::Complete);
}

// ============================================================================
// Chat
// ============================================================================

#[tokio::test]
async fn test_chat_echoes_conversation_id_after_first_answer() {
    let (api, data) = setup();
    api.push_query_result(Ok(QueryAnswer {
        answer: "December".into(),
        conversation_id: "conv-1".into(),
        chart: None,
    }));
    api.push_query_result(Ok(QueryAnswer {
        answer: "About 12%".into(),
        conversation_id: "conv-1".into(),
        chart: Some(chart()),
    }));

    let flow = ChatFlow::new(7, data);
    flow.send("Which month sold most?").await.unwrap();
    let reply = flow.send("By how much?").await.unwrap().unwrap();
    assert_eq!(reply.content, "About 12%");
    assert!(reply.chart.is_some());

    let requests = api.query_requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].file_id, 7);
    assert_eq!(requests[0].conversation_id, None);
    assert_eq!(requests[1].conversation_id.as_deref(), Some("conv-1"));
    assert_eq!(flow.messages().len(), 4);
}

#[tokio::test]
async fn test_chat_failure_becomes_assistant_message() {
    let (api, data) = setup();
    api.push_query_result(Err(TabulaError::http(503, "Model is warming up")));

    let flow = ChatFlow::new(7, data);
    let reply = flow.send("Any trends?").await.unwrap().unwrap();

    assert_eq!(reply.role, MessageRole::Assistant);
    assert!(reply.is_error);
    assert_eq!(reply.content, "Sorry, I couldn't answer that: Model is warming up");
    assert_eq!(flow.conversation().conversation_id(), None);
}

#[tokio::test]
async fn test_resumed_chat_keeps_conversation_after_cancel() {
    let (api, data) = setup();
    api.push_query_result(Ok(QueryAnswer {
        answer: "December".into(),
        conversation_id: "conv-9".into(),
        chart: None,
    }));
    api.push_query_result(Ok(QueryAnswer {
        answer: "Yes".into(),
        conversation_id: "conv-9".into(),
        chart: None,
    }));

    let flow = ChatFlow::new(7, data.clone());
    flow.send("Which month sold most?").await.unwrap();
    flow.cancel();
    assert!(matches!(
        flow.send("Ignored?").await,
        Err(TabulaError::Cancelled)
    ));

    let resumed = ChatFlow::resume(flow.conversation(), data);
    resumed.send("Is that unusual?").await.unwrap();

    let requests = api.query_requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].conversation_id.as_deref(), Some("conv-9"));
}

#[tokio::test]
async fn test_blank_chat_question_is_ignored() {
    let (api, data) = setup();
    let flow = ChatFlow::new(7, data);

    assert_eq!(flow.send("   ").await.unwrap(), None);
    assert!(flow.messages().is_empty());
    assert!(api.calls().is_empty());
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_login_stores_token_and_signs_in() {
    let (_api, data) = setup();
    let tokens = Arc::new(MemoryTokenStore::new());
    let store = Arc::new(AppStore::default());
    let flow = AuthFlow::new(data, tokens.clone(), store.clone());

    let session = flow.login("ana@example.com", "correct horse").await.unwrap();
    assert!(session.is_signed_in());
    assert_eq!(session.user().unwrap().email, "ana@example.com");
    assert_eq!(tokens.load().await.unwrap().unwrap().access_token, "login-token");
    assert!(store.snapshot().session.is_signed_in());
}

#[tokio::test]
async fn test_failed_login_keeps_signed_out() {
    let (_api, data) = setup();
    let tokens = Arc::new(MemoryTokenStore::new());
    let store = Arc::new(AppStore::default());
    let flow = AuthFlow::new(data, tokens.clone(), store.clone());

    let err = flow.login("ana@example.com", "wrong").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(tokens.load().await.unwrap().is_none());
    assert_eq!(store.snapshot().session, Session::SignedOut);

    assert!(flow.login("", "x").await.unwrap_err().is_validation());
}

#[tokio::test]
async fn test_logout_then_protected_route_redirects() {
    let (_api, data) = setup();
    let tokens = Arc::new(MemoryTokenStore::with_token(StoredToken::new("opaque-token")));
    let store = Arc::new(AppStore::default());
    let flow = AuthFlow::new(data.clone(), tokens.clone(), store.clone());

    assert_eq!(
        flow.resolve(Route::Dashboard).await,
        RouteDecision::Allow(Route::Dashboard)
    );
    data.projects().await.unwrap();

    flow.logout().await.unwrap();

    assert!(tokens.load().await.unwrap().is_none());
    assert_eq!(store.snapshot().session, Session::SignedOut);
    assert_eq!(data.cache().is_stale(&QueryKey::projects()).await, Some(true));
    assert_eq!(
        flow.resolve(Route::Dashboard).await,
        RouteDecision::Redirect(Route::Login)
    );
    assert_eq!(
        flow.resolve(Route::Login).await,
        RouteDecision::Allow(Route::Login)
    );
}

#[tokio::test]
async fn test_restore_loads_current_user() {
    let (_api, data) = setup();
    let tokens = Arc::new(MemoryTokenStore::with_token(StoredToken::new("opaque-token")));
    let store = Arc::new(AppStore::default());
    let flow = AuthFlow::new(data, tokens, store.clone());

    let session = flow.restore().await.unwrap();
    assert_eq!(session.user().unwrap().name.as_deref(), Some("Ana"));
    assert_eq!(store.snapshot().session, session);
}

// ============================================================================
// Projects, comparison and merge
// ============================================================================

#[tokio::test]
async fn test_failed_mutation_invalidates_nothing() {
    let (api, data) = setup();
    data.projects().await.unwrap();

    api.fail_create_project(TabulaError::http(409, "Name taken"));
    let draft = ProjectDraft {
        name: "Sales".into(),
        description: None,
    };
    assert!(create_project(&data, &draft).await.is_err());
    assert_eq!(data.cache().is_stale(&QueryKey::projects()).await, Some(false));

    create_project(&data, &draft).await.unwrap();
    assert_eq!(data.cache().is_stale(&QueryKey::projects()).await, Some(true));

    // Mutations are never retried.
    let creates = api
        .calls()
        .iter()
        .filter(|c| c.as_str() == "create_project")
        .count();
    assert_eq!(creates, 2);
}

#[tokio::test]
async fn test_project_load_reads_metadata_and_files() {
    let (api, data) = setup();
    api.set_files(vec![project_file(1, &["id"]), project_file(2, &["id"])]);
    let flow = ProjectFlow::new(1, data, UploadPolicy::default()).unwrap();

    let detail = flow.load().await.unwrap();
    assert_eq!(detail.project.file_count, 2);
    assert_eq!(detail.files.len(), 2);
    assert!(detail.file(2).is_some());

    let mut calls = api.calls();
    calls.sort();
    assert_eq!(calls, vec!["get_project:1", "list_files:1"]);

    // Second load is served from cache.
    flow.load().await.unwrap();
    assert_eq!(api.calls().len(), 2);
}

#[tokio::test]
async fn test_comparison_wizard_runs_comparison() {
    let (api, data) = setup();
    let flow = ProjectFlow::new(1, data, UploadPolicy::default()).unwrap();
    let wizard = flow.comparison_wizard();

    assert_eq!(wizard.next().await, Navigation::Blocked);
    wizard
        .update_answers(|a| {
            a.files.file_a = Some(project_file(1, &["id", "name"]));
            a.files.file_b = Some(project_file(2, &["id", "email"]));
        })
        .await;
    assert_eq!(wizard.next().await, Navigation::Moved { to: 1 });
    assert_eq!(wizard.next().await, Navigation::Blocked);
    wizard
        .update_answers(|a| a.comparison_type = Some(ComparisonType::Schema))
        .await;
    assert_eq!(wizard.next().await, Navigation::Moved { to: 2 });

    let result = flow.run_comparison().await.unwrap().unwrap();
    assert_eq!(result.summary, "Schemas overlap on 1 column");
    assert_eq!(api.calls(), vec!["compare_files:1:1:2:schema"]);
    assert!(!wizard.is_submitting());
}

#[tokio::test]
async fn test_merge_without_common_columns_cannot_configure() {
    let (api, data) = setup();
    let flow = ProjectFlow::new(1, data, UploadPolicy::default()).unwrap();
    let wizard = flow.merge_wizard();

    wizard
        .update_answers(|a| {
            a.set_file_a(project_file(1, &["id", "name"]));
            a.set_file_b(project_file(2, &["sku", "qty"]));
        })
        .await;
    assert!(wizard.answers().await.selectable_join_keys().is_empty());

    assert_eq!(wizard.next().await, Navigation::Moved { to: 1 });
    wizard
        .update_answers(|a| a.join_key = Some("id".into()))
        .await;
    assert_eq!(wizard.next().await, Navigation::Blocked);
    assert_eq!(wizard.current_step_index().await, 1);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_merge_creates_relationship_before_merging() {
    let (api, data) = setup();
    let flow = ProjectFlow::new(1, data.clone(), UploadPolicy::default()).unwrap();
    let wizard = flow.merge_wizard();

    wizard
        .update_answers(|a| {
            a.set_file_a(project_file(1, &["customer_id", "name"]));
            a.set_file_b(project_file(2, &["customer_id", "total"]));
            a.join_type = JoinType::Left;
        })
        .await;
    assert_eq!(wizard.next().await, Navigation::Moved { to: 1 });
    wizard
        .update_answers(|a| a.join_key = Some("customer_id".into()))
        .await;
    assert_eq!(wizard.next().await, Navigation::Moved { to: 2 });

    let merged = flow.run_merge().await.unwrap().unwrap();
    assert_eq!(merged.row_count, 42);
    assert_eq!(
        api.calls(),
        vec!["create_relationship:1:customer_id", "merge_analyze:1:77"]
    );
}

#[tokio::test]
async fn test_project_upload_validates_before_sending() {
    let (api, data) = setup();
    let flow = ProjectFlow::new(1, data, UploadPolicy::default()).unwrap();

    let empty = SelectedFile::new("blank.csv", None, Vec::new());
    assert!(flow.upload_file(&empty).await.unwrap_err().is_validation());
    assert!(api.calls().is_empty());

    let stored = flow.upload_file(&csv_file("april.csv", 100)).await.unwrap();
    assert_eq!(stored.filename, "april.csv");
}
