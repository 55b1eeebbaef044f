//! Workspace, overview and remote content requests against a mock backend.

use neura::api::{ApiError, NeuraClient};
use neura::core::content::{ContentSource, RemoteContent};
use neura::core::study_guide::{resolve_images, select_study_guide, OverviewPhase};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn workspace_body() -> serde_json::Value {
    json!({
        "_id": "w1",
        "title": "Graph ML",
        "created_at": "2024-05-01T10:00:00",
        "study_guides": [{
            "_id": "g1",
            "original_filename": "pinsage.pdf",
            "extracted_images": [
                {"filename": "fig1.png", "page_number": 3, "gridfs_id": "img-1"},
                {"filename": "fig2.png", "page_number": 4}
            ],
            "study_guide": [{
                "section_id": "1",
                "section_title": "Introduction",
                "section_overview_description": "Why **graphs**.",
                "subsections": [{
                    "subsection_title": "Motivation",
                    "explanation": "Scale matters.",
                    "associated_image_filenames": ["fig1.png", "fig2.png"]
                }]
            }]
        }]
    })
}

#[tokio::test]
async fn test_get_workspace_bypasses_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workspaces/w1"))
        .and(header("cache-control", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_json(workspace_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = NeuraClient::with_base_url(server.uri()).unwrap();
    let workspace = client.get_workspace("w1").await.unwrap();
    assert_eq!(workspace.title, "Graph ML");

    let guide = select_study_guide(&workspace).unwrap();
    assert_eq!(guide.id, "g1");
    assert_eq!(guide.sections[0].subsections[0].subsection_title, "Motivation");
}

#[tokio::test]
async fn test_loaded_phase_resolves_only_stored_images() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workspaces/w1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(workspace_body()))
        .mount(&server)
        .await;

    let client = NeuraClient::with_base_url(server.uri()).unwrap();
    let phase = OverviewPhase::from_result(client.get_workspace("w1").await);
    let OverviewPhase::Loaded { workspace_title, guide } = phase else {
        panic!("expected loaded phase");
    };
    assert_eq!(workspace_title, "Graph ML");

    let names = &guide.sections[0].subsections[0].associated_image_filenames;
    let images = resolve_images(&server.uri(), &guide, names);
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].filename, "fig1.png");
    assert_eq!(images[0].page_number, Some(3));
    assert_eq!(images[0].url, format!("{}/api/files/gridfs/img-1", server.uri()));
}

#[tokio::test]
async fn test_missing_workspace_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workspaces/nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = NeuraClient::with_base_url(server.uri()).unwrap();
    let result = client.get_workspace("nope").await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
    assert_eq!(
        OverviewPhase::from_result(result),
        OverviewPhase::Error("Workspace not found".to_string())
    );
}

#[tokio::test]
async fn test_workspace_without_guides_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workspaces/w2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"_id": "w2", "title": "Fresh"})),
        )
        .mount(&server)
        .await;

    let client = NeuraClient::with_base_url(server.uri()).unwrap();
    let phase = OverviewPhase::from_result(client.get_workspace("w2").await);
    assert_eq!(
        phase,
        OverviewPhase::Empty {
            workspace_title: "Fresh".to_string()
        }
    );
}

#[tokio::test]
async fn test_server_error_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workspaces/w1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let client = NeuraClient::with_base_url(server.uri()).unwrap();
    let err = client.get_workspace("w1").await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 503, .. }));
}

#[tokio::test]
async fn test_list_and_create_workspaces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workspaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "w1", "title": "Graph ML", "created_at": "2024-05-01T10:00:00"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/workspaces"))
        .and(body_json(json!({"title": "Biology"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"_id": "w9", "title": "Biology"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = NeuraClient::with_base_url(server.uri()).unwrap();
    let listed = client.list_workspaces().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "w1");

    let created = client.create_workspace("  Biology ").await.unwrap();
    assert_eq!(created.id, "w9");
}

#[tokio::test]
async fn test_remote_content_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workspaces/w1/quiz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "q1",
            "question": "What does PinSage sample?",
            "options": ["Pixels", "Neighborhoods"],
            "correctAnswer": 1,
            "sectionId": "1"
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/workspaces/w1/faq"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"question": "What is a GCN?", "answer": "A graph convolutional network."}
        ])))
        .mount(&server)
        .await;

    let source = RemoteContent::new(NeuraClient::with_base_url(server.uri()).unwrap());
    let quiz = source.quiz("w1").await.unwrap();
    assert_eq!(quiz[0].correct_answer, 1);
    assert_eq!(quiz[0].section_id, "1");

    let faq = source.faq("w1").await.unwrap();
    assert_eq!(faq[0].question, "What is a GCN?");

    assert!(matches!(source.faq("  ").await, Err(ApiError::Configuration(_))));
}
