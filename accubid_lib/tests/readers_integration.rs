use accubid_lib::{
    ApiClient, CancellationToken, ConnectorConfig, DataObject, DataReader, ReaderError,
    RequestParameters,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reader_for(server: &MockServer) -> DataReader {
    let mut config = ConnectorConfig::default();
    config.base_url = Some(server.uri());
    config.api_client.max_retries = 0;
    config.auth.access_token = Some("test-token".into());
    let client: ApiClient = config.build_client().unwrap();
    DataReader::new(client)
}

// ============================================================================
// Parameter Validation
// ============================================================================

#[tokio::test]
async fn missing_required_param_yields_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "x"}])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let reader = reader_for(&mock_server);
    let params = RequestParameters::new().with("databaseToken", "db-1");
    let records = reader
        .read(DataObject::Contracts, &params, &CancellationToken::new())
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn invalid_date_yields_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let reader = reader_for(&mock_server);
    let params = RequestParameters::new()
        .with("databaseToken", "db-1")
        .with("startDate", "01/01/2024")
        .with("endDate", "20241231");
    let records = reader
        .read(DataObject::EstimatesByDueDate, &params, &CancellationToken::new())
        .await
        .unwrap();
    assert!(records.is_empty());
}

// ============================================================================
// List Readers
// ============================================================================

#[tokio::test]
async fn contracts_are_stamped_with_project_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/anywhere/changeorder/v1/Contracts/db-1/P-1001"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(include_str!("fixtures/contracts.json")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let reader = reader_for(&mock_server);
    let params = RequestParameters::new()
        .with("databaseToken", "db-1")
        .with("projectId", "P-1001");
    let records = reader
        .read(DataObject::Contracts, &params, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["id"], "C-2001");
    assert!(records.iter().all(|r| r["projectId"] == "P-1001"));
}

#[tokio::test]
async fn quote_labels_are_stamped_with_contract_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/anywhere/changeorder/v1/ContractQuoteLabels/db-1/C-2001"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"label": "Base"}, null, {"label": "Alt 1"}])),
        )
        .mount(&mock_server)
        .await;

    let reader = reader_for(&mock_server);
    let params = RequestParameters::new()
        .with("databaseToken", "db-1")
        .with("contractId", "C-2001");
    let records = reader
        .read(
            DataObject::ContractQuoteLabels,
            &params,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        records,
        vec![
            json!({"label": "Base", "contractId": "C-2001"}),
            json!({"label": "Alt 1", "contractId": "C-2001"}),
        ]
    );
}

#[tokio::test]
async fn estimates_by_due_date_stamp_both_dates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/anywhere/estimate/v1/EstimatesByDueDate/db-1/20240101/20241231",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"estimateId": "E-1"}])))
        .mount(&mock_server)
        .await;

    let reader = reader_for(&mock_server);
    let params = RequestParameters::new()
        .with("databaseToken", "db-1")
        .with("startDate", "20240101")
        .with("endDate", "20241231");
    let records = reader
        .read(DataObject::EstimatesByDueDate, &params, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        records,
        vec![json!({"estimateId": "E-1", "startDate": "20240101", "endDate": "20241231"})]
    );
}

#[tokio::test]
async fn databases_need_no_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/anywhere/database/v1/Databases"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"token": "db-1", "databaseName": "Main", "companyName": "Acme"}])),
        )
        .mount(&mock_server)
        .await;

    let reader = reader_for(&mock_server);
    let records = reader
        .read(
            DataObject::Databases,
            &RequestParameters::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["token"], "db-1");
}

// ============================================================================
// Single-Object Readers
// ============================================================================

#[tokio::test]
async fn final_price_is_stamped_with_bid_summary() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/anywhere/closeout/v1/FinalPrice/db-1/B-77"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(include_str!("fixtures/final_price.json")),
        )
        .mount(&mock_server)
        .await;

    let reader = reader_for(&mock_server);
    let params = RequestParameters::new()
        .with("databaseToken", "db-1")
        .with("bidSummaryId", "B-77");
    let records = reader
        .read(DataObject::FinalPrice, &params, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["bidSummaryId"], "B-77");
    assert_eq!(records[0]["bidSummaryName"], "Base Bid");
}

#[tokio::test]
async fn project_reader_reads_id_param() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/anywhere/project/v1/Project/db-1/P-1001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"projectId": "P-1001"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let reader = reader_for(&mock_server);
    let params = RequestParameters::new()
        .with("databaseToken", "db-1")
        .with("id", "P-1001");
    let records = reader
        .read(DataObject::Project, &params, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(records, vec![json!({"projectId": "P-1001"})]);
}

#[tokio::test]
async fn notification_test_is_reshaped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/anywhere/estimate/v1/NotificationTest/conn-9"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(include_str!("fixtures/notification_test.json")),
        )
        .mount(&mock_server)
        .await;

    let reader = reader_for(&mock_server);
    let params = RequestParameters::new().with("connectionId", "conn-9");
    let records = reader
        .read(DataObject::NotificationTest, &params, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        records,
        vec![json!({
            "connectionId": "conn-9",
            "fileUrl": "https://files.example.com/notify/abc123.json"
        })]
    );
}

#[tokio::test]
async fn extension_item_details_uses_optional_bid_summary() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/anywhere/estimate/v1/ExtensionItemDetailsFileSignalR/db-1/E-1/B-2/conn-1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"queued": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let reader = reader_for(&mock_server);
    let params = RequestParameters::new()
        .with("databaseToken", "db-1")
        .with("estimateId", "E-1")
        .with("connectionId", "conn-1")
        .with("bidSummaryId", "B-2");
    let records = reader
        .read(
            DataObject::ExtensionItemDetailsFileSignalR,
            &params,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(records, vec![json!({"queued": true})]);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn non_success_status_is_a_reader_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/anywhere/changeorder/v1/PCOs/db-1/C-1"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"code": "NOT_FOUND", "message": "Contract not found"})),
        )
        .mount(&mock_server)
        .await;

    let reader = reader_for(&mock_server);
    let params = RequestParameters::new()
        .with("databaseToken", "db-1")
        .with("contractId", "C-1");
    let err = reader
        .read(DataObject::Pcos, &params, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.to_string(), "Failed to retrieve PCOs. API StatusCode: 404");
    match err {
        ReaderError::Status { details, .. } => {
            assert_eq!(details.and_then(|d| d.code).as_deref(), Some("NOT_FOUND"));
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn empty_list_is_not_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/anywhere/project/v1/LastProjects/db-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let reader = reader_for(&mock_server);
    let params = RequestParameters::new().with("databaseToken", "db-1");
    let records = reader
        .read(DataObject::LastProjects, &params, &CancellationToken::new())
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn cancellation_surfaces_as_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let reader = reader_for(&mock_server);
    let params = RequestParameters::new().with("databaseToken", "db-1");
    let result = reader.read(DataObject::Projects, &params, &cancel).await;
    assert!(matches!(
        result,
        Err(ReaderError::Api(accubid_lib::accubid_api::Error::Cancelled))
    ));
}
