//! Integration tests for the Chronicle client using wiremock
//!
//! Each test points a client at a mock server and checks the requests it
//! sends and how responses are accumulated, joined and filtered.

use chrono::{Duration, TimeZone, Utc};
use secops::chronicle::auth::Credentials;
use secops::chronicle::data_export::{self, CreateDataExport, DataExportUpdate};
use secops::chronicle::log_types::{self, LogTypeTable};
use secops::chronicle::names::Precision;
use secops::chronicle::rule_set::{self, DeploymentFilter, DeploymentUpdate};
use secops::chronicle::{ChronicleClient, PageRequest};
use secops::SecOpsError;
use serde_json::{json, Value};
use wiremock::matchers::{
    any, bearer_token, body_json, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INSTANCE: &str = "projects/test-project/locations/us/instances/test-customer";

fn instance_path(suffix: &str) -> String {
    format!("/v1alpha/{INSTANCE}/{suffix}")
}

fn rule_sets_path() -> String {
    instance_path("curatedRuleSetCategories/-/curatedRuleSets")
}

fn deployments_path() -> String {
    instance_path("curatedRuleSetCategories/-/curatedRuleSets/-/curatedRuleSetDeployments")
}

fn deployment_name(category: &str, rule_set_id: &str, precision: &str) -> String {
    format!(
        "{INSTANCE}/curatedRuleSetCategories/{category}/curatedRuleSets/{rule_set_id}\
         /curatedRuleSetDeployments/{precision}"
    )
}

fn client_for(server: &MockServer) -> ChronicleClient {
    ChronicleClient::new(
        "test-project",
        "us",
        "test-customer",
        Credentials::static_token("test-token"),
    )
    .unwrap()
    .with_base_url(&format!("{}/v1alpha", server.uri()))
    .unwrap()
}

fn rule_set_item(id: &str, display_name: &str) -> Value {
    json!({
        "name": format!("{INSTANCE}/curatedRuleSetCategories/cat1/curatedRuleSets/{id}"),
        "displayName": display_name,
    })
}

fn rule_set_page(ids: &[&str], next_page_token: Option<&str>) -> Value {
    let items: Vec<Value> = ids
        .iter()
        .map(|id| rule_set_item(id, &id.to_uppercase()))
        .collect();
    let mut body = json!({ "curatedRuleSets": items });
    if let Some(token) = next_page_token {
        body["nextPageToken"] = json!(token);
    }
    body
}

fn names_of(items: &[Value]) -> Vec<&str> {
    items.iter().filter_map(|i| i["name"].as_str()).collect()
}

/// Mount a rule set page served for `token` (None = first page)
async fn mount_rule_set_page(server: &MockServer, token: Option<&str>, body: Value, hits: u64) {
    let mock = Mock::given(method("GET"))
        .and(path(rule_sets_path()))
        .and(bearer_token("test-token"))
        .and(query_param("pageSize", "1000"));
    let mock = match token {
        Some(t) => mock.and(query_param("pageToken", t)),
        None => mock.and(query_param_is_missing("pageToken")),
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(hits)
        .mount(server)
        .await;
}

/// Listing behaviour shared by every collection
mod pagination_tests {
    use super::*;

    /// Test exhaustive listing requests every page and keeps server order
    #[tokio::test]
    async fn test_exhaustive_listing_follows_every_token_in_order() {
        let server = MockServer::start().await;

        mount_rule_set_page(&server, None, rule_set_page(&["a", "b"], Some("t1")), 1).await;
        mount_rule_set_page(&server, Some("t1"), rule_set_page(&["c"], Some("t2")), 1).await;
        mount_rule_set_page(&server, Some("t2"), rule_set_page(&["d"], None), 1).await;

        let client = client_for(&server);
        let items = rule_set::list_curated_rule_sets(&client, &PageRequest::all())
            .await
            .unwrap();

        let ids: Vec<_> = names_of(&items)
            .into_iter()
            .map(|n| n.rsplit('/').next().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    /// Test single-page mode never follows the continuation token
    #[tokio::test]
    async fn test_single_page_ignores_next_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(rule_sets_path()))
            .and(query_param("pageSize", "2"))
            .and(query_param_is_missing("pageToken"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(rule_set_page(&["a", "b"], Some("t1"))),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(rule_sets_path()))
            .and(query_param("pageToken", "t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rule_set_page(&["c"], None)))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let items = rule_set::list_curated_rule_sets(&client, &PageRequest::single(2, None))
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    /// Test a single page can start from a caller-supplied token
    #[tokio::test]
    async fn test_single_page_resumes_from_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(rule_sets_path()))
            .and(query_param("pageSize", "5"))
            .and(query_param("pageToken", "resume"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rule_set_page(&["z"], None)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = PageRequest::single(5, Some("resume".to_string()));
        let items = rule_set::list_curated_rule_sets(&client, &request)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    /// Test an empty response body ends the listing without error
    #[tokio::test]
    async fn test_empty_body_ends_listing() {
        let server = MockServer::start().await;

        mount_rule_set_page(&server, None, rule_set_page(&["a"], Some("t1")), 1).await;
        mount_rule_set_page(&server, Some("t1"), json!({}), 1).await;

        let client = client_for(&server);
        let items = rule_set::list_curated_rule_sets(&client, &PageRequest::all())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    /// Test a failed page aborts the listing with the status and full body
    #[tokio::test]
    async fn test_failed_page_aborts_listing() {
        let server = MockServer::start().await;

        mount_rule_set_page(&server, None, rule_set_page(&["a"], Some("t1")), 1).await;
        Mock::given(method("GET"))
            .and(path(rule_sets_path()))
            .and(query_param("pageToken", "t1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
            .expect(1)
            .mount(&server)
            .await;
        mount_rule_set_page(&server, Some("t2"), rule_set_page(&[], None), 0).await;

        let client = client_for(&server);
        let err = rule_set::list_curated_rule_sets(&client, &PageRequest::all())
            .await
            .unwrap_err();

        match err {
            SecOpsError::Api {
                status,
                body,
                context,
            } => {
                assert_eq!(status.as_u16(), 500);
                assert!(body.contains("backend exploded"));
                assert_eq!(context, "Failed to list rule sets");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }
}

/// Curated rules and rule set categories
mod curated_rule_tests {
    use super::*;

    fn rule(id: &str, display_name: &str) -> Value {
        json!({
            "name": format!("{INSTANCE}/curatedRules/{id}"),
            "displayName": display_name,
        })
    }

    /// Test listing curated rules walks both pages
    #[tokio::test]
    async fn test_list_curated_rules_walks_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(instance_path("curatedRules")))
            .and(query_param_is_missing("pageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "curatedRules": [rule("ur_1", "Rule One")],
                "nextPageToken": "t1",
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(instance_path("curatedRules")))
            .and(query_param("pageToken", "t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "curatedRules": [rule("ur_2", "Rule Two")],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let rules = rule_set::list_curated_rules(&client, &PageRequest::all())
            .await
            .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1]["displayName"], "Rule Two");
    }

    /// Test a short rule id is expanded under the instance
    #[tokio::test]
    async fn test_get_curated_rule_by_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(instance_path("curatedRules/ur_1")))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rule("ur_1", "Rule One")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let found = rule_set::get_curated_rule(&client, "ur_1").await.unwrap();
        assert_eq!(found["displayName"], "Rule One");
    }

    /// Test display name lookup ignores case and reports a miss as NotFound
    #[tokio::test]
    async fn test_get_curated_rule_by_display_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(instance_path("curatedRules")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "curatedRules": [
                    rule("ur_1", "Suspicious Login"),
                    rule("ur_2", "Impossible Travel"),
                ],
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let found = rule_set::get_curated_rule_by_name(&client, "IMPOSSIBLE travel")
            .await
            .unwrap();
        assert_eq!(found["name"], format!("{INSTANCE}/curatedRules/ur_2"));

        let missing = rule_set::get_curated_rule_by_name(&client, "Unknown Rule").await;
        assert!(matches!(missing, Err(SecOpsError::NotFound(_))));
    }

    /// Test a category is fetched by its qualified name
    #[tokio::test]
    async fn test_get_curated_rule_set_category() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(instance_path("curatedRuleSetCategories/cat1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": format!("{INSTANCE}/curatedRuleSetCategories/cat1"),
                "displayName": "Cloud Security",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let category = rule_set::get_curated_rule_set_category(&client, "cat1")
            .await
            .unwrap();
        assert_eq!(category["displayName"], "Cloud Security");
    }
}

/// Deployments: the display name join, filters and updates
mod rule_set_tests {
    use super::*;

    fn deployment(rule_set_id: &str, precision: &str, enabled: bool, alerting: bool) -> Value {
        json!({
            "name": deployment_name("cat1", rule_set_id, precision),
            "enabled": enabled,
            "alerting": alerting,
        })
    }

    async fn mount_deployments(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(deployments_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "curatedRuleSetDeployments": [
                    deployment("rs1", "precise", true, true),
                    deployment("rs1", "broad", true, false),
                    deployment("rs2", "precise", false, true),
                    deployment("orphan", "precise", true, true),
                ]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(rule_sets_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "curatedRuleSets": [
                    rule_set_item("rs1", "Cloud Threats"),
                    rule_set_item("rs2", "Windows Threats"),
                ]
            })))
            .mount(server)
            .await;
    }

    /// Test every deployment with a known rule set gets its display name
    #[tokio::test]
    async fn test_deployments_get_rule_set_display_names() {
        let server = MockServer::start().await;
        mount_deployments(&server).await;

        let client = client_for(&server);
        let deployments = rule_set::list_curated_rule_set_deployments(
            &client,
            &PageRequest::all(),
            DeploymentFilter::default(),
        )
        .await
        .unwrap();

        assert_eq!(deployments.len(), 4);
        assert_eq!(deployments[0]["displayName"], "Cloud Threats");
        assert_eq!(deployments[1]["displayName"], "Cloud Threats");
        assert_eq!(deployments[2]["displayName"], "Windows Threats");
        assert!(deployments[3].get("displayName").is_none());
    }

    /// Test the enabled and alerting filters combine as a conjunction
    #[tokio::test]
    async fn test_deployment_filters_combine() {
        let server = MockServer::start().await;
        mount_deployments(&server).await;
        let client = client_for(&server);

        let enabled = rule_set::list_curated_rule_set_deployments(
            &client,
            &PageRequest::all(),
            DeploymentFilter {
                only_enabled: true,
                only_alerting: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(enabled.len(), 3);

        let both = rule_set::list_curated_rule_set_deployments(
            &client,
            &PageRequest::all(),
            DeploymentFilter {
                only_enabled: true,
                only_alerting: true,
            },
        )
        .await
        .unwrap();
        assert_eq!(both.len(), 2);
        assert!(both
            .iter()
            .all(|d| d["enabled"] == true && d["alerting"] == true));
    }

    /// Test a deployment can be found through its rule set's display name
    #[tokio::test]
    async fn test_get_deployment_by_display_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(rule_sets_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "curatedRuleSets": [rule_set_item("rs1", "Cloud Threats")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/v1alpha/{}", deployment_name("cat1", "rs1", "broad"))))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(deployment("rs1", "broad", true, false)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let found = rule_set::get_curated_rule_set_deployment_by_name(
            &client,
            "cloud threats",
            Precision::Broad,
        )
        .await
        .unwrap();
        assert_eq!(found["displayName"], "Cloud Threats");
        assert_eq!(found["enabled"], true);

        let missing =
            rule_set::get_curated_rule_set_deployment_by_name(&client, "nope", Precision::Broad)
                .await;
        assert!(matches!(missing, Err(SecOpsError::NotFound(_))));
    }

    /// Test a single update names exactly the changed fields in its mask
    #[tokio::test]
    async fn test_update_deployment_sends_mask() {
        let server = MockServer::start().await;
        let name = deployment_name("cat1", "rs1", "precise");

        Mock::given(method("PATCH"))
            .and(path(format!("/v1alpha/{name}")))
            .and(query_param("update_mask", "enabled,alerting"))
            .and(body_json(json!({"name": name, "enabled": true, "alerting": false})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"name": name, "enabled": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let update =
            DeploymentUpdate::new("cat1", "rs1", Precision::Precise, true).with_alerting(false);
        let response = rule_set::update_curated_rule_set_deployment(&client, &update)
            .await
            .unwrap();
        assert_eq!(response["enabled"], true);
    }

    /// Test a batch is sent as one request with a mask per item
    #[tokio::test]
    async fn test_batch_update_body() {
        let server = MockServer::start().await;
        let parent = format!("{INSTANCE}/curatedRuleSetCategories/-/curatedRuleSets/-");

        Mock::given(method("POST"))
            .and(path(format!("{}:batchUpdate", deployments_path())))
            .and(body_json(json!({
                "parent": parent,
                "requests": [
                    {
                        "curated_rule_set_deployment": {
                            "name": deployment_name("c1", "r1", "precise"),
                            "enabled": true,
                            "alerting": true,
                        },
                        "update_mask": {"paths": ["alerting", "enabled"]},
                    },
                    {
                        "curated_rule_set_deployment": {
                            "name": deployment_name("c2", "r2", "broad"),
                            "enabled": false,
                            "alerting": false,
                        },
                        "update_mask": {"paths": ["alerting", "enabled"]},
                    },
                ],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let updates = vec![
            DeploymentUpdate::new("c1", "r1", Precision::Precise, true).with_alerting(true),
            DeploymentUpdate::new("c2", "r2", Precision::Broad, false),
        ];
        rule_set::batch_update_curated_rule_set_deployments(&client, &updates)
            .await
            .unwrap();
    }

    /// Test a batch with any incomplete item sends no request at all
    #[tokio::test]
    async fn test_invalid_batch_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let updates = vec![
            DeploymentUpdate::new("c1", "r1", Precision::Precise, true),
            DeploymentUpdate {
                category_id: Some("c2".to_string()),
                enabled: Some(true),
                ..Default::default()
            },
        ];

        let err = rule_set::batch_update_curated_rule_set_deployments(&client, &updates)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("rule_set_id"));
        assert!(err.to_string().contains("precision"));

        let empty = rule_set::batch_update_curated_rule_set_deployments(&client, &[]).await;
        assert!(matches!(empty, Err(SecOpsError::Validation(_))));
    }
}

/// Data export lifecycle
mod data_export_tests {
    use super::*;

    fn day_range() -> (chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (start, start + Duration::days(1))
    }

    fn new_export(bucket: &str, log_types: &[&str], export_all_logs: bool) -> CreateDataExport {
        let (start_time, end_time) = day_range();
        CreateDataExport {
            gcs_bucket: bucket.to_string(),
            start_time,
            end_time,
            log_types: log_types.iter().map(|s| s.to_string()).collect(),
            export_all_logs,
        }
    }

    /// Test an export is fetched by its short id
    #[tokio::test]
    async fn test_get_data_export_by_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(instance_path("dataExports/e1")))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": format!("{INSTANCE}/dataExports/e1"),
                "dataExportStatus": {"stage": "PROCESSING"},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let fetched = data_export::get_data_export(&client, "e1").await.unwrap();
        assert_eq!(
            data_export::DataExportStage::of(&fetched),
            Some(data_export::DataExportStage::Processing)
        );
    }

    /// Test every malformed create request is rejected before sending
    #[tokio::test]
    async fn test_invalid_create_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (start, end) = day_range();
        let reversed = CreateDataExport {
            start_time: end,
            end_time: start,
            ..new_export("projects/p/buckets/b", &["OKTA"], false)
        };
        let cases = [
            new_export("my-bucket", &["OKTA"], false),
            reversed,
            new_export("projects/p/buckets/b", &[], false),
            new_export("projects/p/buckets/b", &["OKTA"], true),
        ];

        for request in &cases {
            let err = data_export::create_data_export(&client, request)
                .await
                .unwrap_err();
            assert!(err.is_validation(), "expected validation error, got {err:?}");
        }
    }

    /// Test short log type ids are qualified in the create payload
    #[tokio::test]
    async fn test_create_posts_qualified_log_types() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(instance_path("dataExports")))
            .and(body_json(json!({
                "startTime": "2024-01-01T00:00:00.000000Z",
                "endTime": "2024-01-02T00:00:00.000000Z",
                "gcsBucket": "projects/p/buckets/b",
                "includeLogTypes": [format!("{INSTANCE}/logTypes/OKTA")],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": format!("{INSTANCE}/dataExports/e1"),
                "dataExportStatus": {"stage": "IN_QUEUE"},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = new_export("projects/p/buckets/b", &["OKTA"], false);
        let created = data_export::create_data_export(&client, &request)
            .await
            .unwrap();
        assert_eq!(
            data_export::DataExportStage::of(&created),
            Some(data_export::DataExportStage::InQueue)
        );
    }

    /// Test the update mask names only the fields that were given
    #[tokio::test]
    async fn test_update_mask_names_only_given_fields() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path(instance_path("dataExports/e1")))
            .and(query_param("update_mask", "endTime,gcsBucket"))
            .and(body_json(json!({
                "endTime": "2024-01-02T00:00:00.000000Z",
                "gcsBucket": "projects/p/buckets/other",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "e1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (_, end) = day_range();
        let update = DataExportUpdate {
            end_time: Some(end),
            gcs_bucket: Some("projects/p/buckets/other".to_string()),
            ..Default::default()
        };
        data_export::update_data_export(&client, "e1", &update)
            .await
            .unwrap();
    }

    /// Test cancel posts to the `:cancel` method
    #[tokio::test]
    async fn test_cancel_posts_to_cancel_verb() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(instance_path("dataExports/e1:cancel")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "dataExportStatus": {"stage": "CANCELLED"},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = data_export::cancel_data_export(&client, "e1").await.unwrap();
        let stage = data_export::DataExportStage::of(&response).unwrap();
        assert!(stage.is_terminal());
    }

    /// Test the list filter is repeated on every page request
    #[tokio::test]
    async fn test_list_passes_filter_to_every_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(instance_path("dataExports")))
            .and(query_param("filter", "stage=IN_QUEUE"))
            .and(query_param_is_missing("pageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "dataExports": [{"name": "e1"}],
                "nextPageToken": "t1",
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(instance_path("dataExports")))
            .and(query_param("filter", "stage=IN_QUEUE"))
            .and(query_param("pageToken", "t1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"dataExports": [{"name": "e2"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let exports =
            data_export::list_data_exports(&client, Some("stage=IN_QUEUE"), &PageRequest::all())
                .await
                .unwrap();
        assert_eq!(names_of(&exports), vec!["e1", "e2"]);
    }

    /// Test available log types decode into typed entries
    #[tokio::test]
    async fn test_available_log_types_are_typed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(instance_path("dataExports:fetchavailablelogtypes")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "availableLogTypes": [{
                    "logType": format!("{INSTANCE}/logTypes/OKTA"),
                    "displayName": "Okta",
                    "startTime": "2024-01-01T00:00:00Z",
                    "endTime": "2024-01-02T00:00:00Z",
                }],
                "nextPageToken": "more",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (start, end) = day_range();
        let available =
            data_export::fetch_available_log_types(&client, &start, &end, Some(10), None)
                .await
                .unwrap();
        assert_eq!(available.available_log_types.len(), 1);
        assert_eq!(available.available_log_types[0].display_name, "Okta");
        assert_eq!(available.next_page_token.as_deref(), Some("more"));
    }
}

/// Log type fetching and the cached lookup table
mod log_type_tests {
    use super::*;

    fn log_type(id: &str, display_name: &str) -> Value {
        json!({
            "name": format!("{INSTANCE}/logTypes/{id}"),
            "displayName": display_name,
        })
    }

    /// Test single-page fetch honours the page size and token and stops
    #[tokio::test]
    async fn test_fetch_log_types_single_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(instance_path("logTypes")))
            .and(query_param("pageSize", "50"))
            .and(query_param("pageToken", "abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logTypes": [log_type("OKTA", "Okta"), log_type("WINDOWS_DNS", "Windows DNS")],
                "nextPageToken": "def",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = PageRequest::single(50, Some("abc".to_string()));
        let map = log_types::fetch_log_types(&client, &request).await.unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map["WINDOWS_DNS"].description, "Windows DNS");
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    /// Test the table hits the API once and keeps ids without a display name
    #[tokio::test]
    async fn test_table_loads_from_api_once() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(instance_path("logTypes")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logTypes": [
                    log_type("CUSTOM_APP", "Custom App"),
                    {"name": format!("{INSTANCE}/logTypes/NO_DISPLAY")},
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let table = LogTypeTable::with_client(client_for(&server));
        assert!(table.is_valid("CUSTOM_APP").await);
        assert_eq!(
            table.description("NO_DISPLAY").await.as_deref(),
            Some("NO_DISPLAY")
        );
        assert!(!table.is_valid("OKTA").await);
    }

    /// Test reset drops the cache so the next lookup fetches again
    #[tokio::test]
    async fn test_table_refetches_after_reset() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(instance_path("logTypes")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logTypes": [log_type("CUSTOM_APP", "Custom App")],
            })))
            .expect(2)
            .mount(&server)
            .await;

        let table = LogTypeTable::with_client(client_for(&server));
        assert_eq!(table.load().await.len(), 1);
        assert_eq!(table.load().await.len(), 1);

        table.reset().await;
        assert!(!table.is_loaded().await);

        assert!(table.is_valid("CUSTOM_APP").await);
        assert!(table.is_loaded().await);
    }

    /// Test an API failure falls back to the embedded list
    #[tokio::test]
    async fn test_table_falls_back_to_static_list() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(instance_path("logTypes")))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let table = LogTypeTable::with_client(client_for(&server));
        assert!(table.is_valid("OKTA").await);
    }
}
