// Copyright 2025 GraphCL Parity Contributors
// SPDX-License-Identifier: Apache-2.0

//! Differential parity harness.
//!
//! The harness sends every [`QueryCase`] to two deployments and checks that
//! they answer with semantically equal data. A case passes only when:
//!
//! - both requests succeed at the transport level,
//! - neither response carries GraphQL `errors`,
//! - both `data` members contain every expected top-level field,
//! - the two `data` members compare equal under the [`SemanticComparator`].
//!
//! Cases are run one after the other; the two requests of a case are issued
//! concurrently.

use crate::client::{ClientError, GraphqlRequest, GraphqlResponse, GraphqlTransport};
use crate::queries::QueryCase;
use graphcl_parity_core::compare::{Diff, SemanticComparator};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Introspection query used by the schema compatibility check.
pub const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types {
      kind
      name
      description
      fields(includeDeprecated: true) {
        name
        description
        type {
          kind
          name
          ofType {
            kind
            name
          }
        }
        isDeprecated
        deprecationReason
      }
    }
  }
}
"#;

/// Outcome category of one case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseStatus {
    /// Both deployments returned semantically equal data.
    Equivalent,
    /// The data differs.
    Divergent {
        /// What differs.
        diff: Diff,
    },
    /// A deployment answered with GraphQL errors.
    GraphqlErrors {
        /// Offending deployment.
        endpoint: String,
        /// The reported errors.
        errors: Vec<Value>,
    },
    /// An expected top-level field is absent.
    MissingField {
        /// Offending deployment.
        endpoint: String,
        /// Absent field.
        field: String,
    },
    /// A request could not be completed.
    TransportError {
        /// Offending deployment.
        endpoint: String,
        /// Error description.
        message: String,
    },
}

/// Result of running one case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseOutcome {
    /// Case id.
    pub id: String,
    /// Case description.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// What happened.
    #[serde(flatten)]
    pub status: CaseStatus,
    /// Left-hand `data`, kept for equivalent cases.
    #[serde(skip)]
    pub sample: Option<Value>,
}

impl CaseOutcome {
    fn new(case: &QueryCase, status: CaseStatus) -> Self {
        Self {
            id: case.id.clone(),
            description: case.description.clone(),
            status,
            sample: None,
        }
    }

    /// Whether the case passed.
    pub fn is_pass(&self) -> bool {
        self.status == CaseStatus::Equivalent
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            CaseStatus::Equivalent => write!(f, "{}: equivalent", self.id),
            CaseStatus::Divergent { diff } => {
                write!(f, "{}: {} semantic difference(s)\n{diff}", self.id, diff.len())
            }
            CaseStatus::GraphqlErrors { endpoint, errors } => {
                write!(f, "{}: {endpoint} returned {} GraphQL error(s)", self.id, errors.len())
            }
            CaseStatus::MissingField { endpoint, field } => {
                write!(f, "{}: field '{field}' missing from {endpoint} response", self.id)
            }
            CaseStatus::TransportError { endpoint, message } => {
                write!(f, "{}: request to {endpoint} failed: {message}", self.id)
            }
        }
    }
}

/// Outcomes of a full harness run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParityReport {
    /// One outcome per case, in case order.
    pub outcomes: Vec<CaseOutcome>,
}

impl ParityReport {
    /// Number of passing cases.
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_pass()).count()
    }

    /// Number of failing cases.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    /// Whether every case passed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// The failing outcomes.
    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.outcomes.iter().filter(|o| !o.is_pass())
    }

    /// Write the left-hand data of every equivalent case to
    /// `<dir>/sample-output-<id>.json`. Returns the number of files written.
    pub fn write_samples(&self, dir: &Path) -> io::Result<usize> {
        fs::create_dir_all(dir)?;
        let mut written = 0;
        for outcome in &self.outcomes {
            let Some(sample) = &outcome.sample else {
                continue;
            };
            let name = format!("sample-output-{}.json", outcome.id.replace(['/', '\\'], "_"));
            let mut writer = BufWriter::new(File::create(dir.join(name))?);
            let mut serializer =
                serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"\t"));
            sample.serialize(&mut serializer).map_err(io::Error::from)?;
            writer.flush()?;
            written += 1;
        }
        Ok(written)
    }
}

impl fmt::Display for ParityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} case(s): {} passed, {} failed",
            self.outcomes.len(),
            self.passed(),
            self.failed()
        )
    }
}

/// Errors from the schema compatibility check.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Introspection request failed
    #[error(transparent)]
    Transport(#[from] ClientError),

    /// Introspection returned GraphQL errors
    #[error("Schema introspection failed on {endpoint}")]
    Introspection { endpoint: String },

    /// Introspection data has an unexpected shape
    #[error("Malformed introspection response from {endpoint}")]
    Malformed { endpoint: String },

    /// The two schemas share no type
    #[error("APIs have no common types")]
    NoCommonTypes,
}

/// Type names exposed by both deployments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaCompatibility {
    /// Types of the left deployment.
    pub left_types: BTreeSet<String>,
    /// Types of the right deployment.
    pub right_types: BTreeSet<String>,
    /// Types present in both.
    pub common_types: BTreeSet<String>,
}

/// Runs query cases against two deployments.
pub struct ParityHarness<L, R> {
    left: L,
    right: R,
    comparator: SemanticComparator,
}

impl<L: GraphqlTransport, R: GraphqlTransport> ParityHarness<L, R> {
    /// Create a harness.
    pub fn new(left: L, right: R, comparator: SemanticComparator) -> Self {
        Self {
            left,
            right,
            comparator,
        }
    }

    /// Run one case.
    pub async fn run_case(&self, case: &QueryCase) -> CaseOutcome {
        info!(case = %case.id, description = %case.description, "Executing query");

        let request = case.request();
        let (left, right) = tokio::join!(self.left.execute(&request), self.right.execute(&request));

        let left = match left {
            Ok(response) => response,
            Err(e) => return transport_failure(case, self.left.name(), &e),
        };
        let right = match right {
            Ok(response) => response,
            Err(e) => return transport_failure(case, self.right.name(), &e),
        };

        for (endpoint, response) in [(self.left.name(), &left), (self.right.name(), &right)] {
            if response.has_errors() {
                warn!(case = %case.id, endpoint, errors = response.errors().len(), "GraphQL errors returned");
                return CaseOutcome::new(
                    case,
                    CaseStatus::GraphqlErrors {
                        endpoint: endpoint.to_string(),
                        errors: response.errors().to_vec(),
                    },
                );
            }
        }

        let left_data = left.data_or_empty();
        let right_data = right.data_or_empty();

        for field in case.expected_fields.iter().flatten() {
            for (endpoint, data) in [(self.left.name(), &left_data), (self.right.name(), &right_data)] {
                if data.get(field).is_none() {
                    warn!(case = %case.id, endpoint, field = %field, "Expected field not found");
                    return CaseOutcome::new(
                        case,
                        CaseStatus::MissingField {
                            endpoint: endpoint.to_string(),
                            field: field.clone(),
                        },
                    );
                }
            }
        }

        debug!(case = %case.id, "Comparing responses semantically");
        let result = self.comparator.compare(&left_data, &right_data);
        if result.equal {
            info!(case = %case.id, "Responses are semantically equal");
            let mut outcome = CaseOutcome::new(case, CaseStatus::Equivalent);
            outcome.sample = Some(left_data);
            return outcome;
        }

        error!(
            case = %case.id,
            differences = result.diff.len(),
            "Semantic differences found:\n{}",
            result.diff
        );
        debug!(
            case = %case.id,
            left = %self.left.name(),
            payload = %left_data,
            "Left response"
        );
        debug!(
            case = %case.id,
            right = %self.right.name(),
            payload = %right_data,
            "Right response"
        );
        CaseOutcome::new(case, CaseStatus::Divergent { diff: result.diff })
    }

    /// Run every case in order.
    pub async fn run_all(&self, cases: &[QueryCase]) -> ParityReport {
        let mut report = ParityReport::default();
        for case in cases {
            report.outcomes.push(self.run_case(case).await);
        }
        info!(
            cases = report.outcomes.len(),
            passed = report.passed(),
            failed = report.failed(),
            "Parity run finished"
        );
        report
    }

    /// Check that both deployments expose at least one common type.
    ///
    /// Introspection types whose name starts with `__` are ignored.
    pub async fn check_schema_compatibility(&self) -> Result<SchemaCompatibility, SchemaError> {
        let request = GraphqlRequest::new(INTROSPECTION_QUERY);
        let (left, right) = tokio::join!(self.left.execute(&request), self.right.execute(&request));

        let left_types = schema_types(self.left.name(), &left?)?;
        let right_types = schema_types(self.right.name(), &right?)?;
        let common_types: BTreeSet<String> = left_types.intersection(&right_types).cloned().collect();

        if common_types.is_empty() {
            return Err(SchemaError::NoCommonTypes);
        }
        info!(common = common_types.len(), "Found common types between APIs");

        Ok(SchemaCompatibility {
            left_types,
            right_types,
            common_types,
        })
    }
}

fn transport_failure(case: &QueryCase, endpoint: &str, error: &ClientError) -> CaseOutcome {
    error!(case = %case.id, endpoint, error = %error, "Request failed");
    CaseOutcome::new(
        case,
        CaseStatus::TransportError {
            endpoint: endpoint.to_string(),
            message: error.to_string(),
        },
    )
}

fn schema_types(endpoint: &str, response: &GraphqlResponse) -> Result<BTreeSet<String>, SchemaError> {
    if response.has_errors() {
        return Err(SchemaError::Introspection {
            endpoint: endpoint.to_string(),
        });
    }
    let types = response
        .data
        .as_ref()
        .and_then(|data| data.pointer("/__schema/types"))
        .and_then(Value::as_array)
        .ok_or_else(|| SchemaError::Malformed {
            endpoint: endpoint.to_string(),
        })?;

    Ok(types
        .iter()
        .filter_map(|t| t.get("name").and_then(Value::as_str))
        .filter(|name| !name.starts_with("__"))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockGraphqlTransport;
    use graphcl_parity_core::normalize::IgnoreKeySet;
    use serde_json::json;

    fn transport(name: &'static str, data: Value) -> MockGraphqlTransport {
        let mut mock = MockGraphqlTransport::new();
        mock.expect_name().return_const(name.to_string());
        mock.expect_execute()
            .returning(move |_| Ok(GraphqlResponse::with_data(data.clone())));
        mock
    }

    fn harness(left: Value, right: Value) -> ParityHarness<MockGraphqlTransport, MockGraphqlTransport> {
        ParityHarness::new(
            transport("API_1", left),
            transport("API_2", right),
            SemanticComparator::new(IgnoreKeySet::default().with("timestamp")),
        )
    }

    fn case() -> QueryCase {
        QueryCase::new("get_posts", "{ posts { title tags } }").with_expected_fields(["posts"])
    }

    #[tokio::test]
    async fn test_equivalent_responses_pass() {
        let harness = harness(
            json!({"posts": [{"id": "1", "title": "a", "tags": ["x", "y"]}, {"id": "2", "title": "b", "tags": []}]}),
            json!({"posts": [{"id": "9", "title": "b", "tags": []}, {"id": "8", "title": "a", "tags": ["y", "x"]}]}),
        );
        let outcome = harness.run_case(&case()).await;
        assert!(outcome.is_pass(), "{outcome}");
        assert!(outcome.sample.is_some());
    }

    #[tokio::test]
    async fn test_divergent_responses_fail_with_diff() {
        let harness = harness(
            json!({"posts": [{"title": "a", "tags": ["x"]}]}),
            json!({"posts": [{"title": "a", "tags": ["z"]}]}),
        );
        let outcome = harness.run_case(&case()).await;
        match &outcome.status {
            CaseStatus::Divergent { diff } => assert!(diff.touches("$.posts")),
            other => panic!("unexpected status: {other:?}"),
        }
        assert!(outcome.sample.is_none());
    }

    #[tokio::test]
    async fn test_missing_expected_field() {
        let harness = harness(json!({"posts": []}), json!({"users": []}));
        let outcome = harness.run_case(&case()).await;
        assert_eq!(
            outcome.status,
            CaseStatus::MissingField {
                endpoint: "API_2".to_string(),
                field: "posts".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_graphql_errors_fail_case() {
        let mut left = MockGraphqlTransport::new();
        left.expect_name().return_const("API_1".to_string());
        left.expect_execute().returning(|_| {
            Ok(GraphqlResponse {
                data: None,
                errors: Some(vec![json!({"message": "Forbidden"})]),
            })
        });
        let harness = ParityHarness::new(left, transport("API_2", json!({})), SemanticComparator::default());

        let outcome = harness.run_case(&case()).await;
        assert!(matches!(
            outcome.status,
            CaseStatus::GraphqlErrors { ref endpoint, .. } if endpoint == "API_1"
        ));
    }

    #[tokio::test]
    async fn test_transport_error_fails_case() {
        let mut right = MockGraphqlTransport::new();
        right.expect_name().return_const("API_2".to_string());
        right.expect_execute().returning(|_| {
            Err(ClientError::Status {
                endpoint: "API_2".to_string(),
                status: 502,
            })
        });
        let harness = ParityHarness::new(transport("API_1", json!({})), right, SemanticComparator::default());

        let outcome = harness.run_case(&case()).await;
        assert_eq!(
            outcome.status,
            CaseStatus::TransportError {
                endpoint: "API_2".to_string(),
                message: "API_2 returned HTTP 502".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_run_all_and_samples() {
        let harness = harness(json!({"posts": [1, 2]}), json!({"posts": [2, 1]}));
        let cases = vec![case(), QueryCase::new("a/b", "{ posts }")];
        let report = harness.run_all(&cases).await;
        assert!(report.is_success());
        assert_eq!(report.passed(), 2);
        assert_eq!(report.to_string(), "2 case(s): 2 passed, 0 failed");

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(report.write_samples(dir.path()).unwrap(), 2);
        let written = fs::read_to_string(dir.path().join("sample-output-a_b.json")).unwrap();
        assert!(written.contains("\t\"posts\""));
    }

    #[tokio::test]
    async fn test_failures_lists_only_failed_cases() {
        let harness = harness(json!({"posts": [1]}), json!({"posts": [2]}));
        let report = harness.run_all(&[case()]).await;
        assert!(!report.is_success());
        let failed: Vec<&str> = report.failures().map(|o| o.id.as_str()).collect();
        assert_eq!(failed, vec!["get_posts"]);
    }

    #[tokio::test]
    async fn test_schema_compatibility() {
        let left = json!({"__schema": {"types": [{"name": "Post"}, {"name": "User"}, {"name": "__Type"}]}});
        let right = json!({"__schema": {"types": [{"name": "Post"}, {"name": "Comment"}, {"name": "__Type"}]}});
        let compatibility = harness(left, right).check_schema_compatibility().await.unwrap();
        assert_eq!(compatibility.common_types.len(), 1);
        assert!(compatibility.common_types.contains("Post"));
        assert!(!compatibility.left_types.contains("__Type"));
    }

    #[tokio::test]
    async fn test_schema_without_common_types() {
        let left = json!({"__schema": {"types": [{"name": "A"}]}});
        let right = json!({"__schema": {"types": [{"name": "B"}]}});
        let err = harness(left, right).check_schema_compatibility().await.unwrap_err();
        assert!(matches!(err, SchemaError::NoCommonTypes));
    }

    #[tokio::test]
    async fn test_schema_malformed() {
        let err = harness(json!({}), json!({})).check_schema_compatibility().await.unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { .. }));
    }

    #[test]
    fn test_outcome_serializes_status_inline() {
        let outcome = CaseOutcome::new(&case(), CaseStatus::Equivalent);
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"id": "get_posts", "status": "equivalent"})
        );
    }
}
