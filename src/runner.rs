//! The pseudo-execution step: an equality-gated, delay-simulated lookup that
//! stands in for real query execution.

use crate::{QueryRunnerError, QueryRunnerResult, Record, TableDef};

use std::time::{Duration, Instant};

/// Fixed delay used to simulate query latency.
pub const SIMULATED_LATENCY: Duration = Duration::from_millis(500);

/// The result of one successful pseudo-execution.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// The request id this outcome belongs to. Outcomes whose id no longer
    /// matches the latest issued id are stale and must be discarded.
    pub request_id: u64,
    /// The executed (trimmed-matched) query text, as entered by the user.
    pub query_text: String,
    /// The matched query's literal result rows, published wholesale.
    pub rows: Vec<Record>,
    /// Wall-clock time from request to completion, for display.
    pub elapsed: Duration,
}

/// Validates and schedules pseudo-executions.
///
/// Each execution carries a monotonically increasing request id. The caller
/// applies an outcome only while its id equals [`QueryRunner::latest_request_id`],
/// so a result arriving after an intervening table or query change is
/// discarded instead of overwriting the newer state.
#[derive(Debug)]
pub struct QueryRunner {
    delay: Duration,
    latest_request_id: u64,
}

impl Default for QueryRunner {
    fn default() -> Self {
        QueryRunner::new(SIMULATED_LATENCY)
    }
}

impl QueryRunner {
    pub fn new(delay: Duration) -> Self {
        QueryRunner {
            delay,
            latest_request_id: 0,
        }
    }

    /// The id of the most recently issued request. Zero before any request.
    pub fn latest_request_id(&self) -> u64 {
        self.latest_request_id
    }

    /// Invalidates any in-flight request without issuing a new one. Called
    /// when the table selection changes while an execution is pending.
    pub fn invalidate(&mut self) {
        self.latest_request_id += 1;
    }

    /// Returns `true` if the outcome was produced by the latest request.
    pub fn is_current(&self, outcome: &ExecutionOutcome) -> bool {
        outcome.request_id == self.latest_request_id
    }

    /// Validates `text` against the table's predefined queries and, on a
    /// match, returns a future resolving to the matched query's pre-baked
    /// result rows after the simulated latency.
    ///
    /// Matching is by trimmed query **text**, not by the selected query id:
    /// hand-editing the text to exactly equal another query's literal SQL
    /// executes that other query.
    ///
    /// ### Errors
    ///
    /// [`QueryRunnerError::NotPredefined`] when no predefined query of the
    /// table has the same trimmed text. Nothing is scheduled in that case
    /// and no request id is consumed.
    pub fn execute(
        &mut self,
        table: &TableDef,
        text: &str,
    ) -> QueryRunnerResult<impl Future<Output = QueryRunnerResult<ExecutionOutcome>> + Send + use<>>
    {
        let Some(query) = table.query_by_text(text) else {
            tracing::debug!(
                "execute: text does not match any predefined query of {:?}",
                table.name
            );
            return Err(QueryRunnerError::NotPredefined);
        };

        self.latest_request_id += 1;
        let request_id = self.latest_request_id;
        let query_text = text.to_string();
        let rows = query.results.clone();
        let delay = self.delay;

        tracing::debug!(
            "execute: request_id={request_id} table={:?} matched query={:?} rows={}",
            table.name,
            query.id,
            rows.len()
        );

        let started = Instant::now();
        Ok(async move {
            tokio::time::sleep(delay).await;
            Ok(ExecutionOutcome {
                request_id,
                query_text,
                rows,
                elapsed: started.elapsed(),
            })
        })
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// `cargo test -- --show-output tests_runner`
#[cfg(test)]
mod tests_runner {
    use super::*;
    use crate::CATALOG;

    fn runner() -> QueryRunner {
        // Keep tests fast: latency simulation is not under test here.
        QueryRunner::new(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn execute_succeeds_on_exact_text() -> QueryRunnerResult<()> {
        let table = CATALOG.get("customers").unwrap();
        let mut runner = runner();

        let outcome = runner.execute(table, "SELECT * FROM customers;")?.await?;
        assert_eq!(outcome.rows.len(), 5);
        assert!(runner.is_current(&outcome));
        Ok(())
    }

    #[tokio::test]
    async fn execute_is_trim_insensitive_only() -> QueryRunnerResult<()> {
        let table = CATALOG.get("customers").unwrap();
        let mut runner = runner();

        // Leading/trailing whitespace still matches.
        let outcome = runner
            .execute(table, "   SELECT * FROM customers;\n")?
            .await?;
        assert_eq!(outcome.rows.len(), 5);

        // Any other modification is a validation failure.
        let err = runner
            .execute(table, "SELECT * FROM customers LIMIT 1;")
            .err()
            .unwrap();
        assert!(matches!(err, QueryRunnerError::NotPredefined));
        Ok(())
    }

    #[tokio::test]
    async fn text_match_wins_over_selected_id() -> QueryRunnerResult<()> {
        // The UI may have query A selected while the text equals query B:
        // execution returns B's results.
        let table = CATALOG.get("customers").unwrap();
        let mut runner = runner();

        let outcome = runner
            .execute(table, "SELECT * FROM customers WHERE status = 'active';")?
            .await?;
        assert_eq!(outcome.rows.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn stale_outcome_is_detected() -> QueryRunnerResult<()> {
        let table = CATALOG.get("customers").unwrap();
        let mut runner = runner();

        let pending = runner.execute(table, "SELECT * FROM customers;")?;

        // The user switches tables while the execution is in flight.
        runner.invalidate();

        let outcome = pending.await?;
        assert!(!runner.is_current(&outcome));
        Ok(())
    }

    #[test]
    fn validation_failure_consumes_no_request_id() {
        let table = CATALOG.get("customers").unwrap();
        let mut runner = runner();

        let before = runner.latest_request_id();
        assert!(runner.execute(table, "not sql").is_err());
        assert_eq!(runner.latest_request_id(), before);
    }
}
