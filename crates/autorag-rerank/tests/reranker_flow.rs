use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use autorag_rerank::{
    CandidateTable, Column, ColumnFrame, DashScopeRerankConfig, PassageReranker,
    ProviderError, ProviderReranker, RerankError, RerankItem, RerankOptions, RerankProvider,
    RerankRequest, RerankResponse,
};

#[derive(Clone, Copy)]
enum Order {
    Identity,
    Reverse,
}

/// Backend stand-in: scores documents in a fixed order and sleeps for a
/// per-query delay before answering.
struct ScriptedProvider {
    order: Order,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(order: Order) -> Self {
        Self {
            order,
            delays: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RerankProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-v1"
    }

    async fn rerank(&self, request: RerankRequest) -> Result<RerankResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&request.query) {
            tokio::time::sleep(*delay).await;
        }

        let n = request.documents.len();
        let items = (0..n)
            .map(|rank| {
                let index = match self.order {
                    Order::Identity => rank,
                    Order::Reverse => n - 1 - rank,
                };
                RerankItem {
                    index,
                    score: (n - rank) as f64 / n as f64,
                }
            })
            .take(request.top_n)
            .collect();

        Ok(RerankResponse {
            provider: self.name().to_string(),
            model: self.model().to_string(),
            items,
        })
    }
}

struct FailingProvider;

#[async_trait]
impl RerankProvider for FailingProvider {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn model(&self) -> &str {
        "none"
    }

    async fn rerank(&self, _request: RerankRequest) -> Result<RerankResponse, ProviderError> {
        Err(ProviderError::Api {
            status: 429,
            body: r#"{"code":"Throttling.RateQuota"}"#.to_string(),
        })
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

fn sample_table() -> CandidateTable {
    CandidateTable::new(
        strings(&["q1", "q2"]),
        vec![strings(&["a", "b", "c"]), strings(&["d", "e"])],
        vec![strings(&["1", "2", "3"]), strings(&["4", "5"])],
        vec![vec![0.1, 0.2, 0.3], vec![0.5, 0.4]],
    )
    .expect("sample table")
}

fn wide_table(queries: usize, candidates: usize) -> CandidateTable {
    let qs = (0..queries).map(|q| format!("q{q}")).collect();
    let contents = (0..queries)
        .map(|q| (0..candidates).map(|c| format!("doc-{q}-{c}")).collect())
        .collect();
    let ids = (0..queries)
        .map(|q| (0..candidates).map(|c| format!("id-{q}-{c}")).collect())
        .collect();
    let scores = (0..queries)
        .map(|_| (0..candidates).map(|c| 1.0 / (c as f64 + 1.0)).collect())
        .collect();
    CandidateTable::new(qs, contents, ids, scores).expect("wide table")
}

fn reranker(provider: Arc<dyn RerankProvider>, batch: usize) -> ProviderReranker {
    ProviderReranker::new(provider, RerankOptions::default().with_batch(batch))
        .expect("valid options")
}

#[tokio::test]
async fn reversing_backend_yields_expected_ids() {
    let provider = Arc::new(ScriptedProvider::new(Order::Reverse));
    let result = reranker(provider, 8)
        .rerank(&sample_table(), 2)
        .await
        .expect("rerank");

    assert_eq!(result.ids, vec![strings(&["3", "2"]), strings(&["5", "4"])]);
    assert_eq!(result.contents, vec![strings(&["c", "b"]), strings(&["e", "d"])]);
    for scores in &result.scores {
        assert!(scores.windows(2).all(|w| w.first() >= w.get(1)));
    }
}

#[tokio::test]
async fn result_order_ignores_completion_order() {
    let table = wide_table(6, 4);
    let mut provider = ScriptedProvider::new(Order::Reverse);
    for q in 0..6u64 {
        provider = provider.with_delay(&format!("q{q}"), Duration::from_millis(5 * (6 - q)));
    }

    let result = reranker(Arc::new(provider), 6)
        .rerank(&table, 2)
        .await
        .expect("rerank");

    assert_eq!(result.len(), 6);
    for (q, ids) in result.ids.iter().enumerate() {
        assert_eq!(ids, &vec![format!("id-{q}-3"), format!("id-{q}-2")]);
    }
}

#[tokio::test]
async fn identity_backend_is_idempotent_at_full_depth() {
    let table = wide_table(3, 5);
    let result = reranker(Arc::new(ScriptedProvider::new(Order::Identity)), 2)
        .rerank(&table, 5)
        .await
        .expect("rerank");
    assert_eq!(result.ids, table.ids());
}

#[tokio::test]
async fn batch_size_does_not_change_the_result() {
    let table = wide_table(9, 4);
    let narrow = reranker(Arc::new(ScriptedProvider::new(Order::Reverse)), 1)
        .rerank(&table, 3)
        .await
        .expect("batch 1");
    let wide = reranker(Arc::new(ScriptedProvider::new(Order::Reverse)), 8)
        .rerank(&table, 3)
        .await
        .expect("batch 8");
    assert_eq!(narrow, wide);
}

#[tokio::test]
async fn top_k_is_clamped_to_available_candidates() {
    let result = reranker(Arc::new(ScriptedProvider::new(Order::Reverse)), 4)
        .rerank(&sample_table(), 10)
        .await
        .expect("rerank");
    let lengths: Vec<usize> = result.ids.iter().map(Vec::len).collect();
    assert_eq!(lengths, vec![3, 2]);
}

#[tokio::test]
async fn strict_top_k_rejects_before_calling_the_backend() {
    let provider = Arc::new(ScriptedProvider::new(Order::Reverse));
    let strict = ProviderReranker::new(
        provider.clone(),
        RerankOptions::default().with_strict_top_k(true),
    )
    .expect("options");
    let err = strict.rerank(&sample_table(), 3).await.expect_err("q2 too short");
    assert!(matches!(err, RerankError::InvalidInput(_)));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn empty_inputs_skip_the_backend() {
    let provider = Arc::new(ScriptedProvider::new(Order::Reverse));
    let module = reranker(provider.clone(), 4);

    let empty = module
        .rerank(&CandidateTable::default(), 3)
        .await
        .expect("empty table");
    assert!(empty.is_empty());

    let no_candidates = CandidateTable::new(
        strings(&["q1", "q2"]),
        vec![Vec::new(), strings(&["d", "e"])],
        vec![Vec::new(), strings(&["4", "5"])],
        vec![Vec::new(), vec![0.5, 0.4]],
    )
    .expect("table");
    let result = module.rerank(&no_candidates, 1).await.expect("rerank");
    assert_eq!(result.ids, vec![Vec::<String>::new(), strings(&["5"])]);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn backend_failure_surfaces_unchanged() {
    let err = reranker(Arc::new(FailingProvider), 2)
        .rerank(&sample_table(), 2)
        .await
        .expect_err("backend fails");
    match err {
        RerankError::Backend {
            provider,
            source: ProviderError::Api { status, .. },
        } => {
            assert_eq!(provider, "failing");
            assert_eq!(status, 429);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn timeout_abandons_queued_queries() {
    let mut provider = ScriptedProvider::new(Order::Reverse);
    for q in 0..5 {
        provider = provider.with_delay(&format!("q{q}"), Duration::from_millis(200));
    }
    let provider = Arc::new(provider);
    let module = ProviderReranker::new(
        provider.clone(),
        RerankOptions::default()
            .with_batch(1)
            .with_timeout(Duration::from_millis(50)),
    )
    .expect("options");

    let err = module
        .rerank(&wide_table(5, 3), 2)
        .await
        .expect_err("deadline passes");
    assert!(matches!(err, RerankError::Timeout(d) if d == Duration::from_millis(50)));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn run_writes_reranked_columns_into_the_frame() {
    let frame = ColumnFrame::new()
        .with_column("query", Column::Text(strings(&["q1", "q2"])))
        .and_then(|f| {
            f.with_column(
                "retrieved_contents",
                Column::TextList(vec![strings(&["a", "b", "c"]), strings(&["d", "e"])]),
            )
        })
        .and_then(|f| {
            f.with_column(
                "retrieved_ids",
                Column::TextList(vec![strings(&["1", "2", "3"]), strings(&["4", "5"])]),
            )
        })
        .and_then(|f| {
            f.with_column(
                "retrieve_scores",
                Column::ScoreList(vec![vec![0.1, 0.2, 0.3], vec![0.5, 0.4]]),
            )
        })
        .expect("frame");

    let out = reranker(Arc::new(ScriptedProvider::new(Order::Reverse)), 2)
        .run(&frame, 2)
        .await
        .expect("run");

    assert_eq!(
        out.text_lists("retrieved_ids").expect("ids"),
        &[strings(&["3", "2"]), strings(&["5", "4"])]
    );
    assert_eq!(out.text("query").expect("query"), strings(&["q1", "q2"]).as_slice());
}

#[test]
fn missing_credential_fails_before_any_request() {
    let err = DashScopeRerankConfig::from_lookup(None, |_| None).expect_err("no key");
    assert!(matches!(err, RerankError::Configuration(msg) if msg.contains("DASHSCOPE_API_KEY")));
}
