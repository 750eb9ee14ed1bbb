/// One query sent to a backend adapter.
#[derive(Debug, Clone)]
pub struct RerankRequest {
    pub query: String,
    pub documents: Vec<String>,
    pub top_n: usize,
}

/// Relevance of the document at `index` in the request's document list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankItem {
    pub index: usize,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct RerankResponse {
    pub provider: String,
    pub model: String,
    pub items: Vec<RerankItem>,
}
