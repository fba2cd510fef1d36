use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};

use crate::api::response::ResponseEnvelope;
use crate::error::ApiError;
use crate::features::shared::{json_body, method_not_allowed};
use crate::features::FeatureState;

use super::queries::BuildTreeQuery;

pub fn tree_routes() -> Router<FeatureState> {
    Router::new().route("/tree", post(get_tree).fallback(method_not_allowed))
}

#[tracing::instrument(skip_all)]
async fn get_tree(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = json_body(&headers, &body)?;
    let query = BuildTreeQuery::from_json(&payload)?;
    let requested = query.taxids.len();

    let tree = super::queries::handle(state.source.as_ref(), &state.cache, query).await?;

    tracing::info!(
        requested,
        nodes = tree.values().map(|root| root.len()).sum::<usize>(),
        "Built lineage tree"
    );

    Ok(ResponseEnvelope::tree(tree).into_response())
}
