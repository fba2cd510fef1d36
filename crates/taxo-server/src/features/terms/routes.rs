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
use crate::features::shared::{json_body, method_not_allowed, required_field};
use crate::features::FeatureState;

use super::queries::resolve_terms::TERM_FIELD;
use super::queries::{ResolveTermsQuery, TermArgument};

pub fn terms_routes() -> Router<FeatureState> {
    Router::new().route("/term", post(get_terms).fallback(method_not_allowed))
}

#[tracing::instrument(skip_all)]
async fn get_terms(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = json_body(&headers, &body)?;
    let term = TermArgument::from_json(required_field(&payload, TERM_FIELD)?)?;

    let query = ResolveTermsQuery { term };
    let terms = super::queries::handle(state.source.as_ref(), &state.cache, query).await?;

    tracing::info!(
        terms = terms.len(),
        cached = state.cache.len(),
        "Resolved taxonomic terms"
    );

    Ok(ResponseEnvelope::terms(terms).into_response())
}
