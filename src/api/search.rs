use axum::extract::{OriginalUri, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use super::auth::MaybeAuthUser;
use super::error::AppError;
use super::extract::AppQuery;
use super::pagination::{self, Page, PageRequest};
use super::recipes::render_page;
use super::responses::{self, RecipeJson};
use super::AppState;
use crate::database::models::RecipeId;
use crate::database::queries;
use crate::listing::ListOptions;
use crate::relevance;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Relevance ordering is the default; any other `sort` value hands the
/// matching set to the regular listing rules.
pub async fn search(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    MaybeAuthUser(viewer): MaybeAuthUser,
    AppQuery(params): AppQuery<SearchParams>,
) -> Result<Json<Page<RecipeJson>>, AppError> {
    let query = match params.query {
        Some(query) if !query.is_empty() => query,
        _ => return Err(AppError::InvalidArgument("Query parameter is required")),
    };
    let request = PageRequest::from_params(params.page.as_deref(), params.limit.as_deref())?;

    let page = state
        .db(move |conn| {
            let recipes = queries::list_recipes(conn)?;
            match params.sort.as_deref() {
                None | Some("relevance") => {
                    let ordered = relevance::rank(recipes, &query);
                    let ids: Vec<RecipeId> = ordered.iter().map(|recipe| recipe.id).collect();
                    let summaries = queries::rating_summaries(conn, &ids)?;
                    let page = pagination::paginate(ordered, &request, &uri)?;
                    let rendered =
                        responses::recipes_json(conn, &page.results, &summaries, viewer)?;
                    Ok(page.with_results(rendered))
                }
                other => {
                    let matching = relevance::filter_matching(recipes, &query);
                    let options = ListOptions::from_params(other, params.order.as_deref(), None);
                    render_page(conn, matching, &options, &request, &uri, viewer)
                }
            }
        })
        .await?;
    Ok(Json(page))
}
