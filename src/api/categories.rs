use axum::extract::{OriginalUri, Path, State};
use axum::Json;
use std::sync::Arc;

use super::auth::MaybeAuthUser;
use super::error::AppError;
use super::extract::AppQuery;
use super::pagination::{Page, PageRequest};
use super::recipes::{render_page, ListParams};
use super::responses::{self, CategoryJson, RecipeJson};
use super::AppState;
use crate::database::queries;
use crate::listing::ListOptions;

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<CategoryJson>>, AppError> {
    let rendered = state
        .db(|conn| {
            let categories = queries::list_categories(conn)?;
            Ok(responses::categories_json(conn, &categories)?)
        })
        .await?;
    Ok(Json(rendered))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryJson>, AppError> {
    let rendered = state
        .db(move |conn| {
            let category = queries::find_category_by_slug(conn, &slug)?
                .ok_or(AppError::NotFound("category"))?;
            Ok(responses::category_detail_json(conn, &category)?)
        })
        .await?;
    Ok(Json(rendered))
}

pub async fn recipes(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    OriginalUri(uri): OriginalUri,
    MaybeAuthUser(viewer): MaybeAuthUser,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Page<RecipeJson>>, AppError> {
    let request = PageRequest::from_params(params.page.as_deref(), params.limit.as_deref())?;
    let options = ListOptions::from_params(
        params.sort.as_deref(),
        params.order.as_deref(),
        params.featured.as_deref(),
    );
    let page = state
        .db(move |conn| {
            let category = queries::find_category_by_slug(conn, &slug)?
                .ok_or(AppError::NotFound("category"))?;
            let recipes = queries::list_recipes_in_category(conn, category.id)?;
            render_page(conn, recipes, &options, &request, &uri, viewer)
        })
        .await?;
    Ok(Json(page))
}
