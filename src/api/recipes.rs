use axum::extract::{OriginalUri, State};
use axum::http::{StatusCode, Uri};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::auth::{AuthUser, MaybeAuthUser};
use super::error::AppError;
use super::extract::{AppJson, AppPath, AppQuery};
use super::pagination::{self, Page, PageRequest};
use super::responses::{self, CommentJson, RecipeJson};
use super::AppState;
use crate::database;
use crate::database::models::{
    CategoryId, NewComment, NewRecipe, Recipe, RecipeChanges, RecipeId, UserId,
};
use crate::database::queries;
use crate::listing::{self, ListOptions};

// `page` and `limit` stay raw strings here; how an unparseable value is
// handled belongs to `PageRequest`, not to query deserialization.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub sort: Option<String>,
    pub order: Option<String>,
    pub featured: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Sort, slice, and render one page of an already-loaded recipe set. Runs on
/// the blocking pool, inside the caller's database closure.
pub(super) fn render_page(
    conn: &mut database::Connection,
    recipes: Vec<Recipe>,
    options: &ListOptions,
    request: &PageRequest,
    uri: &Uri,
    viewer: Option<UserId>,
) -> Result<Page<RecipeJson>, AppError> {
    let ids: Vec<RecipeId> = recipes.iter().map(|recipe| recipe.id).collect();
    let summaries = queries::rating_summaries(conn, &ids)?;
    let recipes = listing::apply(recipes, &summaries, options);
    let page = pagination::paginate(recipes, request, uri)?;
    let rendered = responses::recipes_json(conn, &page.results, &summaries, viewer)?;
    Ok(page.with_results(rendered))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
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
            let recipes = queries::list_recipes(conn)?;
            render_page(conn, recipes, &options, &request, &uri, viewer)
        })
        .await?;
    Ok(Json(page))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    AppPath(recipe_id): AppPath<RecipeId>,
    MaybeAuthUser(viewer): MaybeAuthUser,
) -> Result<Json<RecipeJson>, AppError> {
    let rendered = state
        .db(move |conn| {
            let recipe =
                queries::find_recipe(conn, recipe_id)?.ok_or(AppError::NotFound("recipe"))?;
            Ok(responses::recipe_json(conn, &recipe, viewer)?)
        })
        .await?;
    Ok(Json(rendered))
}

/// Create and update take the same body; which fields are required differs.
#[derive(Debug, Deserialize)]
pub struct RecipePayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<serde_json::Value>,
    pub steps: Option<serde_json::Value>,
    pub cooking_time: Option<i32>,
    pub servings: Option<i32>,
    pub image: Option<String>,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug)]
struct NewRecipeFields {
    title: String,
    description: String,
    ingredients: String,
    steps: String,
    cooking_time: i32,
    servings: i32,
    image: Option<String>,
    category_id: CategoryId,
}

fn validate_create(payload: RecipePayload) -> Result<NewRecipeFields, AppError> {
    let mut problems = Vec::new();

    let title = match payload.title {
        Some(title) => {
            if title.trim().is_empty() {
                problems.push(("title", "may not be blank"));
            }
            title
        }
        None => {
            problems.push(("title", "this field is required"));
            String::new()
        }
    };
    let description = match payload.description {
        Some(description) => {
            if description.trim().is_empty() {
                problems.push(("description", "may not be blank"));
            }
            description
        }
        None => {
            problems.push(("description", "this field is required"));
            String::new()
        }
    };
    let ingredients = match payload.ingredients {
        Some(value) if value.is_array() => value.to_string(),
        Some(_) => {
            problems.push(("ingredients", "must be a list"));
            String::new()
        }
        None => {
            problems.push(("ingredients", "this field is required"));
            String::new()
        }
    };
    let steps = match payload.steps {
        Some(value) if value.is_array() => value.to_string(),
        Some(_) => {
            problems.push(("steps", "must be a list"));
            String::new()
        }
        None => {
            problems.push(("steps", "this field is required"));
            String::new()
        }
    };
    let cooking_time = match payload.cooking_time {
        Some(minutes) if minutes >= 1 => minutes,
        Some(_) => {
            problems.push(("cooking_time", "must be at least 1"));
            0
        }
        None => {
            problems.push(("cooking_time", "this field is required"));
            0
        }
    };
    let servings = match payload.servings {
        None => 1,
        Some(servings) if servings >= 1 => servings,
        Some(_) => {
            problems.push(("servings", "must be at least 1"));
            0
        }
    };
    let category_id = match payload.category_id {
        Some(category_id) => category_id,
        None => {
            problems.push(("category_id", "this field is required"));
            CategoryId(0)
        }
    };

    if !problems.is_empty() {
        return Err(AppError::Validation(problems));
    }
    Ok(NewRecipeFields {
        title,
        description,
        ingredients,
        steps,
        cooking_time,
        servings,
        image: payload.image,
        category_id,
    })
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(author): AuthUser,
    AppJson(payload): AppJson<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeJson>), AppError> {
    let fields = validate_create(payload)?;
    let rendered = state
        .db(move |conn| {
            if queries::find_category(conn, fields.category_id)?.is_none() {
                return Err(AppError::validation("category_id", "unknown category"));
            }
            let now = chrono::Utc::now().naive_utc();
            let recipe = queries::create_recipe(
                conn,
                &NewRecipe {
                    title: &fields.title,
                    description: &fields.description,
                    ingredients: &fields.ingredients,
                    steps: &fields.steps,
                    cooking_time: fields.cooking_time,
                    servings: fields.servings,
                    image: fields.image.as_deref(),
                    category_id: fields.category_id,
                    author_id: author,
                    featured: false,
                    created_at: now,
                    updated_at: now,
                },
            )?;
            Ok(responses::recipe_json(conn, &recipe, Some(author))?)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(rendered)))
}

#[derive(Debug)]
struct RecipeUpdateFields {
    title: Option<String>,
    description: Option<String>,
    ingredients: Option<String>,
    steps: Option<String>,
    cooking_time: Option<i32>,
    servings: Option<i32>,
    image: Option<String>,
    category_id: Option<CategoryId>,
}

/// Absent fields keep their stored value; present fields must still be valid.
fn validate_update(payload: RecipePayload) -> Result<RecipeUpdateFields, AppError> {
    let mut problems = Vec::new();

    let title = match payload.title {
        Some(title) if title.trim().is_empty() => {
            problems.push(("title", "may not be blank"));
            None
        }
        other => other,
    };
    let description = match payload.description {
        Some(description) if description.trim().is_empty() => {
            problems.push(("description", "may not be blank"));
            None
        }
        other => other,
    };
    let ingredients = match payload.ingredients {
        Some(value) if value.is_array() => Some(value.to_string()),
        Some(_) => {
            problems.push(("ingredients", "must be a list"));
            None
        }
        None => None,
    };
    let steps = match payload.steps {
        Some(value) if value.is_array() => Some(value.to_string()),
        Some(_) => {
            problems.push(("steps", "must be a list"));
            None
        }
        None => None,
    };
    let cooking_time = match payload.cooking_time {
        Some(minutes) if minutes < 1 => {
            problems.push(("cooking_time", "must be at least 1"));
            None
        }
        other => other,
    };
    let servings = match payload.servings {
        Some(servings) if servings < 1 => {
            problems.push(("servings", "must be at least 1"));
            None
        }
        other => other,
    };

    if !problems.is_empty() {
        return Err(AppError::Validation(problems));
    }
    Ok(RecipeUpdateFields {
        title,
        description,
        ingredients,
        steps,
        cooking_time,
        servings,
        image: payload.image,
        category_id: payload.category_id,
    })
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    AppPath(recipe_id): AppPath<RecipeId>,
    AuthUser(editor): AuthUser,
    AppJson(payload): AppJson<RecipePayload>,
) -> Result<Json<RecipeJson>, AppError> {
    let fields = validate_update(payload)?;
    let rendered = state
        .db(move |conn| {
            let recipe =
                queries::find_recipe(conn, recipe_id)?.ok_or(AppError::NotFound("recipe"))?;
            if recipe.author_id != editor {
                return Err(AppError::Forbidden("only the author may edit a recipe"));
            }
            if let Some(category_id) = fields.category_id {
                if queries::find_category(conn, category_id)?.is_none() {
                    return Err(AppError::validation("category_id", "unknown category"));
                }
            }
            let changes = RecipeChanges {
                title: fields.title.as_deref(),
                description: fields.description.as_deref(),
                ingredients: fields.ingredients.as_deref(),
                steps: fields.steps.as_deref(),
                cooking_time: fields.cooking_time,
                servings: fields.servings,
                image: fields.image.as_deref(),
                category_id: fields.category_id,
                updated_at: chrono::Utc::now().naive_utc(),
            };
            let recipe = queries::update_recipe(conn, recipe_id, &changes)?;
            Ok(responses::recipe_json(conn, &recipe, Some(editor))?)
        })
        .await?;
    Ok(Json(rendered))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    AppPath(recipe_id): AppPath<RecipeId>,
    AuthUser(editor): AuthUser,
) -> Result<StatusCode, AppError> {
    state
        .db(move |conn| {
            let recipe =
                queries::find_recipe(conn, recipe_id)?.ok_or(AppError::NotFound("recipe"))?;
            if recipe.author_id != editor {
                return Err(AppError::Forbidden("only the author may delete a recipe"));
            }
            Ok(queries::delete_recipe(conn, recipe_id)?)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct RatePayload {
    pub value: Option<i32>,
}

pub async fn rate(
    State(state): State<Arc<AppState>>,
    AppPath(recipe_id): AppPath<RecipeId>,
    AuthUser(rater): AuthUser,
    AppJson(payload): AppJson<RatePayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let value = match payload.value {
        Some(value) if (1..=5).contains(&value) => value,
        Some(_) => return Err(AppError::validation("value", "must be between 1 and 5")),
        None => return Err(AppError::validation("value", "this field is required")),
    };
    state
        .db(move |conn| {
            if queries::find_recipe(conn, recipe_id)?.is_none() {
                return Err(AppError::NotFound("recipe"));
            }
            Ok(queries::upsert_rating(conn, recipe_id, rater, value)?)
        })
        .await?;
    Ok(Json(json!({ "status": "rating set" })))
}

#[derive(Debug, Deserialize)]
pub struct CommentPayload {
    pub content: Option<String>,
}

pub async fn comment(
    State(state): State<Arc<AppState>>,
    AppPath(recipe_id): AppPath<RecipeId>,
    AuthUser(commenter): AuthUser,
    AppJson(payload): AppJson<CommentPayload>,
) -> Result<(StatusCode, Json<CommentJson>), AppError> {
    let content = match payload.content {
        Some(content) if !content.trim().is_empty() => content,
        Some(_) => return Err(AppError::validation("content", "may not be blank")),
        None => return Err(AppError::validation("content", "this field is required")),
    };
    let rendered = state
        .db(move |conn| {
            if queries::find_recipe(conn, recipe_id)?.is_none() {
                return Err(AppError::NotFound("recipe"));
            }
            let comment = queries::create_comment(
                conn,
                &NewComment {
                    recipe_id,
                    user_id: commenter,
                    content: &content,
                    created_at: chrono::Utc::now().naive_utc(),
                },
            )?;
            let user =
                queries::find_user(conn, commenter)?.ok_or(AppError::NotFound("user"))?;
            Ok(responses::comment_json(comment, &user, 0))
        })
        .await?;
    Ok((StatusCode::CREATED, Json(rendered)))
}

#[test]
fn creation_reports_every_missing_field_at_once() {
    let payload = RecipePayload {
        title: None,
        description: None,
        ingredients: None,
        steps: None,
        cooking_time: None,
        servings: None,
        image: None,
        category_id: None,
    };
    let AppError::Validation(problems) = validate_create(payload).unwrap_err() else {
        panic!("expected a validation error");
    };
    let fields: Vec<&str> = problems.iter().map(|(field, _)| *field).collect();
    assert_eq!(
        fields,
        vec!["title", "description", "ingredients", "steps", "cooking_time", "category_id"]
    );
}

#[test]
fn servings_default_to_one() {
    let payload = RecipePayload {
        title: Some("Chocolate Cake".into()),
        description: Some("Rich".into()),
        ingredients: Some(serde_json::json!([{"name": "flour", "amount": "200g"}])),
        steps: Some(serde_json::json!(["mix", "bake"])),
        cooking_time: Some(30),
        servings: None,
        image: None,
        category_id: Some(CategoryId(1)),
    };
    let fields = validate_create(payload).unwrap();
    assert_eq!(fields.servings, 1);
    assert_eq!(fields.steps, r#"["mix","bake"]"#);
}

#[test]
fn updates_leave_absent_fields_alone_but_reject_bad_ones() {
    let payload = RecipePayload {
        title: None,
        description: None,
        ingredients: None,
        steps: None,
        cooking_time: Some(45),
        servings: None,
        image: None,
        category_id: None,
    };
    let fields = validate_update(payload).unwrap();
    assert!(fields.title.is_none());
    assert_eq!(fields.cooking_time, Some(45));

    let payload = RecipePayload {
        title: Some("   ".into()),
        description: None,
        ingredients: Some(serde_json::json!("not a list")),
        steps: None,
        cooking_time: Some(0),
        servings: None,
        image: None,
        category_id: None,
    };
    let AppError::Validation(problems) = validate_update(payload).unwrap_err() else {
        panic!("expected a validation error");
    };
    let fields: Vec<&str> = problems.iter().map(|(field, _)| *field).collect();
    assert_eq!(fields, vec!["title", "ingredients", "cooking_time"]);
}
