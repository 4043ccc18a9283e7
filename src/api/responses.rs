//! JSON shapes the API hands out, assembled from database rows with bulk
//! lookups so a page of recipes costs a fixed number of queries.

use crate::database;
use crate::database::models::{
    Category, CategoryId, Comment, CommentId, Recipe, RecipeId, User, UserId,
};
use crate::database::queries::{self, RatingSummary};
use chrono::NaiveDateTime;
use diesel::QueryResult;
use serde::Serialize;
use std::collections::HashMap;

/// Stored media paths are served under `/media/`.
fn media_url(path: Option<&str>) -> Option<String> {
    path.map(|path| format!("/media/{path}"))
}

/// Ingredients and steps are stored as serialized JSON text and rendered
/// back as the structures the client submitted.
fn stored_json(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
}

#[derive(Debug, Serialize)]
pub struct UserJson {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl UserJson {
    pub fn new(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar_url: media_url(user.avatar.as_deref()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileJson {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub date_joined: NaiveDateTime,
    pub recipes_count: i64,
}

pub fn profile_json(conn: &mut database::Connection, user: &User) -> QueryResult<ProfileJson> {
    Ok(ProfileJson {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        bio: user.bio.clone(),
        avatar_url: media_url(user.avatar.as_deref()),
        date_joined: user.date_joined,
        recipes_count: queries::recipes_count_for_user(conn, user.id)?,
    })
}

#[derive(Debug, Serialize)]
pub struct CategoryJson {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub recipes_count: i64,
}

fn category_json(category: &Category, recipes_count: i64) -> CategoryJson {
    CategoryJson {
        id: category.id,
        name: category.name.clone(),
        slug: category.slug.clone(),
        description: category.description.clone(),
        image: category.image.clone(),
        image_url: media_url(category.image.as_deref()),
        recipes_count,
    }
}

pub fn category_detail_json(
    conn: &mut database::Connection,
    category: &Category,
) -> QueryResult<CategoryJson> {
    let counts = queries::category_recipe_counts(conn, &[category.id])?;
    Ok(category_json(
        category,
        counts.get(&category.id).copied().unwrap_or(0),
    ))
}

pub fn categories_json(
    conn: &mut database::Connection,
    categories: &[Category],
) -> QueryResult<Vec<CategoryJson>> {
    let ids: Vec<CategoryId> = categories.iter().map(|category| category.id).collect();
    let counts = queries::category_recipe_counts(conn, &ids)?;
    Ok(categories
        .iter()
        .map(|category| category_json(category, counts.get(&category.id).copied().unwrap_or(0)))
        .collect())
}

#[derive(Debug, Serialize)]
pub struct CommentJson {
    pub id: CommentId,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub user: UserJson,
    pub likes_count: i64,
}

pub fn comment_json(comment: Comment, user: &User, likes_count: i64) -> CommentJson {
    CommentJson {
        id: comment.id,
        content: comment.content,
        created_at: comment.created_at,
        user: UserJson::new(user),
        likes_count,
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeJson {
    pub id: RecipeId,
    pub title: String,
    pub description: String,
    pub ingredients: serde_json::Value,
    pub steps: serde_json::Value,
    pub cooking_time: i32,
    pub servings: i32,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub category: CategoryJson,
    pub author: UserJson,
    pub featured: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub rating: f64,
    pub reviews_count: i64,
    pub user_rating: Option<i32>,
    pub comments: Vec<CommentJson>,
}

/// Render the given recipes in their given order. Categories, authors,
/// comment threads, like counts, and the viewer's own ratings are each
/// fetched once for the whole batch.
pub fn recipes_json(
    conn: &mut database::Connection,
    recipes: &[Recipe],
    summaries: &HashMap<RecipeId, RatingSummary>,
    viewer: Option<UserId>,
) -> QueryResult<Vec<RecipeJson>> {
    let recipe_ids: Vec<RecipeId> = recipes.iter().map(|recipe| recipe.id).collect();
    let category_ids: Vec<CategoryId> = recipes.iter().map(|recipe| recipe.category_id).collect();

    let categories = queries::load_categories(conn, &category_ids)?;
    let category_counts = queries::category_recipe_counts(conn, &category_ids)?;

    let comments = queries::comments_for_recipes(conn, &recipe_ids)?;
    let comment_ids: Vec<CommentId> = comments.iter().map(|comment| comment.id).collect();
    let like_counts = queries::comment_like_counts(conn, &comment_ids)?;

    let mut user_ids: Vec<UserId> = recipes.iter().map(|recipe| recipe.author_id).collect();
    user_ids.extend(comments.iter().map(|comment| comment.user_id));
    let users = queries::load_users(conn, &user_ids)?;

    let viewer_ratings = match viewer {
        Some(viewer) => queries::ratings_by_user(conn, viewer, &recipe_ids)?,
        None => HashMap::new(),
    };

    // Group the already newest-first comments by recipe.
    let mut comments_by_recipe: HashMap<RecipeId, Vec<CommentJson>> = HashMap::new();
    for comment in comments {
        let user = users
            .get(&comment.user_id)
            .ok_or(diesel::result::Error::NotFound)?;
        let likes = like_counts.get(&comment.id).copied().unwrap_or(0);
        comments_by_recipe
            .entry(comment.recipe_id)
            .or_default()
            .push(comment_json(comment, user, likes));
    }

    recipes
        .iter()
        .map(|recipe| {
            let category = categories
                .get(&recipe.category_id)
                .ok_or(diesel::result::Error::NotFound)?;
            let author = users
                .get(&recipe.author_id)
                .ok_or(diesel::result::Error::NotFound)?;
            let summary = summaries.get(&recipe.id).copied().unwrap_or_default();
            Ok(RecipeJson {
                id: recipe.id,
                title: recipe.title.clone(),
                description: recipe.description.clone(),
                ingredients: stored_json(&recipe.ingredients),
                steps: stored_json(&recipe.steps),
                cooking_time: recipe.cooking_time,
                servings: recipe.servings,
                image: recipe.image.clone(),
                image_url: media_url(recipe.image.as_deref()),
                category: category_json(
                    category,
                    category_counts
                        .get(&recipe.category_id)
                        .copied()
                        .unwrap_or(0),
                ),
                author: UserJson::new(author),
                featured: recipe.featured,
                created_at: recipe.created_at,
                updated_at: recipe.updated_at,
                rating: summary.mean(),
                reviews_count: summary.count,
                user_rating: viewer_ratings.get(&recipe.id).copied(),
                comments: comments_by_recipe.remove(&recipe.id).unwrap_or_default(),
            })
        })
        .collect()
}

pub fn recipe_json(
    conn: &mut database::Connection,
    recipe: &Recipe,
    viewer: Option<UserId>,
) -> QueryResult<RecipeJson> {
    let summaries = queries::rating_summaries(conn, &[recipe.id])?;
    let mut rendered = recipes_json(conn, std::slice::from_ref(recipe), &summaries, viewer)?;
    rendered.pop().ok_or(diesel::result::Error::NotFound)
}

#[test]
fn recipe_assembly_pulls_the_whole_picture() {
    use crate::database::models::NewComment;

    let mut conn = queries::fixture_conn();
    let cook = queries::fixture_user(&mut conn, "cook");
    let eater = queries::fixture_user(&mut conn, "eater");
    let desserts = queries::fixture_category(&mut conn, "Desserts", "desserts");
    let cake = queries::fixture_recipe(&mut conn, cook.id, desserts.id, "Chocolate Cake");
    queries::fixture_recipe(&mut conn, cook.id, desserts.id, "Vanilla Cake");

    queries::upsert_rating(&mut conn, cake.id, eater.id, 4).unwrap();
    let comment = queries::create_comment(
        &mut conn,
        &NewComment {
            recipe_id: cake.id,
            user_id: eater.id,
            content: "Perfect crumb",
            created_at: chrono::Utc::now().naive_utc(),
        },
    )
    .unwrap();
    queries::like_comment(&mut conn, comment.id, cook.id).unwrap();

    let rendered = recipe_json(&mut conn, &cake, Some(eater.id)).unwrap();
    assert_eq!(rendered.title, "Chocolate Cake");
    assert_eq!(rendered.category.slug, "desserts");
    assert_eq!(rendered.category.recipes_count, 2);
    assert_eq!(rendered.author.username, "cook");
    assert_eq!(rendered.rating, 4.0);
    assert_eq!(rendered.reviews_count, 1);
    assert_eq!(rendered.user_rating, Some(4));
    assert_eq!(rendered.comments.len(), 1);
    assert_eq!(rendered.comments[0].content, "Perfect crumb");
    assert_eq!(rendered.comments[0].user.username, "eater");
    assert_eq!(rendered.comments[0].likes_count, 1);
    assert!(rendered.image_url.is_none());
}

#[test]
fn anonymous_viewers_have_no_user_rating() {
    let mut conn = queries::fixture_conn();
    let cook = queries::fixture_user(&mut conn, "cook");
    let eater = queries::fixture_user(&mut conn, "eater");
    let desserts = queries::fixture_category(&mut conn, "Desserts", "desserts");
    let cake = queries::fixture_recipe(&mut conn, cook.id, desserts.id, "Chocolate Cake");
    queries::upsert_rating(&mut conn, cake.id, eater.id, 5).unwrap();

    let rendered = recipe_json(&mut conn, &cake, None).unwrap();
    assert_eq!(rendered.rating, 5.0);
    assert_eq!(rendered.user_rating, None);

    let rendered = recipe_json(&mut conn, &cake, Some(cook.id)).unwrap();
    assert_eq!(rendered.user_rating, None);
}

#[test]
fn unrated_recipes_render_zero() {
    let mut conn = queries::fixture_conn();
    let cook = queries::fixture_user(&mut conn, "cook");
    let desserts = queries::fixture_category(&mut conn, "Desserts", "desserts");
    let cake = queries::fixture_recipe(&mut conn, cook.id, desserts.id, "Chocolate Cake");

    let rendered = recipe_json(&mut conn, &cake, None).unwrap();
    assert_eq!(rendered.rating, 0.0);
    assert_eq!(rendered.reviews_count, 0);
    assert!(rendered.comments.is_empty());
}
