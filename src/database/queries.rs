// Copyright 2025 Remi Bernotavicius

use crate::database;
use crate::database::models::{
    Category, CategoryId, Comment, CommentId, NewCategory, NewComment, NewRecipe, NewUser, Rating,
    RecipeId, User, UserChanges, UserId,
};
use crate::database::models::{Recipe, RecipeChanges};
use diesel::prelude::OptionalExtension as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use std::collections::HashMap;

pub fn list_categories(conn: &mut database::Connection) -> QueryResult<Vec<Category>> {
    use database::schema::categories::dsl::*;

    categories
        .select(Category::as_select())
        .order(name.asc())
        .load(conn)
}

pub fn find_category(
    conn: &mut database::Connection,
    lookup_id: CategoryId,
) -> QueryResult<Option<Category>> {
    use database::schema::categories::dsl::*;

    categories
        .select(Category::as_select())
        .filter(id.eq(lookup_id))
        .first(conn)
        .optional()
}

pub fn find_category_by_slug(
    conn: &mut database::Connection,
    lookup_slug: &str,
) -> QueryResult<Option<Category>> {
    use database::schema::categories::dsl::*;

    categories
        .select(Category::as_select())
        .filter(slug.eq(lookup_slug))
        .first(conn)
        .optional()
}

pub fn create_category(
    conn: &mut database::Connection,
    new_category: &NewCategory,
) -> QueryResult<Category> {
    use database::schema::categories::dsl::*;
    use diesel::insert_into;

    insert_into(categories)
        .values(new_category)
        .returning(Category::as_returning())
        .get_result(conn)
}

pub fn delete_category(conn: &mut database::Connection, delete_id: CategoryId) -> QueryResult<()> {
    use database::schema::categories::dsl::*;
    use diesel::delete;

    delete(categories.filter(id.eq(delete_id))).execute(conn)?;
    Ok(())
}

pub fn load_categories(
    conn: &mut database::Connection,
    ids: &[CategoryId],
) -> QueryResult<HashMap<CategoryId, Category>> {
    use database::schema::categories::dsl::*;

    let rows: Vec<Category> = categories
        .select(Category::as_select())
        .filter(id.eq_any(ids.iter().copied()))
        .load(conn)?;
    Ok(rows.into_iter().map(|c| (c.id, c)).collect())
}

/// Number of recipes in each of the given categories, one bulk query.
pub fn category_recipe_counts(
    conn: &mut database::Connection,
    ids: &[CategoryId],
) -> QueryResult<HashMap<CategoryId, i64>> {
    use database::schema::recipes::dsl::*;

    let rows: Vec<CategoryId> = recipes
        .select(category_id)
        .filter(category_id.eq_any(ids.iter().copied()))
        .load(conn)?;

    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(row).or_insert(0) += 1;
    }
    Ok(counts)
}

pub fn list_recipes(conn: &mut database::Connection) -> QueryResult<Vec<Recipe>> {
    use database::schema::recipes::dsl::*;

    recipes
        .select(Recipe::as_select())
        .order(id.asc())
        .load(conn)
}

pub fn list_recipes_in_category(
    conn: &mut database::Connection,
    in_category: CategoryId,
) -> QueryResult<Vec<Recipe>> {
    use database::schema::recipes::dsl::*;

    recipes
        .select(Recipe::as_select())
        .filter(category_id.eq(in_category))
        .order(id.asc())
        .load(conn)
}

pub fn find_recipe(
    conn: &mut database::Connection,
    lookup_id: RecipeId,
) -> QueryResult<Option<Recipe>> {
    use database::schema::recipes::dsl::*;

    recipes
        .select(Recipe::as_select())
        .filter(id.eq(lookup_id))
        .first(conn)
        .optional()
}

pub fn create_recipe(
    conn: &mut database::Connection,
    new_recipe: &NewRecipe,
) -> QueryResult<Recipe> {
    use database::schema::recipes::dsl::*;
    use diesel::insert_into;

    insert_into(recipes)
        .values(new_recipe)
        .returning(Recipe::as_returning())
        .get_result(conn)
}

pub fn update_recipe(
    conn: &mut database::Connection,
    edit_id: RecipeId,
    changes: &RecipeChanges,
) -> QueryResult<Recipe> {
    use database::schema::recipes::dsl::*;
    use diesel::update;

    update(recipes.filter(id.eq(edit_id)))
        .set(changes)
        .execute(conn)?;
    recipes
        .select(Recipe::as_select())
        .filter(id.eq(edit_id))
        .first(conn)
}

pub fn delete_recipe(conn: &mut database::Connection, delete_id: RecipeId) -> QueryResult<()> {
    use database::schema::recipes::dsl::*;
    use diesel::delete;

    delete(recipes.filter(id.eq(delete_id))).execute(conn)?;
    Ok(())
}

/// One rating per (recipe, user): a repeat submission replaces the value in a
/// single statement and keeps the row's original created_at.
pub fn upsert_rating(
    conn: &mut database::Connection,
    rate_recipe_id: RecipeId,
    rate_user_id: UserId,
    new_value: i32,
) -> QueryResult<()> {
    use database::schema::ratings::dsl::*;
    use diesel::insert_into;

    insert_into(ratings)
        .values((
            recipe_id.eq(rate_recipe_id),
            user_id.eq(rate_user_id),
            value.eq(new_value),
            created_at.eq(chrono::Utc::now().naive_utc()),
        ))
        .on_conflict((recipe_id, user_id))
        .do_update()
        .set(value.eq(new_value))
        .execute(conn)?;
    Ok(())
}

pub fn find_rating(
    conn: &mut database::Connection,
    lookup_recipe_id: RecipeId,
    lookup_user_id: UserId,
) -> QueryResult<Option<Rating>> {
    use database::schema::ratings::dsl::*;

    ratings
        .select(Rating::as_select())
        .filter(recipe_id.eq(lookup_recipe_id))
        .filter(user_id.eq(lookup_user_id))
        .first(conn)
        .optional()
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub total: i64,
    pub count: i64,
}

impl RatingSummary {
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total as f64 / self.count as f64
        }
    }
}

/// Rating totals and counts for the given recipes, one bulk query. Recipes
/// with no ratings are simply absent; `RatingSummary::default()` stands in
/// for them.
pub fn rating_summaries(
    conn: &mut database::Connection,
    ids: &[RecipeId],
) -> QueryResult<HashMap<RecipeId, RatingSummary>> {
    use database::schema::ratings::dsl::*;

    let rows: Vec<(RecipeId, i32)> = ratings
        .select((recipe_id, value))
        .filter(recipe_id.eq_any(ids.iter().copied()))
        .load(conn)?;

    let mut summaries: HashMap<RecipeId, RatingSummary> = HashMap::new();
    for (row_recipe_id, row_value) in rows {
        let summary = summaries.entry(row_recipe_id).or_default();
        summary.total += i64::from(row_value);
        summary.count += 1;
    }
    Ok(summaries)
}

/// The given user's own rating of each of the given recipes.
pub fn ratings_by_user(
    conn: &mut database::Connection,
    rated_by: UserId,
    ids: &[RecipeId],
) -> QueryResult<HashMap<RecipeId, i32>> {
    use database::schema::ratings::dsl::*;

    let rows: Vec<(RecipeId, i32)> = ratings
        .select((recipe_id, value))
        .filter(user_id.eq(rated_by))
        .filter(recipe_id.eq_any(ids.iter().copied()))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}

pub fn create_comment(
    conn: &mut database::Connection,
    new_comment: &NewComment,
) -> QueryResult<Comment> {
    use database::schema::comments::dsl::*;
    use diesel::insert_into;

    insert_into(comments)
        .values(new_comment)
        .returning(Comment::as_returning())
        .get_result(conn)
}

/// Comments for the given recipes, newest first.
pub fn comments_for_recipes(
    conn: &mut database::Connection,
    ids: &[RecipeId],
) -> QueryResult<Vec<Comment>> {
    use database::schema::comments::dsl::*;

    comments
        .select(Comment::as_select())
        .filter(recipe_id.eq_any(ids.iter().copied()))
        .order((created_at.desc(), id.desc()))
        .load(conn)
}

/// At most one like per (comment, user); a duplicate is a unique violation.
pub fn like_comment(
    conn: &mut database::Connection,
    like_comment_id: CommentId,
    like_user_id: UserId,
) -> QueryResult<()> {
    use database::schema::comment_likes::dsl::*;
    use diesel::insert_into;

    insert_into(comment_likes)
        .values((
            comment_id.eq(like_comment_id),
            user_id.eq(like_user_id),
            created_at.eq(chrono::Utc::now().naive_utc()),
        ))
        .execute(conn)?;
    Ok(())
}

pub fn comment_like_counts(
    conn: &mut database::Connection,
    ids: &[CommentId],
) -> QueryResult<HashMap<CommentId, i64>> {
    use database::schema::comment_likes::dsl::*;

    let rows: Vec<CommentId> = comment_likes
        .select(comment_id)
        .filter(comment_id.eq_any(ids.iter().copied()))
        .load(conn)?;

    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(row).or_insert(0) += 1;
    }
    Ok(counts)
}

pub fn create_user(conn: &mut database::Connection, new_user: &NewUser) -> QueryResult<User> {
    use database::schema::users::dsl::*;
    use diesel::insert_into;

    insert_into(users)
        .values(new_user)
        .returning(User::as_returning())
        .get_result(conn)
}

pub fn find_user(conn: &mut database::Connection, lookup_id: UserId) -> QueryResult<Option<User>> {
    use database::schema::users::dsl::*;

    users
        .select(User::as_select())
        .filter(id.eq(lookup_id))
        .first(conn)
        .optional()
}

pub fn find_user_by_email(
    conn: &mut database::Connection,
    lookup_email: &str,
) -> QueryResult<Option<User>> {
    use database::schema::users::dsl::*;

    users
        .select(User::as_select())
        .filter(email.eq(lookup_email))
        .first(conn)
        .optional()
}

pub fn load_users(
    conn: &mut database::Connection,
    ids: &[UserId],
) -> QueryResult<HashMap<UserId, User>> {
    use database::schema::users::dsl::*;

    let rows = users
        .select(User::as_select())
        .filter(id.eq_any(ids.iter().copied()))
        .load(conn)?;
    Ok(rows.into_iter().map(|user: User| (user.id, user)).collect())
}

pub fn update_user(
    conn: &mut database::Connection,
    edit_id: UserId,
    changes: &UserChanges,
) -> QueryResult<User> {
    use database::schema::users::dsl::*;
    use diesel::update;

    update(users.filter(id.eq(edit_id)))
        .set(changes)
        .execute(conn)?;
    users
        .select(User::as_select())
        .filter(id.eq(edit_id))
        .first(conn)
}

pub fn recipes_count_for_user(
    conn: &mut database::Connection,
    author: UserId,
) -> QueryResult<i64> {
    use database::schema::recipes::dsl::*;

    recipes
        .filter(author_id.eq(author))
        .count()
        .get_result(conn)
}

#[cfg(test)]
pub fn fixture_conn() -> database::Connection {
    database::establish_connection(":memory:").unwrap()
}

#[cfg(test)]
pub fn fixture_user(conn: &mut database::Connection, name: &str) -> User {
    let user_email = format!("{name}@example.com");
    create_user(
        conn,
        &NewUser {
            username: name,
            email: &user_email,
            password_hash: "x",
            bio: "",
            avatar: None,
            date_joined: chrono::Utc::now().naive_utc(),
        },
    )
    .unwrap()
}

#[cfg(test)]
pub fn fixture_category(conn: &mut database::Connection, name: &str, slug: &str) -> Category {
    create_category(
        conn,
        &NewCategory {
            name,
            slug,
            description: "",
            image: None,
        },
    )
    .unwrap()
}

#[cfg(test)]
pub fn fixture_recipe(
    conn: &mut database::Connection,
    author: UserId,
    category: CategoryId,
    title: &str,
) -> Recipe {
    let now = chrono::Utc::now().naive_utc();
    create_recipe(
        conn,
        &NewRecipe {
            title,
            description: "",
            ingredients: "[]",
            steps: "[]",
            cooking_time: 30,
            servings: 4,
            image: None,
            category_id: category,
            author_id: author,
            featured: false,
            created_at: now,
            updated_at: now,
        },
    )
    .unwrap()
}

#[test]
fn category_counts_are_bulk_and_sparse() {
    use maplit::hashmap;

    let mut conn = fixture_conn();
    let cook = fixture_user(&mut conn, "cook");
    let desserts = fixture_category(&mut conn, "Desserts", "desserts");
    let soups = fixture_category(&mut conn, "Soups", "soups");
    fixture_recipe(&mut conn, cook.id, desserts.id, "Chocolate Cake");
    fixture_recipe(&mut conn, cook.id, desserts.id, "Vanilla Cake");

    let counts = category_recipe_counts(&mut conn, &[desserts.id, soups.id]).unwrap();
    assert_eq!(counts, hashmap! { desserts.id => 2 });
}

#[test]
fn rating_summaries_mean() {
    let mut conn = fixture_conn();
    let cook = fixture_user(&mut conn, "cook");
    let eater_a = fixture_user(&mut conn, "eater_a");
    let eater_b = fixture_user(&mut conn, "eater_b");
    let eater_c = fixture_user(&mut conn, "eater_c");
    let desserts = fixture_category(&mut conn, "Desserts", "desserts");
    let rated = fixture_recipe(&mut conn, cook.id, desserts.id, "Chocolate Cake");
    let unrated = fixture_recipe(&mut conn, cook.id, desserts.id, "Vanilla Cake");

    upsert_rating(&mut conn, rated.id, eater_a.id, 4).unwrap();
    upsert_rating(&mut conn, rated.id, eater_b.id, 5).unwrap();
    upsert_rating(&mut conn, rated.id, eater_c.id, 5).unwrap();

    let summaries = rating_summaries(&mut conn, &[rated.id, unrated.id]).unwrap();
    assert_eq!(summaries[&rated.id].count, 3);
    assert_eq!(summaries[&rated.id].mean(), 14.0 / 3.0);
    assert!(!summaries.contains_key(&unrated.id));
    assert_eq!(summaries.get(&unrated.id).copied().unwrap_or_default().mean(), 0.0);
}

#[test]
fn upsert_rating_replaces_in_place() {
    let mut conn = fixture_conn();
    let cook = fixture_user(&mut conn, "cook");
    let eater = fixture_user(&mut conn, "eater");
    let desserts = fixture_category(&mut conn, "Desserts", "desserts");
    let recipe = fixture_recipe(&mut conn, cook.id, desserts.id, "Chocolate Cake");

    upsert_rating(&mut conn, recipe.id, eater.id, 3).unwrap();
    let first = find_rating(&mut conn, recipe.id, eater.id).unwrap().unwrap();
    assert_eq!(first.value, 3);

    upsert_rating(&mut conn, recipe.id, eater.id, 5).unwrap();
    let second = find_rating(&mut conn, recipe.id, eater.id).unwrap().unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.value, 5);
    assert_eq!(second.created_at, first.created_at);

    let summaries = rating_summaries(&mut conn, &[recipe.id]).unwrap();
    assert_eq!(summaries[&recipe.id].count, 1);
    assert_eq!(summaries[&recipe.id].total, 5);
}

#[test]
fn ratings_by_user_only_sees_own() {
    use maplit::hashmap;

    let mut conn = fixture_conn();
    let cook = fixture_user(&mut conn, "cook");
    let other = fixture_user(&mut conn, "other");
    let desserts = fixture_category(&mut conn, "Desserts", "desserts");
    let recipe = fixture_recipe(&mut conn, cook.id, desserts.id, "Chocolate Cake");

    upsert_rating(&mut conn, recipe.id, cook.id, 2).unwrap();
    upsert_rating(&mut conn, recipe.id, other.id, 5).unwrap();

    let own = ratings_by_user(&mut conn, cook.id, &[recipe.id]).unwrap();
    assert_eq!(own, hashmap! { recipe.id => 2 });
}

#[test]
fn comments_come_back_newest_first() {
    let mut conn = fixture_conn();
    let cook = fixture_user(&mut conn, "cook");
    let desserts = fixture_category(&mut conn, "Desserts", "desserts");
    let recipe = fixture_recipe(&mut conn, cook.id, desserts.id, "Chocolate Cake");

    let base = chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    for (text, offset) in [("first", 0), ("second", 60), ("third", 120)] {
        create_comment(
            &mut conn,
            &NewComment {
                recipe_id: recipe.id,
                user_id: cook.id,
                content: text,
                created_at: base + chrono::Duration::seconds(offset),
            },
        )
        .unwrap();
    }

    let ordered = comments_for_recipes(&mut conn, &[recipe.id]).unwrap();
    let contents: Vec<_> = ordered.iter().map(|comment| comment.content.as_str()).collect();
    assert_eq!(contents, vec!["third", "second", "first"]);
}

#[test]
fn duplicate_comment_like_is_rejected() {
    let mut conn = fixture_conn();
    let cook = fixture_user(&mut conn, "cook");
    let fan = fixture_user(&mut conn, "fan");
    let desserts = fixture_category(&mut conn, "Desserts", "desserts");
    let recipe = fixture_recipe(&mut conn, cook.id, desserts.id, "Chocolate Cake");
    let comment = create_comment(
        &mut conn,
        &NewComment {
            recipe_id: recipe.id,
            user_id: cook.id,
            content: "delicious",
            created_at: chrono::Utc::now().naive_utc(),
        },
    )
    .unwrap();

    like_comment(&mut conn, comment.id, fan.id).unwrap();
    assert!(like_comment(&mut conn, comment.id, fan.id).is_err());

    let counts = comment_like_counts(&mut conn, &[comment.id]).unwrap();
    assert_eq!(counts[&comment.id], 1);
}

#[test]
fn deleting_a_recipe_cascades() {
    let mut conn = fixture_conn();
    let cook = fixture_user(&mut conn, "cook");
    let desserts = fixture_category(&mut conn, "Desserts", "desserts");
    let recipe = fixture_recipe(&mut conn, cook.id, desserts.id, "Chocolate Cake");

    upsert_rating(&mut conn, recipe.id, cook.id, 4).unwrap();
    create_comment(
        &mut conn,
        &NewComment {
            recipe_id: recipe.id,
            user_id: cook.id,
            content: "note to self",
            created_at: chrono::Utc::now().naive_utc(),
        },
    )
    .unwrap();

    delete_recipe(&mut conn, recipe.id).unwrap();
    assert!(find_recipe(&mut conn, recipe.id).unwrap().is_none());
    assert!(rating_summaries(&mut conn, &[recipe.id]).unwrap().is_empty());
    assert!(comments_for_recipes(&mut conn, &[recipe.id]).unwrap().is_empty());
}

#[test]
fn deleting_a_category_cascades_to_recipes() {
    let mut conn = fixture_conn();
    let cook = fixture_user(&mut conn, "cook");
    let desserts = fixture_category(&mut conn, "Desserts", "desserts");
    let recipe = fixture_recipe(&mut conn, cook.id, desserts.id, "Chocolate Cake");

    delete_category(&mut conn, desserts.id).unwrap();
    assert!(find_recipe(&mut conn, recipe.id).unwrap().is_none());
}

#[test]
fn user_lookup_by_email() {
    let mut conn = fixture_conn();
    let user = fixture_user(&mut conn, "cook");

    let found = find_user_by_email(&mut conn, "cook@example.com").unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert!(find_user_by_email(&mut conn, "nobody@example.com")
        .unwrap()
        .is_none());
}
