// Copyright 2025 Remi Bernotavicius

//! Ordering and filtering for recipe listings. Every listing endpoint funnels
//! through here so that sorting is deterministic and identical everywhere.

use crate::database::models::{Recipe, RecipeId};
use crate::database::queries::RatingSummary;
use derive_more::Display;
use std::collections::HashMap;
use std::str::FromStr as _;
use strum::EnumString;

#[derive(Debug, Display, Default, Hash, Copy, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SortKey {
    #[default]
    #[display("created_at")]
    CreatedAt,
    #[display("rating")]
    Rating,
    #[display("title")]
    Title,
    #[display("cooking_time")]
    CookingTime,
}

impl SortKey {
    /// Anything unrecognized, including an absent parameter, means
    /// `created_at`.
    pub fn parse(value: Option<&str>) -> Self {
        value.and_then(|v| Self::from_str(v).ok()).unwrap_or_default()
    }
}

#[derive(Debug, Display, Default, Hash, Copy, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SortOrder {
    #[display("asc")]
    Asc,
    #[default]
    #[display("desc")]
    Desc,
}

impl SortOrder {
    /// Only a literal `asc` sorts ascending; everything else is `desc`.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub sort: SortKey,
    pub order: SortOrder,
    pub featured_only: bool,
}

impl ListOptions {
    pub fn from_params(
        sort: Option<&str>,
        order: Option<&str>,
        featured: Option<&str>,
    ) -> Self {
        Self {
            sort: SortKey::parse(sort),
            order: SortOrder::parse(order),
            featured_only: featured == Some("true"),
        }
    }
}

/// Filter and order a recipe set. The comparator is the composite
/// (sort key, recipe id), reversed wholesale for descending, so for any input
/// the descending output is the exact reverse of the ascending one.
pub fn apply(
    mut recipes: Vec<Recipe>,
    summaries: &HashMap<RecipeId, RatingSummary>,
    options: &ListOptions,
) -> Vec<Recipe> {
    if options.featured_only {
        recipes.retain(|recipe| recipe.featured);
    }

    let mean = |recipe: &Recipe| {
        summaries
            .get(&recipe.id)
            .copied()
            .unwrap_or_default()
            .mean()
    };
    recipes.sort_by(|a, b| {
        let forward = match options.sort {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Rating => mean(a).total_cmp(&mean(b)),
            SortKey::Title => a.title.cmp(&b.title),
            SortKey::CookingTime => a.cooking_time.cmp(&b.cooking_time),
        }
        .then_with(|| a.id.cmp(&b.id));

        match options.order {
            SortOrder::Asc => forward,
            SortOrder::Desc => forward.reverse(),
        }
    });
    recipes
}

#[cfg(test)]
use crate::database::{self, models::NewRecipe, queries};

#[cfg(test)]
fn sample_recipe(
    conn: &mut database::Connection,
    author: crate::database::models::UserId,
    category: crate::database::models::CategoryId,
    title: &str,
    minutes: i32,
    created: chrono::NaiveDateTime,
) -> Recipe {
    queries::create_recipe(
        conn,
        &NewRecipe {
            title,
            description: "",
            ingredients: "[]",
            steps: "[]",
            cooking_time: minutes,
            servings: 4,
            image: None,
            category_id: category,
            author_id: author,
            featured: false,
            created_at: created,
            updated_at: created,
        },
    )
    .unwrap()
}

#[cfg(test)]
fn day(n: u32) -> chrono::NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2025, 6, n)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

#[test]
fn sort_key_parsing_falls_back_silently() {
    assert_eq!(SortKey::parse(Some("rating")), SortKey::Rating);
    assert_eq!(SortKey::parse(Some("title")), SortKey::Title);
    assert_eq!(SortKey::parse(Some("cooking_time")), SortKey::CookingTime);
    assert_eq!(SortKey::parse(Some("created_at")), SortKey::CreatedAt);
    assert_eq!(SortKey::parse(Some("bogus")), SortKey::CreatedAt);
    assert_eq!(SortKey::parse(Some("Rating")), SortKey::CreatedAt);
    assert_eq!(SortKey::parse(None), SortKey::CreatedAt);
}

#[test]
fn sort_order_parsing() {
    assert_eq!(SortOrder::parse(Some("asc")), SortOrder::Asc);
    assert_eq!(SortOrder::parse(Some("desc")), SortOrder::Desc);
    assert_eq!(SortOrder::parse(Some("ASC")), SortOrder::Desc);
    assert_eq!(SortOrder::parse(Some("upsidedown")), SortOrder::Desc);
    assert_eq!(SortOrder::parse(None), SortOrder::Desc);
}

#[test]
fn default_listing_is_newest_first() {
    let mut conn = queries::fixture_conn();
    let cook = queries::fixture_user(&mut conn, "cook");
    let desserts = queries::fixture_category(&mut conn, "Desserts", "desserts");
    sample_recipe(&mut conn, cook.id, desserts.id, "Oldest", 30, day(1));
    sample_recipe(&mut conn, cook.id, desserts.id, "Middle", 30, day(2));
    sample_recipe(&mut conn, cook.id, desserts.id, "Newest", 30, day(3));

    let recipes = queries::list_recipes(&mut conn).unwrap();
    let options = ListOptions::from_params(None, None, None);
    let ordered = apply(recipes, &HashMap::new(), &options);
    let titles: Vec<_> = ordered.iter().map(|recipe| recipe.title.as_str()).collect();
    assert_eq!(titles, vec!["Newest", "Middle", "Oldest"]);
}

#[test]
fn cooking_time_ordering_in_both_directions() {
    let mut conn = queries::fixture_conn();
    let cook = queries::fixture_user(&mut conn, "cook");
    let desserts = queries::fixture_category(&mut conn, "Desserts", "desserts");
    sample_recipe(&mut conn, cook.id, desserts.id, "Vanilla Cake", 45, day(1));
    sample_recipe(&mut conn, cook.id, desserts.id, "Chocolate Cake", 30, day(2));

    let recipes = queries::list_recipes(&mut conn).unwrap();
    let asc = ListOptions::from_params(Some("cooking_time"), Some("asc"), None);
    let ordered = apply(recipes.clone(), &HashMap::new(), &asc);
    let titles: Vec<_> = ordered.iter().map(|recipe| recipe.title.as_str()).collect();
    assert_eq!(titles, vec!["Chocolate Cake", "Vanilla Cake"]);

    let desc = ListOptions::from_params(Some("cooking_time"), Some("desc"), None);
    let ordered = apply(recipes, &HashMap::new(), &desc);
    let titles: Vec<_> = ordered.iter().map(|recipe| recipe.title.as_str()).collect();
    assert_eq!(titles, vec!["Vanilla Cake", "Chocolate Cake"]);
}

#[test]
fn descending_is_the_exact_reverse_of_ascending() {
    let mut conn = queries::fixture_conn();
    let cook = queries::fixture_user(&mut conn, "cook");
    let eater = queries::fixture_user(&mut conn, "eater");
    let desserts = queries::fixture_category(&mut conn, "Desserts", "desserts");
    // Deliberate ties on every key: equal times, equal titles, no ratings.
    let a = sample_recipe(&mut conn, cook.id, desserts.id, "Cake", 30, day(1));
    let b = sample_recipe(&mut conn, cook.id, desserts.id, "Cake", 30, day(1));
    let c = sample_recipe(&mut conn, cook.id, desserts.id, "Pie", 60, day(2));
    queries::upsert_rating(&mut conn, c.id, eater.id, 5).unwrap();

    let recipes = queries::list_recipes(&mut conn).unwrap();
    let summaries =
        queries::rating_summaries(&mut conn, &[a.id, b.id, c.id]).unwrap();

    for sort in ["created_at", "rating", "title", "cooking_time"] {
        let asc = ListOptions::from_params(Some(sort), Some("asc"), None);
        let desc = ListOptions::from_params(Some(sort), Some("desc"), None);
        let forward: Vec<RecipeId> = apply(recipes.clone(), &summaries, &asc)
            .iter()
            .map(|recipe| recipe.id)
            .collect();
        let mut backward: Vec<RecipeId> = apply(recipes.clone(), &summaries, &desc)
            .iter()
            .map(|recipe| recipe.id)
            .collect();
        backward.reverse();
        assert_eq!(forward, backward, "sort key {sort}");
    }
}

#[test]
fn rating_sort_treats_unrated_as_zero() {
    let mut conn = queries::fixture_conn();
    let cook = queries::fixture_user(&mut conn, "cook");
    let eater = queries::fixture_user(&mut conn, "eater");
    let desserts = queries::fixture_category(&mut conn, "Desserts", "desserts");
    let unrated = sample_recipe(&mut conn, cook.id, desserts.id, "Unrated", 30, day(1));
    let low = sample_recipe(&mut conn, cook.id, desserts.id, "Low", 30, day(2));
    let high = sample_recipe(&mut conn, cook.id, desserts.id, "High", 30, day(3));
    queries::upsert_rating(&mut conn, low.id, eater.id, 2).unwrap();
    queries::upsert_rating(&mut conn, high.id, eater.id, 5).unwrap();

    let recipes = queries::list_recipes(&mut conn).unwrap();
    let summaries =
        queries::rating_summaries(&mut conn, &[unrated.id, low.id, high.id]).unwrap();
    let options = ListOptions::from_params(Some("rating"), Some("asc"), None);
    let ordered = apply(recipes, &summaries, &options);
    let titles: Vec<_> = ordered.iter().map(|recipe| recipe.title.as_str()).collect();
    assert_eq!(titles, vec!["Unrated", "Low", "High"]);
}

#[test]
fn featured_filter_composes_with_sorting() {
    let mut conn = queries::fixture_conn();
    let cook = queries::fixture_user(&mut conn, "cook");
    let desserts = queries::fixture_category(&mut conn, "Desserts", "desserts");
    sample_recipe(&mut conn, cook.id, desserts.id, "Plain", 10, day(1));
    let starred = sample_recipe(&mut conn, cook.id, desserts.id, "Starred", 50, day(2));
    let quick = sample_recipe(&mut conn, cook.id, desserts.id, "Quick Star", 5, day(3));
    set_featured(&mut conn, &[starred.id, quick.id]);

    let recipes = queries::list_recipes(&mut conn).unwrap();
    let options = ListOptions::from_params(Some("cooking_time"), Some("asc"), Some("true"));
    let ordered = apply(recipes, &HashMap::new(), &options);
    let titles: Vec<_> = ordered.iter().map(|recipe| recipe.title.as_str()).collect();
    assert_eq!(titles, vec!["Quick Star", "Starred"]);
}

#[cfg(test)]
fn set_featured(conn: &mut database::Connection, ids: &[RecipeId]) {
    use crate::database::schema::recipes::dsl::*;
    use diesel::ExpressionMethods as _;
    use diesel::QueryDsl as _;
    use diesel::RunQueryDsl as _;

    diesel::update(recipes.filter(id.eq_any(ids.iter().copied())))
        .set(featured.eq(true))
        .execute(conn)
        .unwrap();
}
