// Copyright 2025 Remi Bernotavicius

//! Substring search over titles and descriptions with a three-part relevance
//! ranking: whether the title contains the query at all, how many times it
//! does, then how many times the description does.

use crate::database::models::Recipe;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
struct Score {
    title_contains: bool,
    title_hits: usize,
    description_hits: usize,
}

/// `needle` must already be lowercased. Occurrences are counted
/// non-overlapping. `None` means the recipe does not match at all.
fn score(needle: &str, title: &str, description: &str) -> Option<Score> {
    let title = title.to_lowercase();
    let description = description.to_lowercase();
    let title_hits = title.matches(needle).count();
    let description_hits = description.matches(needle).count();
    (title_hits > 0 || description_hits > 0).then_some(Score {
        title_contains: title_hits > 0,
        title_hits,
        description_hits,
    })
}

/// Keep only the recipes whose title or description contains the query,
/// case-insensitively. Used when the caller wants a non-relevance ordering on
/// the matching set.
pub fn filter_matching(recipes: Vec<Recipe>, query: &str) -> Vec<Recipe> {
    let needle = query.to_lowercase();
    recipes
        .into_iter()
        .filter(|recipe| score(&needle, &recipe.title, &recipe.description).is_some())
        .collect()
}

/// Filter to matching recipes and order them best match first. Equal scores
/// fall back to recipe id ascending so the ordering is stable across calls.
pub fn rank(recipes: Vec<Recipe>, query: &str) -> Vec<Recipe> {
    let needle = query.to_lowercase();
    let mut scored: Vec<(Score, Recipe)> = recipes
        .into_iter()
        .filter_map(|recipe| {
            score(&needle, &recipe.title, &recipe.description).map(|s| (s, recipe))
        })
        .collect();
    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b.cmp(score_a).then_with(|| a.id.cmp(&b.id))
    });
    scored.into_iter().map(|(_, recipe)| recipe).collect()
}

#[test]
fn scoring_is_case_insensitive() {
    let hit = score("chocolate", "Chocolate Cake", "").unwrap();
    assert!(hit.title_contains);
    assert_eq!(hit.title_hits, 1);

    let hit = score("crème", "Crème Brûlée", "").unwrap();
    assert!(hit.title_contains);

    assert!(score("chocolate", "Vanilla Cake", "plain and simple").is_none());
}

#[test]
fn occurrences_count_without_overlap() {
    let hit = score("aa", "aaaa", "").unwrap();
    assert_eq!(hit.title_hits, 2);

    let hit = score("cake", "Cake cake CAKE", "a cake for cake lovers").unwrap();
    assert_eq!(hit.title_hits, 3);
    assert_eq!(hit.description_hits, 2);
}

#[test]
fn description_only_matches_still_score() {
    let hit = score("cake", "Soup", "serve with cake").unwrap();
    assert!(!hit.title_contains);
    assert_eq!(hit.title_hits, 0);
    assert_eq!(hit.description_hits, 1);
}

#[test]
fn score_ordering_prefers_title_then_counts() {
    let twice_in_title = score("cake", "Cake Cake", "").unwrap();
    let once_in_title = score("cake", "Cake", "").unwrap();
    let title_and_rich_description = score("cake", "Cake", "cake cake cake").unwrap();
    let description_only = score("cake", "Soup", "cake cake cake cake").unwrap();

    assert!(twice_in_title > once_in_title);
    assert!(title_and_rich_description > once_in_title);
    assert!(once_in_title > description_only);
}

#[cfg(test)]
use crate::database::{models::NewRecipe, queries};

#[cfg(test)]
fn seeded_recipes(titles_and_descriptions: &[(&str, &str)]) -> Vec<Recipe> {
    let mut conn = queries::fixture_conn();
    let cook = queries::fixture_user(&mut conn, "cook");
    let desserts = queries::fixture_category(&mut conn, "Desserts", "desserts");
    let now = chrono::Utc::now().naive_utc();
    titles_and_descriptions
        .iter()
        .map(|(title, description)| {
            queries::create_recipe(
                &mut conn,
                &NewRecipe {
                    title,
                    description,
                    ingredients: "[]",
                    steps: "[]",
                    cooking_time: 30,
                    servings: 4,
                    image: None,
                    category_id: desserts.id,
                    author_id: cook.id,
                    featured: false,
                    created_at: now,
                    updated_at: now,
                },
            )
            .unwrap()
        })
        .collect()
}

#[test]
fn ranking_orders_best_match_first() {
    let recipes = seeded_recipes(&[
        ("Soup", "hearty, serve with cake on the side"),
        ("Cake", "plain"),
        ("Cake Cake", "all about cake"),
        ("Bread", "no match here"),
    ]);

    let ranked = rank(recipes, "cake");
    let titles: Vec<_> = ranked.iter().map(|recipe| recipe.title.as_str()).collect();
    assert_eq!(titles, vec!["Cake Cake", "Cake", "Soup"]);
}

#[test]
fn title_presence_dominates_description_frequency() {
    let recipes = seeded_recipes(&[
        ("Soup", "cake cake cake cake cake"),
        ("Cake Day", "a celebration"),
    ]);

    let ranked = rank(recipes, "cake");
    let titles: Vec<_> = ranked.iter().map(|recipe| recipe.title.as_str()).collect();
    assert_eq!(titles, vec!["Cake Day", "Soup"]);
}

#[test]
fn equal_scores_fall_back_to_id_order() {
    let recipes = seeded_recipes(&[("Cake", "same"), ("Cake", "same")]);
    let first_id = recipes[0].id;
    let second_id = recipes[1].id;

    let ranked = rank(recipes, "cake");
    assert_eq!(ranked[0].id, first_id.min(second_id));
    assert_eq!(ranked[1].id, first_id.max(second_id));
}

#[test]
fn filter_matching_keeps_unordered_matches() {
    let recipes = seeded_recipes(&[
        ("Cake", "plain"),
        ("Bread", "still no match"),
        ("Soup", "serve with CAKE"),
    ]);

    let matching = filter_matching(recipes, "Cake");
    let titles: Vec<_> = matching.iter().map(|recipe| recipe.title.as_str()).collect();
    assert_eq!(titles, vec!["Cake", "Soup"]);
}
