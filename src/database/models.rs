// Copyright 2025 Remi Bernotavicius

use chrono::NaiveDateTime;
use derive_more::Display;
use diesel::associations::Identifiable;
use diesel::deserialize::Queryable;
use diesel::expression::Selectable;
use diesel::prelude::{AsChangeset, Insertable};
use diesel_derive_newtype::DieselNewType;
use serde::{Deserialize, Serialize};

#[derive(
    DieselNewType, Display, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Serialize,
    Deserialize,
)]
pub struct CategoryId(pub i32);

#[derive(Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::database::schema::categories)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::database::schema::categories)]
pub struct NewCategory<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub description: &'a str,
    pub image: Option<&'a str>,
}

#[derive(
    DieselNewType, Display, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Serialize,
    Deserialize,
)]
pub struct UserId(pub i32);

#[derive(Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::database::schema::users)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: String,
    pub avatar: Option<String>,
    pub date_joined: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::database::schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub bio: &'a str,
    pub avatar: Option<&'a str>,
    pub date_joined: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::database::schema::users)]
pub struct UserChanges<'a> {
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub bio: Option<&'a str>,
}

#[derive(
    DieselNewType, Display, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Serialize,
    Deserialize,
)]
pub struct RecipeId(pub i32);

#[derive(Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub description: String,
    pub ingredients: String,
    pub steps: String,
    pub cooking_time: i32,
    pub servings: i32,
    pub image: Option<String>,
    pub category_id: CategoryId,
    pub author_id: UserId,
    pub featured: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct NewRecipe<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub ingredients: &'a str,
    pub steps: &'a str,
    pub cooking_time: i32,
    pub servings: i32,
    pub image: Option<&'a str>,
    pub category_id: CategoryId,
    pub author_id: UserId,
    pub featured: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct RecipeChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub ingredients: Option<&'a str>,
    pub steps: Option<&'a str>,
    pub cooking_time: Option<i32>,
    pub servings: Option<i32>,
    pub image: Option<&'a str>,
    pub category_id: Option<CategoryId>,
    pub updated_at: NaiveDateTime,
}

#[derive(
    DieselNewType, Display, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Serialize,
    Deserialize,
)]
pub struct RatingId(pub i32);

#[derive(Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::database::schema::ratings)]
pub struct Rating {
    pub id: RatingId,
    pub recipe_id: RecipeId,
    pub user_id: UserId,
    pub value: i32,
    pub created_at: NaiveDateTime,
}

#[derive(
    DieselNewType, Display, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Serialize,
    Deserialize,
)]
pub struct CommentId(pub i32);

#[derive(Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::database::schema::comments)]
pub struct Comment {
    pub id: CommentId,
    pub recipe_id: RecipeId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::database::schema::comments)]
pub struct NewComment<'a> {
    pub recipe_id: RecipeId,
    pub user_id: UserId,
    pub content: &'a str,
    pub created_at: NaiveDateTime,
}

