//! Records mirrored from the Barfik REST API
//!
//! These types follow the backend's JSON shapes. List and detail
//! endpoints return slightly different field sets, so fields that only
//! one of them carries are defaulted.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Server-side primary key
pub type Id = u64;

/// Either a bare array or a DRF pagination envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Page(Page<T>),
    Bare(Vec<T>),
}

/// `{count, next, previous, results}` pagination envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn items(&self) -> &[T] {
        match self {
            ListResponse::Page(page) => &page.results,
            ListResponse::Bare(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            ListResponse::Page(page) => page.results,
            ListResponse::Bare(items) => items,
        }
    }

    /// Total number of records on the server (all pages)
    pub fn count(&self) -> u64 {
        match self {
            ListResponse::Page(page) => page.count,
            ListResponse::Bare(items) => items.len() as u64,
        }
    }

    pub fn has_next(&self) -> bool {
        matches!(self, ListResponse::Page(Page { next: Some(_), .. }))
    }
}

// ---------------------------------------------------------------------------
// Users and auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Access/refresh pair returned by `/api/auth/login/`
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}

/// Body returned by `/api/auth/refresh/`
#[derive(Clone, Deserialize)]
pub(crate) struct AccessToken {
    pub access: String,
}

// ---------------------------------------------------------------------------
// Dictionaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalType {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: Id,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub conversion_factor: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientCategory {
    pub id: Id,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

// ---------------------------------------------------------------------------
// Animals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub id: Id,
    #[serde(default)]
    pub owner: Option<Id>,
    #[serde(default)]
    pub owner_email: Option<String>,
    pub species: AnimalType,
    pub name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub weight_kg: Option<Decimal>,
    #[serde(default)]
    pub note: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalCreate {
    pub species_id: Id,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub weight_kg: Option<Decimal>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimalUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Diets and ingredients
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CookingMethod {
    Raw,
    Cooked,
}

impl std::fmt::Display for CookingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CookingMethod::Raw => write!(f, "raw"),
            CookingMethod::Cooked => write!(f, "cooked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Id,
    #[serde(default)]
    pub diet: Option<Id>,
    pub name: String,
    #[serde(default)]
    pub category: Option<IngredientCategory>,
    pub cooking_method: CookingMethod,
    pub unit: Unit,
    pub amount: Decimal,
    #[serde(default)]
    pub amount_in_base_unit: Option<Decimal>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientCreate {
    pub name: String,
    pub category_id: Option<Id>,
    pub cooking_method: CookingMethod,
    pub unit_id: Id,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooking_method: Option<CookingMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

/// A diet as returned by list, detail and create endpoints
///
/// The create endpoint echoes only `id`, `animal_id`, dates and
/// description, so the computed fields default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diet {
    pub id: Id,
    #[serde(alias = "animal_id")]
    pub animal: Id,
    #[serde(default)]
    pub animal_name: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub total_daily_mass: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients_count: Option<u32>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Diet {
    /// Open-ended diets have no end date
    pub fn is_open_ended(&self) -> bool {
        self.end_date.is_none()
    }

    /// Whether the diet covers the given day
    pub fn covers(&self, day: NaiveDate) -> bool {
        day >= self.start_date && self.end_date.is_none_or(|end| day <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietCreate {
    pub animal_id: Id,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DietUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// `Some(None)` clears the end date, making the diet open-ended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Shopping lists
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub id: Id,
    pub ingredient_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub unit: Option<Unit>,
    pub total_amount: Decimal,
    #[serde(default)]
    pub is_checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietInfo {
    pub id: Id,
    pub animal_name: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: Id,
    #[serde(default)]
    pub created_by: Option<Id>,
    #[serde(default)]
    pub title: String,
    pub days_count: u32,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub diets: Vec<Id>,
    #[serde(default)]
    pub diets_info: Vec<DietInfo>,
    #[serde(default)]
    pub items: Vec<ShoppingListItem>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListCreate {
    pub title: String,
    pub diets: Vec<Id>,
    pub days_count: u32,
}

// ---------------------------------------------------------------------------
// Collaborations
// ---------------------------------------------------------------------------

/// Access level granted to a collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "EDIT")]
    Edit,
    #[serde(rename = "READ_ONLY", alias = "VIEW")]
    View,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collaboration {
    pub id: Id,
    pub animal: Id,
    #[serde(default)]
    pub animal_name: String,
    pub user: Id,
    #[serde(default)]
    pub user_email: String,
    pub permission: Permission,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationCreate {
    pub user: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub animals_count: u32,
    pub active_diets_count: u32,
    pub expiring_diets_count: u32,
    pub active_shopping_lists_count: u32,
    pub completed_shopping_lists_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalWithoutDiet {
    pub id: Id,
    pub name: String,
    pub species: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringDiet {
    pub id: Id,
    pub animal_id: Id,
    pub animal_name: String,
    pub end_date: NaiveDate,
    pub days_left: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OldShoppingList {
    pub id: Id,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub days_old: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardAlerts {
    #[serde(default)]
    pub animals_without_diet: Vec<AnimalWithoutDiet>,
    #[serde(default)]
    pub expiring_diets: Vec<ExpiringDiet>,
    #[serde(default)]
    pub old_shopping_lists: Vec<OldShoppingList>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    #[serde(default)]
    pub alerts: DashboardAlerts,
}

fn default_true() -> bool {
    true
}
