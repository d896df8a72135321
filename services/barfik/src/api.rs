//! Typed operations over the Barfik REST endpoints
//!
//! Each method maps to one HTTP call. Caching and invalidation live one
//! layer up in [`crate::queries`].

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::client::{ApiClient, ApiRequest};
use crate::error::Result;
use crate::models::{
    AccessToken, Animal, AnimalCreate, AnimalType, AnimalUpdate, Collaboration,
    CollaborationCreate, CookingMethod, Dashboard, Diet, DietCreate, DietUpdate, Id, Ingredient,
    IngredientCategory, IngredientCreate, IngredientUpdate, ListResponse, Permission,
    RegisterRequest, ShoppingList, ShoppingListCreate, TokenPair, Unit, User, UserUpdate,
};

/// Query parameters of `GET /api/animals/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AnimalFilter {
    pub search: Option<String>,
    pub species_id: Option<Id>,
    pub page: Option<u32>,
    pub active: Option<bool>,
}

impl AnimalFilter {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "search", self.search.as_ref());
        push(&mut pairs, "species_id", self.species_id);
        push(&mut pairs, "page", self.page);
        push(&mut pairs, "active", self.active);
        pairs
    }
}

/// Query parameters of `GET /api/diets/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DietFilter {
    pub animal_id: Option<Id>,
    pub active: Option<bool>,
    pub page: Option<u32>,
}

impl DietFilter {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "animal_id", self.animal_id);
        push(&mut pairs, "active", self.active);
        push(&mut pairs, "page", self.page);
        pairs
    }
}

/// Query parameters of `GET /api/diets/{id}/ingredients/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IngredientFilter {
    pub category_id: Option<Id>,
    pub cooking_method: Option<CookingMethod>,
}

impl IngredientFilter {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "category_id", self.category_id);
        push(&mut pairs, "cooking_method", self.cooking_method);
        pairs
    }
}

/// Query parameters of `GET /api/shopping-lists/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShoppingListFilter {
    pub is_completed: Option<bool>,
    pub page: Option<u32>,
}

impl ShoppingListFilter {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "is_completed", self.is_completed);
        push(&mut pairs, "page", self.page);
        pairs
    }
}

fn push<V: ToString>(pairs: &mut Vec<(String, String)>, key: &str, value: Option<V>) {
    if let Some(value) = value {
        pairs.push((key.to_string(), value.to_string()));
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct CheckedBody {
    is_checked: bool,
}

#[derive(Serialize)]
struct PermissionBody {
    permission: Permission,
}

/// REST endpoints of the Barfik backend
#[derive(Debug, Clone)]
pub struct Api {
    client: Arc<ApiClient>,
}

impl Api {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    // -- auth ---------------------------------------------------------------

    /// Exchange credentials for a token pair; the backend expects the
    /// email in its `username` field
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        debug!("Logging in");
        let request = ApiRequest::post("/api/auth/login/")
            .json(&LoginBody {
                username: email,
                password,
            })?
            .anonymous();
        self.client.send_json(&request).await
    }

    pub async fn register(&self, data: &RegisterRequest) -> Result<User> {
        let request = ApiRequest::post("/api/auth/register/")
            .json(data)?
            .anonymous();
        self.client.send_json(&request).await
    }

    /// Obtain a new access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let request = ApiRequest::post("/api/auth/refresh/")
            .json(&serde_json::json!({ "refresh": refresh_token }))?
            .anonymous();
        let token: AccessToken = self.client.send_json(&request).await?;
        Ok(token.access)
    }

    // -- users --------------------------------------------------------------

    pub async fn me(&self) -> Result<User> {
        self.client.send_json(&ApiRequest::get("/api/users/me/")).await
    }

    pub async fn update_me(&self, data: &UserUpdate) -> Result<User> {
        let request = ApiRequest::patch("/api/users/me/").json(data)?;
        self.client.send_json(&request).await
    }

    /// Look up a single user by exact email
    pub async fn search_user(&self, email: &str) -> Result<User> {
        let request = ApiRequest::get("/api/users/search/").query([("email", email)]);
        self.client.send_json(&request).await
    }

    // -- animals ------------------------------------------------------------

    pub async fn list_animals(&self, filter: &AnimalFilter) -> Result<ListResponse<Animal>> {
        let request = ApiRequest::get("/api/animals/").query(filter.query_pairs());
        self.client.send_json(&request).await
    }

    pub async fn get_animal(&self, id: Id) -> Result<Animal> {
        self.client
            .send_json(&ApiRequest::get(format!("/api/animals/{id}/")))
            .await
    }

    pub async fn create_animal(&self, data: &AnimalCreate) -> Result<Animal> {
        let request = ApiRequest::post("/api/animals/").json(data)?;
        self.client.send_json(&request).await
    }

    pub async fn update_animal(&self, id: Id, data: &AnimalUpdate) -> Result<Animal> {
        let request = ApiRequest::patch(format!("/api/animals/{id}/")).json(data)?;
        self.client.send_json(&request).await
    }

    pub async fn delete_animal(&self, id: Id) -> Result<()> {
        self.client
            .send_empty(&ApiRequest::delete(format!("/api/animals/{id}/")))
            .await
    }

    // -- diets --------------------------------------------------------------

    pub async fn list_diets(&self, filter: &DietFilter) -> Result<ListResponse<Diet>> {
        let request = ApiRequest::get("/api/diets/").query(filter.query_pairs());
        self.client.send_json(&request).await
    }

    pub async fn get_diet(&self, id: Id) -> Result<Diet> {
        self.client
            .send_json(&ApiRequest::get(format!("/api/diets/{id}/")))
            .await
    }

    pub async fn create_diet(&self, data: &DietCreate) -> Result<Diet> {
        let request = ApiRequest::post("/api/diets/").json(data)?;
        self.client.send_json(&request).await
    }

    pub async fn update_diet(&self, id: Id, data: &DietUpdate) -> Result<Diet> {
        let request = ApiRequest::patch(format!("/api/diets/{id}/")).json(data)?;
        self.client.send_json(&request).await
    }

    pub async fn delete_diet(&self, id: Id) -> Result<()> {
        self.client
            .send_empty(&ApiRequest::delete(format!("/api/diets/{id}/")))
            .await
    }

    // -- ingredients --------------------------------------------------------

    pub async fn list_ingredients(
        &self,
        diet_id: Id,
        filter: &IngredientFilter,
    ) -> Result<ListResponse<Ingredient>> {
        let request = ApiRequest::get(format!("/api/diets/{diet_id}/ingredients/"))
            .query(filter.query_pairs());
        self.client.send_json(&request).await
    }

    pub async fn create_ingredient(&self, diet_id: Id, data: &IngredientCreate) -> Result<Ingredient> {
        let request = ApiRequest::post(format!("/api/diets/{diet_id}/ingredients/")).json(data)?;
        self.client.send_json(&request).await
    }

    pub async fn update_ingredient(
        &self,
        diet_id: Id,
        id: Id,
        data: &IngredientUpdate,
    ) -> Result<Ingredient> {
        let request =
            ApiRequest::patch(format!("/api/diets/{diet_id}/ingredients/{id}/")).json(data)?;
        self.client.send_json(&request).await
    }

    pub async fn delete_ingredient(&self, diet_id: Id, id: Id) -> Result<()> {
        self.client
            .send_empty(&ApiRequest::delete(format!(
                "/api/diets/{diet_id}/ingredients/{id}/"
            )))
            .await
    }

    // -- shopping lists -----------------------------------------------------

    pub async fn list_shopping_lists(
        &self,
        filter: &ShoppingListFilter,
    ) -> Result<ListResponse<ShoppingList>> {
        let request = ApiRequest::get("/api/shopping-lists/").query(filter.query_pairs());
        self.client.send_json(&request).await
    }

    pub async fn get_shopping_list(&self, id: Id) -> Result<ShoppingList> {
        self.client
            .send_json(&ApiRequest::get(format!("/api/shopping-lists/{id}/")))
            .await
    }

    pub async fn create_shopping_list(&self, data: &ShoppingListCreate) -> Result<ShoppingList> {
        let request = ApiRequest::post("/api/shopping-lists/").json(data)?;
        self.client.send_json(&request).await
    }

    pub async fn complete_shopping_list(&self, id: Id) -> Result<ShoppingList> {
        self.client
            .send_json(&ApiRequest::post(format!("/api/shopping-lists/{id}/complete/")))
            .await
    }

    pub async fn uncomplete_shopping_list(&self, id: Id) -> Result<ShoppingList> {
        self.client
            .send_json(&ApiRequest::post(format!(
                "/api/shopping-lists/{id}/uncomplete/"
            )))
            .await
    }

    pub async fn delete_shopping_list(&self, id: Id) -> Result<()> {
        self.client
            .send_empty(&ApiRequest::delete(format!("/api/shopping-lists/{id}/")))
            .await
    }

    /// Check or uncheck one item of a shopping list
    pub async fn set_item_checked(&self, list_id: Id, item_id: Id, checked: bool) -> Result<()> {
        let request = ApiRequest::patch(format!("/api/shopping-lists/{list_id}/items/{item_id}/"))
            .json(&CheckedBody {
                is_checked: checked,
            })?;
        self.client.send_empty(&request).await
    }

    // -- dictionaries -------------------------------------------------------

    pub async fn animal_types(&self) -> Result<ListResponse<AnimalType>> {
        self.client
            .send_json(&ApiRequest::get("/api/animal-types/"))
            .await
    }

    pub async fn units(&self) -> Result<ListResponse<Unit>> {
        self.client.send_json(&ApiRequest::get("/api/units/")).await
    }

    pub async fn ingredient_categories(&self) -> Result<ListResponse<IngredientCategory>> {
        self.client
            .send_json(&ApiRequest::get("/api/ingredient-categories/"))
            .await
    }

    // -- collaborations -----------------------------------------------------

    pub async fn list_collaborations(&self, animal_id: Id) -> Result<ListResponse<Collaboration>> {
        self.client
            .send_json(&ApiRequest::get(format!(
                "/api/animals/{animal_id}/collaborations/"
            )))
            .await
    }

    pub async fn create_collaboration(
        &self,
        animal_id: Id,
        data: &CollaborationCreate,
    ) -> Result<Collaboration> {
        let request =
            ApiRequest::post(format!("/api/animals/{animal_id}/collaborations/")).json(data)?;
        self.client.send_json(&request).await
    }

    pub async fn update_collaboration(
        &self,
        animal_id: Id,
        id: Id,
        permission: Permission,
    ) -> Result<Collaboration> {
        let request = ApiRequest::patch(format!("/api/animals/{animal_id}/collaborations/{id}/"))
            .json(&PermissionBody { permission })?;
        self.client.send_json(&request).await
    }

    pub async fn delete_collaboration(&self, animal_id: Id, id: Id) -> Result<()> {
        self.client
            .send_empty(&ApiRequest::delete(format!(
                "/api/animals/{animal_id}/collaborations/{id}/"
            )))
            .await
    }

    // -- dashboard ----------------------------------------------------------

    pub async fn dashboard(&self) -> Result<Dashboard> {
        self.client
            .send_json(&ApiRequest::get("/api/dashboard/stats/"))
            .await
    }
}
