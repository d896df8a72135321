//! Cached reads and invalidating writes per resource
//!
//! Reads go through the [`QueryCache`] with the stale time configured for
//! their resource. Writes validate their input, call the API and then
//! mark the affected resource family stale. Nothing is updated
//! optimistically: the cache only ever holds what the server returned.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::api::{AnimalFilter, Api, DietFilter, IngredientFilter, ShoppingListFilter};
use crate::cache::{QueryCache, QueryKey};
use crate::config::CacheConfig;
use crate::error::{BarfikError, Result};
use crate::models::{
    Animal, AnimalCreate, AnimalType, AnimalUpdate, Collaboration, CollaborationCreate,
    Dashboard, Diet, DietCreate, DietUpdate, Id, Ingredient, IngredientCategory,
    IngredientCreate, IngredientUpdate, ListResponse, Permission, ShoppingList,
    ShoppingListCreate, Unit, User, UserUpdate,
};
use crate::validation;

pub const ANIMALS: &str = "animals";
pub const DIETS: &str = "diets";
pub const INGREDIENTS: &str = "ingredients";
pub const SHOPPING_LISTS: &str = "shopping-lists";
pub const COLLABORATIONS: &str = "collaborations";
pub const ANIMAL_TYPES: &str = "animalTypes";
pub const UNITS: &str = "units";
pub const INGREDIENT_CATEGORIES: &str = "ingredientCategories";

pub fn animals_key() -> QueryKey {
    QueryKey::new(ANIMALS)
}

pub fn animal_key(id: Id) -> QueryKey {
    animals_key().id(id)
}

pub fn diets_key() -> QueryKey {
    QueryKey::new(DIETS)
}

pub fn diet_key(id: Id) -> QueryKey {
    diets_key().id(id)
}

pub fn shopping_lists_key() -> QueryKey {
    QueryKey::new(SHOPPING_LISTS)
}

pub fn shopping_list_key(id: Id) -> QueryKey {
    shopping_lists_key().id(id)
}

pub fn collaborations_key() -> QueryKey {
    QueryKey::new(COLLABORATIONS)
}

pub fn dashboard_key() -> QueryKey {
    QueryKey::new("dashboard").name("stats")
}

pub fn me_key() -> QueryKey {
    QueryKey::new("users").name("me")
}

fn invalid(errors: validation::ValidationErrors) -> BarfikError {
    BarfikError::Validation(errors)
}

/// Domain operations over the Barfik API
#[derive(Debug, Clone)]
pub struct Queries {
    api: Api,
    cache: Arc<QueryCache>,
    stale: CacheConfig,
}

impl Queries {
    pub fn new(api: Api, cache: Arc<QueryCache>, stale: CacheConfig) -> Self {
        Self { api, cache, stale }
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Forget every cached result, e.g. when the user changes
    pub async fn clear(&self) {
        self.cache.clear().await;
    }

    async fn invalidate_family(&self, family: QueryKey, id: Option<Id>) {
        if let Some(id) = id {
            self.cache.invalidate(&family.clone().id(id)).await;
        }
        self.cache.invalidate(&family).await;
    }

    fn single(&self) -> Duration {
        self.stale.default
    }

    // -- animals ------------------------------------------------------------

    pub async fn animals(&self, filter: &AnimalFilter) -> Result<ListResponse<Animal>> {
        let key = animals_key().params(filter.query_pairs());
        self.cache
            .fetch(key, self.stale.animals, || self.api.list_animals(filter))
            .await
    }

    pub async fn animal(&self, id: Id) -> Result<Animal> {
        self.cache
            .fetch(animal_key(id), self.single(), || self.api.get_animal(id))
            .await
    }

    pub async fn create_animal(&self, data: &AnimalCreate) -> Result<Animal> {
        validation::validate_animal_create(data).map_err(invalid)?;
        let animal = self.api.create_animal(data).await?;
        debug!("Created animal {}", animal.id);
        self.invalidate_family(animals_key(), None).await;
        Ok(animal)
    }

    pub async fn update_animal(&self, id: Id, data: &AnimalUpdate) -> Result<Animal> {
        if let Some(name) = &data.name {
            if name.trim().is_empty() {
                let mut errors = validation::ValidationErrors::new();
                errors.add_field(validation::FIELD_NAME, validation::MSG_NAME_REQUIRED);
                return Err(invalid(errors));
            }
        }
        let animal = self.api.update_animal(id, data).await?;
        self.invalidate_family(animals_key(), Some(id)).await;
        Ok(animal)
    }

    pub async fn delete_animal(&self, id: Id) -> Result<()> {
        self.api.delete_animal(id).await?;
        self.invalidate_family(animals_key(), Some(id)).await;
        Ok(())
    }

    // -- diets --------------------------------------------------------------

    pub async fn diets(&self, filter: &DietFilter) -> Result<ListResponse<Diet>> {
        let key = diets_key().params(filter.query_pairs());
        self.cache
            .fetch(key, self.stale.diets, || self.api.list_diets(filter))
            .await
    }

    pub async fn diet(&self, id: Id) -> Result<Diet> {
        self.cache
            .fetch(diet_key(id), self.single(), || self.api.get_diet(id))
            .await
    }

    /// The last diet the server returned for `id`, without a request
    pub async fn cached_diet(&self, id: Id) -> Option<Diet> {
        self.cache.get(&diet_key(id)).await
    }

    /// Create a diet and seed its detail entry
    pub async fn create_diet(&self, data: &DietCreate) -> Result<Diet> {
        validation::validate_diet_create(data).map_err(invalid)?;
        let diet = self.api.create_diet(data).await?;
        debug!("Created diet {} for animal {}", diet.id, diet.animal);
        self.invalidate_family(diets_key(), None).await;
        self.cache.set(diet_key(diet.id), diet.clone()).await;
        Ok(diet)
    }

    /// Update a diet; the date range is checked against the cached start
    /// date when the update does not carry one
    pub async fn update_diet(&self, id: Id, data: &DietUpdate) -> Result<Diet> {
        let current_start = match data.start_date {
            Some(_) => None,
            None => self.cached_diet(id).await.map(|diet| diet.start_date),
        };
        validation::validate_diet_update(data, current_start).map_err(invalid)?;
        let diet = self.api.update_diet(id, data).await?;
        self.invalidate_family(diets_key(), Some(id)).await;
        Ok(diet)
    }

    pub async fn delete_diet(&self, id: Id) -> Result<()> {
        self.api.delete_diet(id).await?;
        self.invalidate_family(diets_key(), Some(id)).await;
        Ok(())
    }

    // -- ingredients --------------------------------------------------------

    pub async fn ingredients(
        &self,
        diet_id: Id,
        filter: &IngredientFilter,
    ) -> Result<ListResponse<Ingredient>> {
        let key = diet_key(diet_id)
            .name(INGREDIENTS)
            .params(filter.query_pairs());
        self.cache
            .fetch(key, self.stale.diets, || {
                self.api.list_ingredients(diet_id, filter)
            })
            .await
    }

    /// Ingredients change the diet's computed mass, so the whole diet
    /// family goes stale
    pub async fn create_ingredient(&self, diet_id: Id, data: &IngredientCreate) -> Result<Ingredient> {
        validation::validate_ingredient_create(data).map_err(invalid)?;
        let ingredient = self.api.create_ingredient(diet_id, data).await?;
        self.invalidate_family(diets_key(), Some(diet_id)).await;
        Ok(ingredient)
    }

    pub async fn update_ingredient(
        &self,
        diet_id: Id,
        id: Id,
        data: &IngredientUpdate,
    ) -> Result<Ingredient> {
        validation::validate_ingredient_update(data).map_err(invalid)?;
        let ingredient = self.api.update_ingredient(diet_id, id, data).await?;
        self.invalidate_family(diets_key(), Some(diet_id)).await;
        Ok(ingredient)
    }

    pub async fn delete_ingredient(&self, diet_id: Id, id: Id) -> Result<()> {
        self.api.delete_ingredient(diet_id, id).await?;
        self.invalidate_family(diets_key(), Some(diet_id)).await;
        Ok(())
    }

    // -- shopping lists -----------------------------------------------------

    pub async fn shopping_lists(
        &self,
        filter: &ShoppingListFilter,
    ) -> Result<ListResponse<ShoppingList>> {
        let key = shopping_lists_key().params(filter.query_pairs());
        self.cache
            .fetch(key, self.stale.shopping_lists, || {
                self.api.list_shopping_lists(filter)
            })
            .await
    }

    pub async fn shopping_list(&self, id: Id) -> Result<ShoppingList> {
        self.cache
            .fetch(shopping_list_key(id), self.single(), || {
                self.api.get_shopping_list(id)
            })
            .await
    }

    pub async fn cached_shopping_list(&self, id: Id) -> Option<ShoppingList> {
        self.cache.get(&shopping_list_key(id)).await
    }

    /// Create a shopping list and seed its detail entry
    pub async fn create_shopping_list(&self, data: &ShoppingListCreate) -> Result<ShoppingList> {
        validation::validate_shopping_list_create(data).map_err(invalid)?;
        let list = self.api.create_shopping_list(data).await?;
        debug!("Created shopping list {} ({} items)", list.id, list.items.len());
        self.invalidate_family(shopping_lists_key(), None).await;
        self.cache.set(shopping_list_key(list.id), list.clone()).await;
        Ok(list)
    }

    pub async fn complete_shopping_list(&self, id: Id) -> Result<ShoppingList> {
        let list = self.api.complete_shopping_list(id).await?;
        self.invalidate_family(shopping_lists_key(), Some(id)).await;
        Ok(list)
    }

    pub async fn uncomplete_shopping_list(&self, id: Id) -> Result<ShoppingList> {
        let list = self.api.uncomplete_shopping_list(id).await?;
        self.invalidate_family(shopping_lists_key(), Some(id)).await;
        Ok(list)
    }

    pub async fn delete_shopping_list(&self, id: Id) -> Result<()> {
        self.api.delete_shopping_list(id).await?;
        self.invalidate_family(shopping_lists_key(), Some(id)).await;
        Ok(())
    }

    /// Check or uncheck one item; listings go stale too since they show
    /// progress
    pub async fn toggle_item(&self, list_id: Id, item_id: Id, checked: bool) -> Result<()> {
        self.api.set_item_checked(list_id, item_id, checked).await?;
        self.invalidate_family(shopping_lists_key(), Some(list_id)).await;
        Ok(())
    }

    // -- dictionaries -------------------------------------------------------

    pub async fn animal_types(&self) -> Result<Vec<AnimalType>> {
        let list = self
            .cache
            .fetch(QueryKey::new(ANIMAL_TYPES), self.stale.dictionaries, || {
                self.api.animal_types()
            })
            .await?;
        Ok(list.into_items())
    }

    pub async fn units(&self) -> Result<Vec<Unit>> {
        let list = self
            .cache
            .fetch(QueryKey::new(UNITS), self.stale.dictionaries, || {
                self.api.units()
            })
            .await?;
        Ok(list.into_items())
    }

    pub async fn ingredient_categories(&self) -> Result<Vec<IngredientCategory>> {
        let list = self
            .cache
            .fetch(
                QueryKey::new(INGREDIENT_CATEGORIES),
                self.stale.dictionaries,
                || self.api.ingredient_categories(),
            )
            .await?;
        Ok(list.into_items())
    }

    // -- collaborations -----------------------------------------------------

    pub async fn collaborations(&self, animal_id: Id) -> Result<ListResponse<Collaboration>> {
        self.cache
            .fetch(
                collaborations_key().id(animal_id),
                self.single(),
                || self.api.list_collaborations(animal_id),
            )
            .await
    }

    pub async fn create_collaboration(
        &self,
        animal_id: Id,
        data: &CollaborationCreate,
    ) -> Result<Collaboration> {
        let collaboration = self.api.create_collaboration(animal_id, data).await?;
        self.invalidate_family(collaborations_key(), Some(animal_id)).await;
        Ok(collaboration)
    }

    pub async fn update_collaboration(
        &self,
        animal_id: Id,
        id: Id,
        permission: Permission,
    ) -> Result<Collaboration> {
        let collaboration = self
            .api
            .update_collaboration(animal_id, id, permission)
            .await?;
        self.invalidate_family(collaborations_key(), Some(animal_id)).await;
        Ok(collaboration)
    }

    pub async fn delete_collaboration(&self, animal_id: Id, id: Id) -> Result<()> {
        self.api.delete_collaboration(animal_id, id).await?;
        self.invalidate_family(collaborations_key(), Some(animal_id)).await;
        Ok(())
    }

    // -- users and dashboard ------------------------------------------------

    pub async fn me(&self) -> Result<User> {
        self.cache
            .fetch(me_key(), self.single(), || self.api.me())
            .await
    }

    pub async fn update_me(&self, data: &UserUpdate) -> Result<User> {
        let user = self.api.update_me(data).await?;
        self.cache.invalidate(&me_key()).await;
        Ok(user)
    }

    /// Exact-email lookup; never cached
    pub async fn search_user(&self, email: &str) -> Result<User> {
        self.api.search_user(email.trim()).await
    }

    pub async fn dashboard(&self) -> Result<Dashboard> {
        self.cache
            .fetch(dashboard_key(), self.stale.dashboard, || self.api.dashboard())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiClient;
    use crate::config::Config;
    use crate::io::{HttpResponse, Method, MockHttpClient};
    use crate::session::{MockNavigator, TokenStore};
    use chrono::NaiveDate;

    const HOUR: Duration = Duration::from_secs(3600);

    fn queries(http: MockHttpClient) -> Queries {
        let config = Config::default();
        let tokens = TokenStore::in_memory();
        tokens.set_access_token("a1");
        let client = ApiClient::new(
            &config,
            Arc::new(http),
            tokens,
            Arc::new(MockNavigator::new()),
        );
        Queries::new(
            Api::new(Arc::new(client)),
            Arc::new(QueryCache::new()),
            config.cache,
        )
    }

    fn ok(status: u16, body: &'static str) -> crate::Result<HttpResponse> {
        Ok(HttpResponse {
            status,
            body: body.to_string(),
        })
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn animal_list_is_served_from_cache_while_fresh() {
        let mut http = MockHttpClient::new();
        http.expect_send()
            .withf(|req| req.method == Method::Get && req.url.ends_with("/api/animals/"))
            .times(1)
            .returning(|_| Box::pin(async { ok(200, "[]") }));

        let queries = queries(http);
        let filter = AnimalFilter::default();
        queries.animals(&filter).await.unwrap();
        queries.animals(&filter).await.unwrap();
    }

    #[tokio::test]
    async fn different_filters_are_cached_separately() {
        let mut http = MockHttpClient::new();
        http.expect_send()
            .withf(|req| req.url.ends_with("/api/animals/"))
            .times(2)
            .returning(|_| Box::pin(async { ok(200, "[]") }));

        let queries = queries(http);
        queries.animals(&AnimalFilter::default()).await.unwrap();
        let search = AnimalFilter {
            search: Some("Bur".to_string()),
            ..AnimalFilter::default()
        };
        queries.animals(&search).await.unwrap();
        queries.animals(&search).await.unwrap();
    }

    #[tokio::test]
    async fn create_diet_invalidates_listings_and_seeds_detail() {
        let mut http = MockHttpClient::new();
        http.expect_send()
            .withf(|req| req.method == Method::Post && req.url.ends_with("/api/diets/"))
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    ok(
                        201,
                        r#"{"id": 7, "animal_id": 3, "start_date": "2026-01-01", "end_date": null, "description": ""}"#,
                    )
                })
            });

        let queries = queries(http);
        let listing = diets_key().params(Vec::new());
        queries
            .cache()
            .set(listing.clone(), ListResponse::<Diet>::Bare(Vec::new()))
            .await;

        let data = DietCreate {
            animal_id: 3,
            start_date: date(2026, 1, 1),
            end_date: None,
            description: String::new(),
        };
        let diet = queries.create_diet(&data).await.unwrap();

        assert!(queries
            .cache()
            .get_fresh::<ListResponse<Diet>>(&listing, HOUR)
            .await
            .is_none());
        let seeded = queries.cached_diet(7).await.unwrap();
        assert_eq!(seeded, diet);
        assert!(queries
            .cache()
            .get_fresh::<Diet>(&diet_key(7), HOUR)
            .await
            .is_some());
    }

    #[tokio::test]
    async fn invalid_diet_never_reaches_server() {
        let mut http = MockHttpClient::new();
        http.expect_send().times(0);

        let data = DietCreate {
            animal_id: 3,
            start_date: date(2026, 2, 1),
            end_date: Some(date(2026, 1, 1)),
            description: String::new(),
        };
        let err = queries(http).create_diet(&data).await.unwrap_err();
        match err {
            BarfikError::Validation(errors) => {
                assert_eq!(
                    errors.field("end_date"),
                    ["Data zakończenia nie może być wcześniejsza niż data startu"]
                );
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_diet_checks_end_against_cached_start() {
        let mut http = MockHttpClient::new();
        http.expect_send().times(0);

        let queries = queries(http);
        let diet: Diet = serde_json::from_str(
            r#"{"id": 7, "animal": 3, "start_date": "2026-03-01", "end_date": null}"#,
        )
        .unwrap();
        queries.cache().set(diet_key(7), diet).await;

        let update = DietUpdate {
            end_date: Some(Some(date(2026, 2, 1))),
            ..DietUpdate::default()
        };
        let err = queries.update_diet(7, &update).await.unwrap_err();
        assert!(matches!(err, BarfikError::Validation(_)));
    }

    #[tokio::test]
    async fn toggle_item_invalidates_detail_and_listings() {
        let mut http = MockHttpClient::new();
        http.expect_send()
            .withf(|req| req.method == Method::Patch)
            .times(1)
            .returning(|_| Box::pin(async { ok(200, "{}") }));

        let queries = queries(http);
        let detail = shopping_list_key(5);
        let other = shopping_list_key(6);
        let listing = shopping_lists_key().params(Vec::new());
        for key in [&detail, &other, &listing] {
            queries.cache().set(key.clone(), 0u8).await;
        }

        queries.toggle_item(5, 9, true).await.unwrap();

        for key in [&detail, &listing] {
            assert!(queries.cache().get_fresh::<u8>(key, HOUR).await.is_none());
        }
    }

    #[tokio::test]
    async fn invalid_shopping_list_never_reaches_server() {
        let mut http = MockHttpClient::new();
        http.expect_send().times(0);

        let data = ShoppingListCreate {
            title: "Tydzień".to_string(),
            diets: Vec::new(),
            days_count: 0,
        };
        let err = queries(http).create_shopping_list(&data).await.unwrap_err();
        let BarfikError::Validation(errors) = err else {
            panic!("expected Validation");
        };
        assert_eq!(errors.field("diets"), ["Musisz wybrać co najmniej jedną dietę."]);
        assert_eq!(errors.field("days_count"), ["Liczba dni musi być większa od 0."]);
    }

    #[tokio::test]
    async fn invalid_ingredient_never_reaches_server() {
        let mut http = MockHttpClient::new();
        http.expect_send().times(0);
        let queries = queries(http);

        let data = IngredientCreate {
            name: " ".to_string(),
            category_id: None,
            cooking_method: crate::models::CookingMethod::Raw,
            unit_id: 1,
            amount: rust_decimal::Decimal::ZERO,
        };
        let err = queries.create_ingredient(7, &data).await.unwrap_err();
        let BarfikError::Validation(errors) = err else {
            panic!("expected Validation");
        };
        assert_eq!(errors.field("name"), ["Nazwa składnika jest wymagana"]);
        assert_eq!(errors.field("amount"), ["Ilość musi być większa od 0."]);

        let update = IngredientUpdate {
            amount: Some(rust_decimal::Decimal::NEGATIVE_ONE),
            ..IngredientUpdate::default()
        };
        assert!(matches!(
            queries.update_ingredient(7, 3, &update).await,
            Err(BarfikError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn failed_mutation_keeps_cache_fresh() {
        let mut http = MockHttpClient::new();
        http.expect_send()
            .times(1)
            .returning(|_| Box::pin(async { ok(403, r#"{"detail": "no"}"#) }));

        let queries = queries(http);
        let listing = animals_key().params(Vec::new());
        queries.cache().set(listing.clone(), 1u8).await;

        assert!(queries.delete_animal(3).await.is_err());
        assert_eq!(queries.cache().get_fresh::<u8>(&listing, HOUR).await, Some(1));
    }

    #[tokio::test]
    async fn dictionaries_unwrap_pagination() {
        let mut http = MockHttpClient::new();
        http.expect_send()
            .withf(|req| req.url.ends_with("/api/animal-types/"))
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    ok(
                        200,
                        r#"{"count": 2, "next": null, "previous": null,
                            "results": [{"id": 1, "name": "Pies"}, {"id": 2, "name": "Kot"}]}"#,
                    )
                })
            });

        let queries = queries(http);
        let types = queries.animal_types().await.unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(queries.animal_types().await.unwrap(), types);
    }

    #[tokio::test]
    async fn clear_forgets_everything() {
        let queries = queries(MockHttpClient::new());
        queries.cache().set(me_key(), 1u8).await;
        queries.clear().await;
        assert!(queries.cache().is_empty().await);
    }
}
