//! Form validation and server-side validation error mapping
//!
//! Field names match the backend serializer fields so that client-side
//! and server-side errors land on the same form field.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{
    AnimalCreate, CookingMethod, DietCreate, DietUpdate, Id, IngredientCreate, IngredientUpdate,
    ShoppingListCreate,
};

pub const FIELD_ANIMAL_ID: &str = "animal_id";
pub const FIELD_START_DATE: &str = "start_date";
pub const FIELD_END_DATE: &str = "end_date";
pub const FIELD_NAME: &str = "name";
pub const FIELD_SPECIES_ID: &str = "species_id";
pub const FIELD_WEIGHT_KG: &str = "weight_kg";
pub const FIELD_DIETS: &str = "diets";
pub const FIELD_DAYS_COUNT: &str = "days_count";
pub const FIELD_UNIT_ID: &str = "unit_id";
pub const FIELD_AMOUNT: &str = "amount";

pub const MSG_END_BEFORE_START: &str = "Data zakończenia nie może być wcześniejsza niż data startu";
pub const MSG_ANIMAL_REQUIRED: &str = "Zwierzę jest wymagane";
pub const MSG_START_REQUIRED: &str = "Data startu jest wymagana";
pub const MSG_NAME_REQUIRED: &str = "Imię jest wymagane";
pub const MSG_SPECIES_REQUIRED: &str = "Gatunek jest wymagany";
pub const MSG_WEIGHT_NOT_NUMBER: &str = "Waga musi być liczbą";
pub const MSG_WEIGHT_NOT_POSITIVE: &str = "Waga musi być większa od 0.";
pub const MSG_DIETS_REQUIRED: &str = "Musisz wybrać co najmniej jedną dietę.";
pub const MSG_DAYS_NOT_POSITIVE: &str = "Liczba dni musi być większa od 0.";
pub const MSG_INGREDIENT_NAME_REQUIRED: &str = "Nazwa składnika jest wymagana";
pub const MSG_UNIT_REQUIRED: &str = "Jednostka jest wymagana";
pub const MSG_AMOUNT_REQUIRED: &str = "Ilość jest wymagana";
pub const MSG_AMOUNT_NOT_NUMBER: &str = "Ilość musi być liczbą";
pub const MSG_AMOUNT_NOT_POSITIVE: &str = "Ilość musi być większa od 0.";

/// Keys in a DRF error body that are not tied to a form field
const GENERAL_KEYS: [&str; 2] = ["non_field_errors", "detail"];

/// Per-field and general validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
    general: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_general(&mut self, message: impl Into<String>) {
        self.general.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.general.is_empty()
    }

    pub fn has_field_errors(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Messages attached to one field (empty if none)
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn general(&self) -> &[String] {
        &self.general
    }

    /// One-line summary: general messages if any, otherwise all field messages
    pub fn summary(&self) -> String {
        if !self.general.is_empty() {
            return self.general.join(", ");
        }
        self.fields
            .values()
            .flatten()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Map a 400 response body into field and general messages
    ///
    /// A JSON object of `field -> [messages]` (or `field -> message`) is
    /// mapped field by field; anything else becomes a single general
    /// message.
    pub fn from_body(body: &str) -> Self {
        let mut errors = Self::new();

        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(body) {
            for (key, value) in &map {
                let messages = messages_of(value);
                if GENERAL_KEYS.contains(&key.as_str()) {
                    errors.general.extend(messages);
                } else {
                    for message in messages {
                        errors.add_field(key, message);
                    }
                }
            }
        }

        if errors.is_empty() {
            let trimmed = body.trim();
            if !trimmed.is_empty() {
                errors.add_general(trimmed);
            }
        }
        errors
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

fn messages_of(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) => vec![s.clone()],
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Reject an end date strictly before the start date
pub fn check_date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            errors.add_field(FIELD_END_DATE, MSG_END_BEFORE_START);
        }
    }
    errors.into_result(())
}

/// Input of the "new diet" form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DietForm {
    pub animal_id: Option<Id>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: String,
}

impl DietForm {
    pub fn validate(&self) -> Result<DietCreate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.animal_id.is_none() {
            errors.add_field(FIELD_ANIMAL_ID, MSG_ANIMAL_REQUIRED);
        }
        if self.start_date.is_none() {
            errors.add_field(FIELD_START_DATE, MSG_START_REQUIRED);
        }
        if let Err(range) = check_date_range(self.start_date, self.end_date) {
            errors.fields.extend(range.fields);
        }

        match (self.animal_id, self.start_date) {
            (Some(animal_id), Some(start_date)) if errors.is_empty() => Ok(DietCreate {
                animal_id,
                start_date,
                end_date: self.end_date,
                description: self.description.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

/// Validate a diet creation payload
pub fn validate_diet_create(diet: &DietCreate) -> Result<(), ValidationErrors> {
    check_date_range(Some(diet.start_date), diet.end_date)
}

/// Validate a partial diet update against the diet's current start date
pub fn validate_diet_update(
    update: &DietUpdate,
    current_start: Option<NaiveDate>,
) -> Result<(), ValidationErrors> {
    let start = update.start_date.or(current_start);
    let end = update.end_date.flatten();
    check_date_range(start, end)
}

/// Input of the animal form; weight is kept as typed by the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimalForm {
    pub name: String,
    pub species_id: Option<Id>,
    pub date_of_birth: Option<NaiveDate>,
    pub weight_kg: String,
    pub note: String,
}

impl AnimalForm {
    pub fn validate(&self) -> Result<AnimalCreate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.add_field(FIELD_NAME, MSG_NAME_REQUIRED);
        }
        if self.species_id.is_none() {
            errors.add_field(FIELD_SPECIES_ID, MSG_SPECIES_REQUIRED);
        }
        let weight = match parse_weight(&self.weight_kg) {
            Ok(weight) => weight,
            Err(message) => {
                errors.add_field(FIELD_WEIGHT_KG, message);
                None
            }
        };

        match self.species_id {
            Some(species_id) if errors.is_empty() => Ok(AnimalCreate {
                species_id,
                name: name.to_string(),
                date_of_birth: self.date_of_birth,
                weight_kg: weight,
                note: self.note.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

/// Validate an animal payload that did not come from a form
pub fn validate_animal_create(animal: &AnimalCreate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if animal.name.trim().is_empty() {
        errors.add_field(FIELD_NAME, MSG_NAME_REQUIRED);
    }
    if let Some(weight) = animal.weight_kg {
        if weight <= Decimal::ZERO {
            errors.add_field(FIELD_WEIGHT_KG, MSG_WEIGHT_NOT_POSITIVE);
        }
    }
    errors.into_result(())
}

/// Accepts both `12.5` and `12,5`
fn parse_weight(raw: &str) -> Result<Option<Decimal>, &'static str> {
    parse_positive(raw, MSG_WEIGHT_NOT_NUMBER, MSG_WEIGHT_NOT_POSITIVE)
}

/// Empty input is `None`; anything else must be a number above zero
fn parse_positive(
    raw: &str,
    not_number: &'static str,
    not_positive: &'static str,
) -> Result<Option<Decimal>, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let value = Decimal::from_str(&raw.replace(',', ".")).map_err(|_| not_number)?;
    if value <= Decimal::ZERO {
        return Err(not_positive);
    }
    Ok(Some(value))
}

/// Input of the ingredient row in the diet modal; amount is kept as typed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientForm {
    pub name: String,
    pub category_id: Option<Id>,
    /// Raw when not chosen
    pub cooking_method: Option<CookingMethod>,
    pub unit_id: Option<Id>,
    pub amount: String,
}

impl IngredientForm {
    pub fn validate(&self) -> Result<IngredientCreate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.add_field(FIELD_NAME, MSG_INGREDIENT_NAME_REQUIRED);
        }
        if self.unit_id.is_none() {
            errors.add_field(FIELD_UNIT_ID, MSG_UNIT_REQUIRED);
        }
        let amount = match parse_positive(&self.amount, MSG_AMOUNT_NOT_NUMBER, MSG_AMOUNT_NOT_POSITIVE)
        {
            Ok(Some(amount)) => Some(amount),
            Ok(None) => {
                errors.add_field(FIELD_AMOUNT, MSG_AMOUNT_REQUIRED);
                None
            }
            Err(message) => {
                errors.add_field(FIELD_AMOUNT, message);
                None
            }
        };

        match (self.unit_id, amount) {
            (Some(unit_id), Some(amount)) if errors.is_empty() => Ok(IngredientCreate {
                name: name.to_string(),
                category_id: self.category_id,
                cooking_method: self.cooking_method.unwrap_or(CookingMethod::Raw),
                unit_id,
                amount,
            }),
            _ => Err(errors),
        }
    }
}

/// Validate an ingredient payload that did not come from a form
pub fn validate_ingredient_create(ingredient: &IngredientCreate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_ingredient_fields(&mut errors, Some(&ingredient.name), Some(ingredient.amount));
    errors.into_result(())
}

/// Validate the fields a partial ingredient update sets
pub fn validate_ingredient_update(update: &IngredientUpdate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_ingredient_fields(&mut errors, update.name.as_deref(), update.amount);
    errors.into_result(())
}

fn check_ingredient_fields(errors: &mut ValidationErrors, name: Option<&str>, amount: Option<Decimal>) {
    if name.is_some_and(|name| name.trim().is_empty()) {
        errors.add_field(FIELD_NAME, MSG_INGREDIENT_NAME_REQUIRED);
    }
    if amount.is_some_and(|amount| amount <= Decimal::ZERO) {
        errors.add_field(FIELD_AMOUNT, MSG_AMOUNT_NOT_POSITIVE);
    }
}

/// Validate a shopping list creation payload
pub fn validate_shopping_list_create(list: &ShoppingListCreate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if list.diets.is_empty() {
        errors.add_field(FIELD_DIETS, MSG_DIETS_REQUIRED);
    }
    if list.days_count < 1 {
        errors.add_field(FIELD_DAYS_COUNT, MSG_DAYS_NOT_POSITIVE);
    }
    errors.into_result(())
}
