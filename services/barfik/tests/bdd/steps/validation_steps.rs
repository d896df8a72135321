//! BDD step definitions for diet form validation

use chrono::NaiveDate;
use cucumber::{given, then, when};

use barfik::validation::FIELD_END_DATE;

use crate::world::BarfikWorld;

fn date(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("dates in features use YYYY-MM-DD")
}

#[given(expr = "a diet form for animal {int}")]
fn diet_form(world: &mut BarfikWorld, animal_id: u64) {
    world.diet_form.animal_id = Some(animal_id);
}

#[given("a diet form without an animal")]
fn diet_form_without_animal(world: &mut BarfikWorld) {
    world.diet_form.animal_id = None;
}

#[given(expr = "the diet starts on {string}")]
fn starts_on(world: &mut BarfikWorld, start: String) {
    world.diet_form.start_date = Some(date(&start));
}

#[given(expr = "the diet ends on {string}")]
fn ends_on(world: &mut BarfikWorld, end: String) {
    world.diet_form.end_date = Some(date(&end));
}

#[given("the diet has no end date")]
fn no_end_date(world: &mut BarfikWorld) {
    world.diet_form.end_date = None;
}

#[when("the diet form is submitted")]
fn submitted(world: &mut BarfikWorld) {
    world.diet_result = Some(world.diet_form.validate());
}

#[then("the diet is accepted")]
fn accepted(world: &mut BarfikWorld) {
    let result = world.diet_result.as_ref().expect("form not submitted");
    assert!(result.is_ok(), "{result:?}");
}

#[then("the diet is open-ended")]
fn open_ended(world: &mut BarfikWorld) {
    let diet = world
        .diet_result
        .as_ref()
        .and_then(|result| result.as_ref().ok())
        .expect("diet was rejected");
    assert!(diet.end_date.is_none());
}

#[then(expr = "the diet is rejected with {string} on {string}")]
fn rejected(world: &mut BarfikWorld, message: String, field: String) {
    let errors = world
        .diet_result
        .as_ref()
        .and_then(|result| result.as_ref().err())
        .expect("diet was accepted");
    assert!(
        errors.field(&field).contains(&message),
        "{field}: {:?}",
        errors.field(&field)
    );
}

#[then("the end date has no error")]
fn end_date_clean(world: &mut BarfikWorld) {
    if let Some(Err(errors)) = world.diet_result.as_ref() {
        assert!(errors.field(FIELD_END_DATE).is_empty());
    }
}
