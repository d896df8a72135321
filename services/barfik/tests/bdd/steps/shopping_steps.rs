//! BDD step definitions for shopping-list progress and grouping

use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use rust_decimal::Decimal;

use barfik::models::ShoppingListItem;
use barfik::shopping::{self, CompletionCheck, Progress};

use crate::world::BarfikWorld;

#[given("a shopping list with items:")]
fn list_with_items(world: &mut BarfikWorld, step: &Step) {
    let table = step.table.as_ref().expect("items table");
    world.items = table
        .rows
        .iter()
        .skip(1)
        .enumerate()
        .map(|(i, row)| ShoppingListItem {
            id: i as u64 + 1,
            ingredient_name: row[0].clone(),
            category: row[1].clone(),
            unit: None,
            total_amount: Decimal::ONE,
            is_checked: row[2] == "yes",
        })
        .collect();
}

#[given("an empty shopping list")]
fn empty_list(world: &mut BarfikWorld) {
    world.items.clear();
}

#[when(expr = "{string} is toggled")]
fn toggle(world: &mut BarfikWorld, name: String) {
    let item = world
        .items
        .iter_mut()
        .find(|item| item.ingredient_name == name)
        .expect("no such item");
    item.is_checked = !item.is_checked;
    world.progress = Some(Progress::of_items(&world.items));
}

#[when("the progress is computed")]
fn compute(world: &mut BarfikWorld) {
    world.progress = Some(Progress::of_items(&world.items));
}

fn progress(world: &BarfikWorld) -> Progress {
    world.progress.expect("progress not computed")
}

#[then(expr = "{int} of {int} items are checked")]
fn checked_of_total(world: &mut BarfikWorld, checked: usize, total: usize) {
    let progress = progress(world);
    assert_eq!(progress.checked, checked);
    assert_eq!(progress.total, total);
}

#[then(expr = "the progress is {int} percent")]
fn progress_percent(world: &mut BarfikWorld, percent: u32) {
    assert_eq!(progress(world).percent(), percent);
}

#[then(expr = "the categories are shown in order {string}")]
fn category_order(world: &mut BarfikWorld, order: String) {
    let expected: Vec<&str> = order.split(", ").collect();
    let groups = shopping::group_by_category(&world.items);
    let actual: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
    assert_eq!(actual, expected);
}

#[then("completing the list needs no confirmation")]
fn no_confirmation(world: &mut BarfikWorld) {
    assert_eq!(
        shopping::completion_check(&progress(world)),
        CompletionCheck::AllChecked
    );
}

#[then(expr = "completing the list warns about {int} unchecked item(s)")]
fn needs_confirmation(world: &mut BarfikWorld, unchecked: usize) {
    assert_eq!(
        shopping::completion_check(&progress(world)),
        CompletionCheck::Unchecked(unchecked)
    );
}

#[then("there is nothing to complete")]
fn nothing_to_complete(world: &mut BarfikWorld) {
    assert_eq!(
        shopping::completion_check(&progress(world)),
        CompletionCheck::Empty
    );
}
