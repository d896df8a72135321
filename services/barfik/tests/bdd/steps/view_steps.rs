//! BDD step definitions for modal and category view state

use cucumber::{given, then, when};

use barfik::config::NotificationConfig;
use barfik::notify::NotificationCenter;
use barfik::store::{ActiveModal, ModalMode};
use barfik::UiStore;

use crate::world::BarfikWorld;

#[given("no modal is open")]
fn fresh_store(world: &mut BarfikWorld) {
    world.ui = UiStore::new();
}

#[when(expr = "the animal {int} modal is opened")]
fn open_animal(world: &mut BarfikWorld, id: u64) {
    world.ui.open_animal_modal(id);
}

#[when("the animal modal is closed")]
fn close_animal(world: &mut BarfikWorld) {
    world.ui.close_animal_modal();
}

#[when(expr = "a new diet is started for animal {int}")]
fn create_diet_for(world: &mut BarfikWorld, animal_id: u64) {
    world.ui.open_create_diet_modal(Some(animal_id));
}

#[when("the diet modal is closed")]
fn close_diet(world: &mut BarfikWorld) {
    world.ui.close_diet_modal();
}

#[when("a new shopping list is started")]
fn create_shopping_list(world: &mut BarfikWorld) {
    world.ui.open_create_shopping_list_modal();
}

#[then(expr = "the animal {int} modal is shown")]
fn animal_shown(world: &mut BarfikWorld, id: u64) {
    assert_eq!(
        world.ui.active_modal(),
        Some(ActiveModal::Animal(ModalMode::Edit(id)))
    );
}

#[then(expr = "the new diet modal is shown with animal {int} preselected")]
fn diet_shown(world: &mut BarfikWorld, animal_id: u64) {
    assert_eq!(
        world.ui.active_modal(),
        Some(ActiveModal::Diet {
            mode: ModalMode::Create,
            preselected_animal_id: Some(animal_id),
        })
    );
}

#[then("the new shopping list modal is shown")]
fn shopping_list_shown(world: &mut BarfikWorld) {
    assert_eq!(
        world.ui.active_modal(),
        Some(ActiveModal::ShoppingList(ModalMode::Create))
    );
}

#[then("no modal is shown")]
fn nothing_shown(world: &mut BarfikWorld) {
    assert_eq!(world.ui.active_modal(), None);
    assert_eq!(world.ui.open_count(), 0);
}

#[then("the diet modal forgets the preselected animal")]
fn diet_reset(world: &mut BarfikWorld) {
    assert_eq!(world.ui.diet.preselected_animal_id, None);
    assert!(!world.ui.diet.is_creating);
}

#[when(expr = "category {string} is toggled")]
fn toggle_category(world: &mut BarfikWorld, category: String) {
    world.ui.toggle_category_collapse(&category);
}

#[then(expr = "category {string} is collapsed")]
fn collapsed(world: &mut BarfikWorld, category: String) {
    assert!(world.ui.is_category_collapsed(&category));
}

#[then(expr = "category {string} is expanded")]
fn expanded(world: &mut BarfikWorld, category: String) {
    assert!(!world.ui.is_category_collapsed(&category));
}

#[given("a notification center")]
fn notification_center(world: &mut BarfikWorld) {
    world.notifications = Some(NotificationCenter::new(&NotificationConfig::default()));
}

#[when(expr = "the error {string} is shown")]
fn show_error(world: &mut BarfikWorld, message: String) {
    let center = world.notifications.as_ref().expect("no notification center");
    center.show_error(&message, None);
}

#[when(expr = "the notification {string} is dismissed")]
fn dismiss(world: &mut BarfikWorld, message: String) {
    let center = world.notifications.as_ref().expect("no notification center");
    let id = center
        .active()
        .into_iter()
        .find(|n| n.message == message)
        .map(|n| n.id)
        .expect("no such notification");
    assert!(center.dismiss(id));
}

#[then(expr = "{int} notification(s) is/are visible")]
fn visible(world: &mut BarfikWorld, count: usize) {
    let center = world.notifications.as_ref().expect("no notification center");
    assert_eq!(center.active().len(), count);
}
