//! View state: which modal is open and which categories are collapsed
//!
//! The three modal descriptors are independent, so more than one can be
//! open at a time. [`UiStore::active_modal`] resolves that to the single
//! modal a front end should show.

use std::collections::BTreeSet;

use crate::models::Id;

/// Animal or shopping-list modal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModalState {
    pub id: Option<Id>,
    pub is_creating: bool,
    pub open: bool,
}

impl ModalState {
    fn editing(id: Id) -> Self {
        Self {
            id: Some(id),
            is_creating: false,
            open: true,
        }
    }

    fn creating() -> Self {
        Self {
            id: None,
            is_creating: true,
            open: true,
        }
    }
}

/// Diet modal; creation may start with an animal already chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DietModalState {
    pub id: Option<Id>,
    pub is_creating: bool,
    pub preselected_animal_id: Option<Id>,
    pub open: bool,
}

/// What a modal is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalMode {
    Create,
    Edit(Id),
}

/// The modal to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveModal {
    Animal(ModalMode),
    Diet {
        mode: ModalMode,
        preselected_animal_id: Option<Id>,
    },
    ShoppingList(ModalMode),
}

fn mode(id: Option<Id>, is_creating: bool) -> Option<ModalMode> {
    match (id, is_creating) {
        (_, true) => Some(ModalMode::Create),
        (Some(id), false) => Some(ModalMode::Edit(id)),
        (None, false) => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiStore {
    pub animal: ModalState,
    pub diet: DietModalState,
    pub shopping_list: ModalState,
    collapsed_categories: BTreeSet<String>,
}

impl UiStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_animal_modal(&mut self, id: Id) {
        self.animal = ModalState::editing(id);
    }

    pub fn open_create_animal_modal(&mut self) {
        self.animal = ModalState::creating();
    }

    pub fn close_animal_modal(&mut self) {
        self.animal = ModalState::default();
    }

    pub fn open_diet_modal(&mut self, id: Id) {
        self.diet = DietModalState {
            id: Some(id),
            is_creating: false,
            preselected_animal_id: None,
            open: true,
        };
    }

    pub fn open_create_diet_modal(&mut self, preselected_animal_id: Option<Id>) {
        self.diet = DietModalState {
            id: None,
            is_creating: true,
            preselected_animal_id,
            open: true,
        };
    }

    pub fn close_diet_modal(&mut self) {
        self.diet = DietModalState::default();
    }

    pub fn open_shopping_list_modal(&mut self, id: Id) {
        self.shopping_list = ModalState::editing(id);
    }

    pub fn open_create_shopping_list_modal(&mut self) {
        self.shopping_list = ModalState::creating();
    }

    pub fn close_shopping_list_modal(&mut self) {
        self.shopping_list = ModalState::default();
    }

    /// The open modal to show; animal wins over diet, diet over shopping list
    pub fn active_modal(&self) -> Option<ActiveModal> {
        if self.animal.open {
            if let Some(mode) = mode(self.animal.id, self.animal.is_creating) {
                return Some(ActiveModal::Animal(mode));
            }
        }
        if self.diet.open {
            if let Some(mode) = mode(self.diet.id, self.diet.is_creating) {
                return Some(ActiveModal::Diet {
                    mode,
                    preselected_animal_id: self.diet.preselected_animal_id,
                });
            }
        }
        if self.shopping_list.open {
            if let Some(mode) = mode(self.shopping_list.id, self.shopping_list.is_creating) {
                return Some(ActiveModal::ShoppingList(mode));
            }
        }
        None
    }

    /// Number of modal descriptors currently flagged open
    pub fn open_count(&self) -> usize {
        [self.animal.open, self.diet.open, self.shopping_list.open]
            .iter()
            .filter(|open| **open)
            .count()
    }

    pub fn toggle_category_collapse(&mut self, category: &str) {
        if !self.collapsed_categories.remove(category) {
            self.collapsed_categories.insert(category.to_string());
        }
    }

    pub fn set_category_collapsed(&mut self, category: &str, collapsed: bool) {
        if collapsed {
            self.collapsed_categories.insert(category.to_string());
        } else {
            self.collapsed_categories.remove(category);
        }
    }

    pub fn is_category_collapsed(&self, category: &str) -> bool {
        self.collapsed_categories.contains(category)
    }

    pub fn collapsed_categories(&self) -> &BTreeSet<String> {
        &self.collapsed_categories
    }
}
