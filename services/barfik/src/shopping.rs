//! Shopping-list progress and category grouping

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::models::{ShoppingList, ShoppingListItem};

/// Category shown for items the backend left uncategorised
pub const OTHER_CATEGORY: &str = "Inne";

const POLISH_ALPHABET: &str = "aąbcćdeęfghijklłmnńoópqrsśtuvwxyzźż";

/// Checked items over all items
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub total: usize,
    pub checked: usize,
    /// `checked / total`, 0 for an empty list
    pub ratio: f64,
}

impl Progress {
    pub fn of_items(items: &[ShoppingListItem]) -> Self {
        let total = items.len();
        let checked = items.iter().filter(|item| item.is_checked).count();
        let ratio = if total == 0 {
            0.0
        } else {
            checked as f64 / total as f64
        };
        Self {
            total,
            checked,
            ratio,
        }
    }

    /// Rounded to whole percent for display
    pub fn percent(&self) -> u32 {
        (self.ratio * 100.0).round() as u32
    }

    pub fn unchecked(&self) -> usize {
        self.total - self.checked
    }
}

pub fn progress(list: &ShoppingList) -> Progress {
    Progress::of_items(&list.items)
}

/// Items of one category, in list order
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub category: String,
    pub items: Vec<&'a ShoppingListItem>,
}

fn category_of(item: &ShoppingListItem) -> &str {
    let category = item.category.trim();
    if category.is_empty() {
        OTHER_CATEGORY
    } else {
        category
    }
}

fn letter_rank(c: char) -> (u32, u32) {
    let lower = c.to_lowercase().next().unwrap_or(c);
    match POLISH_ALPHABET.chars().position(|letter| letter == lower) {
        Some(index) => (0, index as u32),
        None => (1, lower as u32),
    }
}

/// Alphabetical order of the Polish alphabet, ignoring case first
pub fn polish_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(letter_rank)
        .cmp(b.chars().map(letter_rank))
        .then_with(|| a.cmp(b))
}

/// Group items by category; "Inne" always sorts last
pub fn group_by_category(items: &[ShoppingListItem]) -> Vec<CategoryGroup<'_>> {
    let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
    for item in items {
        let category = category_of(item);
        match groups.iter_mut().find(|group| group.category == category) {
            Some(group) => group.items.push(item),
            None => groups.push(CategoryGroup {
                category: category.to_string(),
                items: vec![item],
            }),
        }
    }
    groups.sort_by(|a, b| {
        match (a.category == OTHER_CATEGORY, b.category == OTHER_CATEGORY) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => polish_cmp(&a.category, &b.category),
        }
    });
    groups
}

/// Whether the list has categories and every one of them is collapsed
pub fn all_collapsed(items: &[ShoppingListItem], collapsed: &BTreeSet<String>) -> bool {
    let groups = group_by_category(items);
    !groups.is_empty() && groups.iter().all(|group| collapsed.contains(&group.category))
}

/// What completing the list requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionCheck {
    /// Every item is checked; completion can be offered right away
    AllChecked,
    /// Some items are unchecked; completion needs confirmation
    Unchecked(usize),
    Empty,
}

pub fn completion_check(progress: &Progress) -> CompletionCheck {
    if progress.total == 0 {
        CompletionCheck::Empty
    } else if progress.checked == progress.total {
        CompletionCheck::AllChecked
    } else {
        CompletionCheck::Unchecked(progress.unchecked())
    }
}
