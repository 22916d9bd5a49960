use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of expense categories. Anything the model returns that is not
/// an exact (case-insensitive) match collapses to [`Category::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transport,
    Utilities,
    Entertainment,
    Shopping,
    Health,
    Groceries,
    RentMortgage,
    Subscriptions,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Food => write!(f, "Food"),
            Category::Transport => write!(f, "Transport"),
            Category::Utilities => write!(f, "Utilities"),
            Category::Entertainment => write!(f, "Entertainment"),
            Category::Shopping => write!(f, "Shopping"),
            Category::Health => write!(f, "Health"),
            Category::Groceries => write!(f, "Groceries"),
            Category::RentMortgage => write!(f, "Rent/Mortgage"),
            Category::Subscriptions => write!(f, "Subscriptions"),
            Category::Other => write!(f, "Other"),
        }
    }
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Food,
            Category::Transport,
            Category::Utilities,
            Category::Entertainment,
            Category::Shopping,
            Category::Health,
            Category::Groceries,
            Category::RentMortgage,
            Category::Subscriptions,
            Category::Other,
        ]
    }

    /// Maps free-form input onto the enumeration. Whitespace is trimmed and
    /// matching is case-insensitive but otherwise exact: no partial or fuzzy
    /// matching, so bucketing stays predictable.
    pub fn normalize(input: Option<&str>) -> Category {
        let Some(raw) = input else {
            return Category::Other;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Category::Other;
        }
        Self::all()
            .iter()
            .copied()
            .find(|c| c.to_string().eq_ignore_ascii_case(trimmed))
            .unwrap_or(Category::Other)
    }

    /// Comma-separated canonical vocabulary, embedded verbatim in the
    /// extraction prompts so the model is steered toward the closed set.
    pub fn prompt_list() -> String {
        Self::all()
            .iter()
            .map(Category::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
