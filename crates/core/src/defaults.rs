//! Default goal template seeded for a user who has no goals yet.
//!
//! Each user gets their own copy of these rows; the template itself is
//! never stored.

use serde::Serialize;

use crate::types::Date;

/// One entry of the default goal template.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GoalTemplate {
    pub category: &'static str,
    pub name: &'static str,
    pub target_value: f64,
    pub current_value: f64,
    pub initial_value: Option<f64>,
    pub unit: &'static str,
    /// `(year, month, day)`; `None` for open-ended goals.
    pub deadline: Option<(i32, u32, u32)>,
}

impl GoalTemplate {
    /// The deadline as a calendar date, if the template sets one.
    pub fn deadline_date(&self) -> Option<Date> {
        self.deadline
            .and_then(|(y, m, d)| Date::from_ymd_opt(y, m, d))
    }
}

pub const CATEGORY_FINANCE: &str = "финансы";
pub const CATEGORY_SPORT: &str = "спорт";
pub const CATEGORY_PURCHASES: &str = "покупки";
pub const CATEGORY_TRAVEL: &str = "путешествия";

/// Name of the template goal tracked downwards from `initial_value`.
pub const WEIGHT_GOAL: &str = "Вес";

/// Goals created by `GoalRepo::seed_defaults` for a new user.
pub const DEFAULT_GOALS: &[GoalTemplate] = &[
    GoalTemplate {
        category: CATEGORY_FINANCE,
        name: "Доход 1М/мес",
        target_value: 1_000_000.0,
        current_value: 0.0,
        initial_value: None,
        unit: "₽/мес",
        deadline: Some((2026, 2, 28)),
    },
    GoalTemplate {
        category: CATEGORY_FINANCE,
        name: "Доход 2М/мес",
        target_value: 2_000_000.0,
        current_value: 0.0,
        initial_value: None,
        unit: "₽/мес",
        deadline: Some((2026, 5, 31)),
    },
    GoalTemplate {
        category: CATEGORY_FINANCE,
        name: "Доход 5М/мес",
        target_value: 5_000_000.0,
        current_value: 0.0,
        initial_value: None,
        unit: "₽/мес",
        deadline: Some((2026, 11, 30)),
    },
    GoalTemplate {
        category: CATEGORY_FINANCE,
        name: "Источники дохода",
        target_value: 4.0,
        current_value: 0.0,
        initial_value: None,
        unit: "шт",
        deadline: Some((2026, 6, 30)),
    },
    GoalTemplate {
        category: CATEGORY_SPORT,
        name: WEIGHT_GOAL,
        target_value: 80.0,
        current_value: 87.0,
        initial_value: Some(105.0),
        unit: "кг",
        deadline: Some((2026, 6, 30)),
    },
    GoalTemplate {
        category: CATEGORY_SPORT,
        name: "Тренировки в неделю",
        target_value: 4.0,
        current_value: 0.0,
        initial_value: None,
        unit: "шт/нед",
        deadline: None,
    },
    GoalTemplate {
        category: CATEGORY_SPORT,
        name: "Марафоны",
        target_value: 2.0,
        current_value: 0.0,
        initial_value: None,
        unit: "шт",
        deadline: Some((2026, 9, 30)),
    },
    GoalTemplate {
        category: CATEGORY_PURCHASES,
        name: "Voyah Free (авто)",
        target_value: 1.0,
        current_value: 0.0,
        initial_value: None,
        unit: "шт",
        deadline: Some((2026, 6, 30)),
    },
    GoalTemplate {
        category: CATEGORY_PURCHASES,
        name: "Квартира в Москве",
        target_value: 25_000_000.0,
        current_value: 0.0,
        initial_value: None,
        unit: "₽",
        deadline: Some((2026, 6, 30)),
    },
    GoalTemplate {
        category: CATEGORY_TRAVEL,
        name: "Новые страны",
        target_value: 12.0,
        current_value: 0.0,
        initial_value: None,
        unit: "шт",
        deadline: Some((2026, 12, 31)),
    },
];
