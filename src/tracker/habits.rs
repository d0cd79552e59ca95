//! The closed set of habits the tracker logs.
//!
//! Every habit is a row in [`Habit::ALL`]; the built-in command handlers and
//! the report are both driven from this table.

/// A daily habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Habit {
    Breakfast,
    MidMorning,
    Lunch,
    Snack,
    Dinner,
    Water,
}

impl Habit {
    /// All habits, in report order.
    pub const ALL: [Habit; 6] = [
        Habit::Breakfast,
        Habit::MidMorning,
        Habit::Lunch,
        Habit::Snack,
        Habit::Dinner,
        Habit::Water,
    ];

    /// Command token users type to log this habit.
    pub fn token(self) -> &'static str {
        match self {
            Habit::Breakfast => "/desayuno",
            Habit::MidMorning => "/media_maniana",
            Habit::Lunch => "/almuerzo",
            Habit::Snack => "/merienda",
            Habit::Dinner => "/cena",
            Habit::Water => "/agua",
        }
    }

    /// Storage partition key (the token without its slash).
    pub fn name(self) -> &'static str {
        &self.token()[1..]
    }

    /// Section label in the daily report.
    pub fn label(self) -> &'static str {
        match self {
            Habit::Breakfast => "Desayuno",
            Habit::MidMorning => "Media mañana",
            Habit::Lunch => "Almuerzo",
            Habit::Snack => "Merienda",
            Habit::Dinner => "Cena",
            Habit::Water => "Agua",
        }
    }

    /// Whether the command may be sent without an item.
    ///
    /// A bare `/agua` logs one glass; food habits need something to log.
    pub fn allows_empty(self) -> bool {
        matches!(self, Habit::Water)
    }

    /// Food habits are listed by item in the report; water is counted.
    pub fn is_counted(self) -> bool {
        matches!(self, Habit::Water)
    }

    /// Look a habit up by its storage name.
    #[allow(dead_code)]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.name() == name)
    }
}

impl std::fmt::Display for Habit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
