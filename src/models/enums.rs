use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(CompletionState {
    Unset => "unset",
    Completed => "completed",
    NotCompleted => "not_completed",
});

str_enum!(PaymentState {
    Unpaid => "unpaid",
    Paid => "paid",
});

str_enum!(PermissionState {
    Granted => "granted",
    Denied => "denied",
    Default => "default",
});

impl CompletionState {
    /// Persisted as a nullable integer: NULL = unset, 1 = completed, 0 = not completed.
    pub fn from_column(value: Option<i64>) -> Self {
        match value {
            None => Self::Unset,
            Some(0) => Self::NotCompleted,
            Some(_) => Self::Completed,
        }
    }

    pub fn to_column(self) -> Option<i64> {
        match self {
            Self::Unset => None,
            Self::Completed => Some(1),
            Self::NotCompleted => Some(0),
        }
    }
}

impl Default for CompletionState {
    fn default() -> Self {
        Self::Unset
    }
}

impl PaymentState {
    pub fn from_flag(paid: bool) -> Self {
        if paid {
            Self::Paid
        } else {
            Self::Unpaid
        }
    }

    pub fn is_paid(self) -> bool {
        self == Self::Paid
    }
}

impl Default for PaymentState {
    fn default() -> Self {
        Self::Unpaid
    }
}
