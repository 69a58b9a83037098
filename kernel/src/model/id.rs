use serde::{Deserialize, Serialize};
use shared::error::AppError;
use std::str::FromStr;

// ID はすべてデータベース側で採番される連番を newtype で包んで区別する
macro_rules! define_id {
    ($id_type: ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $id_type(i64);

        impl $id_type {
            pub fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub fn raw(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $id_type {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $id_type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $id_type {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self).map_err(|_| {
                    AppError::ConversionEntityError(format!(
                        "{} is not a valid {}",
                        s,
                        stringify!($id_type)
                    ))
                })
            }
        }
    };
}

define_id!(UserId);
define_id!(ItemId);
define_id!(BookingId);
define_id!(CommentId);
define_id!(RequestId);
