//! `ToPon` conversions for common Rust types.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::value::Pon;

/// Types that can render themselves as a Pon value.
pub trait ToPon {
    fn to_pon(&self) -> Pon;
}

impl ToPon for Pon {
    fn to_pon(&self) -> Pon {
        self.clone()
    }
}

impl ToPon for () {
    fn to_pon(&self) -> Pon {
        Pon::Nil
    }
}

impl ToPon for bool {
    fn to_pon(&self) -> Pon {
        Pon::Bool(*self)
    }
}

macro_rules! number_to_pon {
    ($($ty:ty),*) => {
        $(
            impl ToPon for $ty {
                #[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
                fn to_pon(&self) -> Pon {
                    Pon::Number(*self as f64)
                }
            }
        )*
    };
}

number_to_pon!(f32, f64, i32, i64, u8, u32, u64, usize);

impl ToPon for str {
    fn to_pon(&self) -> Pon {
        Pon::String(self.to_owned())
    }
}

impl ToPon for String {
    fn to_pon(&self) -> Pon {
        Pon::String(self.clone())
    }
}

impl<T: ToPon + ?Sized> ToPon for &T {
    fn to_pon(&self) -> Pon {
        (**self).to_pon()
    }
}

/// `None` renders as `Nil`, which drops the key when it sits in a map.
impl<T: ToPon> ToPon for Option<T> {
    fn to_pon(&self) -> Pon {
        self.as_ref().map_or(Pon::Nil, ToPon::to_pon)
    }
}

impl<T: ToPon> ToPon for [T] {
    fn to_pon(&self) -> Pon {
        Pon::Array(self.iter().map(ToPon::to_pon).collect())
    }
}

impl<T: ToPon> ToPon for Vec<T> {
    fn to_pon(&self) -> Pon {
        self.as_slice().to_pon()
    }
}

impl<T: ToPon> ToPon for IndexMap<String, T> {
    fn to_pon(&self) -> Pon {
        Pon::Map(self.iter().map(|(k, v)| (k.clone(), v.to_pon())).collect())
    }
}

impl<T: ToPon> ToPon for BTreeMap<String, T> {
    fn to_pon(&self) -> Pon {
        Pon::Map(self.iter().map(|(k, v)| (k.clone(), v.to_pon())).collect())
    }
}
