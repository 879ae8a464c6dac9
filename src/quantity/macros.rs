/// Declare a newtype quantity with arithmetic, unit-suffixed formatting, and total ordering.
///
/// The ordering is either `exact` (the inner value is `Ord` already) or `float`
/// (ordered via [`ordered_float::OrderedFloat`], so that the thresholds can be compared).
macro_rules! quantity {
    ($(#[$meta:meta])* $name:ident($inner:ty), unit = $unit:literal, order = $order:ident) => {
        $(#[$meta])*
        #[must_use]
        #[repr(transparent)]
        #[derive(
            Copy,
            Clone,
            ::derive_more::Add,
            ::derive_more::AddAssign,
            ::derive_more::Sub,
            ::derive_more::SubAssign,
            ::derive_more::Neg,
            ::derive_more::Sum,
            ::derive_more::FromStr,
        )]
        pub struct $name(pub $inner);

        impl $name {
            pub const UNIT: &'static str = $unit;
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                // Delegate first, so that the precision and width flags apply to the value:
                ::std::fmt::Display::fmt(&self.0, f)?;
                write!(f, " {}", Self::UNIT)
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{:?}{}", self.0, Self::UNIT)
            }
        }

        impl ::std::cmp::PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.cmp(other).is_eq()
            }
        }

        impl ::std::cmp::Eq for $name {}

        impl ::std::cmp::PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<::std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl ::std::cmp::Ord for $name {
            fn cmp(&self, other: &Self) -> ::std::cmp::Ordering {
                total_order!($order, self.0, other.0)
            }
        }
    };
}

macro_rules! total_order {
    (exact, $lhs:expr, $rhs:expr) => {
        $lhs.cmp(&$rhs)
    };
    (float, $lhs:expr, $rhs:expr) => {
        ::ordered_float::OrderedFloat($lhs).cmp(&::ordered_float::OrderedFloat($rhs))
    };
}
